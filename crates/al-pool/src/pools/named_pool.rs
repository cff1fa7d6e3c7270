use crate::{registry::Store, PoolConfig, PoolError, PoolGuard};

/// `NamedPool` stores values under keys chosen by the caller.
/// Putting a value under an existing key replaces the old value.
pub struct NamedPool<V> {
    store: Store<String, V>,
}

impl<V> std::fmt::Debug for NamedPool<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = format!("NamedPool<{}>", tynm::type_name::<V>());
        let len = self.store.try_len();
        let len: &dyn std::fmt::Debug = match &len {
            Some(len) => len,
            None => &"<locked>",
        };
        f.debug_struct(&name)
            .field("label", &self.store.label())
            .field("len", len)
            .finish()
    }
}

impl<V> Default for NamedPool<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> NamedPool<V> {
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    pub fn with_config(config: impl Into<PoolConfig>) -> Self {
        Self {
            store: Store::with_config(config.into()),
        }
    }

    /// Stores `value` under `key`, silently replacing any value already there
    pub fn put(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        tracing::trace!(pool = %self.store.label(), key = %key, "Put value");
        self.store.insert(key, value);
    }

    /// Removes the entry for `key`, doing nothing if there is none
    pub fn delete(&self, key: &str) {
        self.take(key);
    }

    /// Removes the entry for `key` and returns its value
    pub fn take(&self, key: &str) -> Option<V> {
        let value = self.store.remove(key);
        if value.is_some() {
            tracing::trace!(pool = %self.store.label(), key, "Deleted value");
        }
        value
    }

    /// Runs `f` on the value for `key` under the write lock, keeping any change it makes
    pub fn modify<R>(&self, key: &str, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        self.store.modify(key, f)
    }

    /// Calls `f` once for every stored value while holding the read lock.
    /// `f` must not write to this pool.
    pub fn each(&self, f: impl FnMut(&V)) {
        self.store.each(f)
    }

    pub fn lock(&self) -> PoolGuard<'_, String, V> {
        self.store.lock()
    }

    pub fn try_lock(&self) -> Result<PoolGuard<'_, String, V>, PoolError> {
        self.store.try_lock()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.contains(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        self.store.keys()
    }
}

impl<V: Clone + Default> NamedPool<V> {
    /// Returns a clone of the value for `key`, or `V::default()` if there is none
    pub fn get(&self, key: &str) -> V {
        self.try_get(key).unwrap_or_default()
    }

    pub fn get_checked(&self, key: &str) -> (V, bool) {
        match self.try_get(key) {
            Some(value) => (value, true),
            None => (V::default(), false),
        }
    }

    pub fn try_get(&self, key: &str) -> Option<V> {
        self.store.get_cloned(key)
    }

    /// Calls `f` with a copy of the value for `key` after the read lock is released.
    /// Not atomic with respect to other writers.
    pub fn apply(&self, key: &str, f: impl FnOnce(V)) {
        f(self.get(key))
    }

    /// Returns `f` applied to a copy of the value for `key` without storing the result
    pub fn transform(&self, key: &str, f: impl FnOnce(V) -> V) -> V {
        f(self.get(key))
    }
}
