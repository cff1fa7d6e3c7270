use crate::{registry::Store, Handle, PoolConfig, PoolError, PoolGuard, NULL_HANDLE};
use std::sync::atomic::{AtomicU64, Ordering};

/// `HandlePool` stores values under `Handle`s it issues itself.
///
/// Handles start at 1 and only ever grow, so a handle is never reused once its
/// entry is deleted. `NULL_HANDLE` is never issued.
pub struct HandlePool<V> {
    store: Store<Handle, V>,
    // Only advanced while the write lock of `store` is held
    next_handle: AtomicU64,
}

impl<V> std::fmt::Debug for HandlePool<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = format!("HandlePool<{}>", tynm::type_name::<V>());
        let len = self.store.try_len();
        let len: &dyn std::fmt::Debug = match &len {
            Some(len) => len,
            None => &"<locked>",
        };
        f.debug_struct(&name)
            .field("label", &self.store.label())
            .field("len", len)
            .field("next_handle", &self.next_handle.load(Ordering::Relaxed))
            .finish()
    }
}

impl<V> Default for HandlePool<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HandlePool<V> {
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    pub fn with_config(config: impl Into<PoolConfig>) -> Self {
        Self {
            store: Store::with_config(config.into()),
            next_handle: AtomicU64::new(NULL_HANDLE + 1),
        }
    }

    /// Stores `value` and returns the handle it can be retrieved with.
    ///
    /// # Panics
    /// If the pool has already issued every available handle, see `try_insert`.
    pub fn insert(&self, value: V) -> Handle {
        match self.try_insert(value) {
            Ok(handle) => handle,
            Err(e) => panic!(
                "Failed to insert into pool {}: {}",
                self.store.label(),
                e
            ),
        }
    }

    /// Stores `value` under a fresh handle, or returns `PoolError::HandlesExhausted`
    pub fn try_insert(&self, value: V) -> Result<Handle, PoolError> {
        let handle = {
            let mut entries = self.store.write();
            let handle = self.next_handle.load(Ordering::Relaxed);
            let next = handle
                .checked_add(1)
                .ok_or(PoolError::HandlesExhausted)?;
            entries.insert(handle, value);
            self.next_handle.store(next, Ordering::Relaxed);
            handle
        };
        tracing::trace!(pool = %self.store.label(), handle, "Inserted value");
        Ok(handle)
    }

    /// Removes the entry for `handle`, doing nothing if there is none
    pub fn delete(&self, handle: Handle) {
        self.take(handle);
    }

    /// Removes the entry for `handle` and returns its value
    pub fn take(&self, handle: Handle) -> Option<V> {
        let value = self.store.remove(&handle);
        if value.is_some() {
            tracing::trace!(pool = %self.store.label(), handle, "Deleted value");
        }
        value
    }

    /// Runs `f` on the value for `handle` under the write lock, keeping any change it makes.
    /// Returns `None` without calling `f` if `handle` is not in the pool.
    pub fn modify<R>(&self, handle: Handle, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        self.store.modify(&handle, f)
    }

    /// Calls `f` once for every stored value, in no particular order.
    ///
    /// The read lock is held until every value has been visited, so `f` must not
    /// insert into or delete from this pool or it will deadlock.
    pub fn each(&self, f: impl FnMut(&V)) {
        self.store.each(f)
    }

    /// Exclusive access to the underlying map until the returned guard is dropped
    pub fn lock(&self) -> PoolGuard<'_, Handle, V> {
        self.store.lock()
    }

    /// As `lock`, but returns `PoolError::WouldBlock` instead of waiting
    pub fn try_lock(&self) -> Result<PoolGuard<'_, Handle, V>, PoolError> {
        self.store.try_lock()
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.store.contains(&handle)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every handle currently in the pool
    pub fn handles(&self) -> Vec<Handle> {
        self.store.keys()
    }

    /// The handle the next `insert` will return
    pub fn next_handle(&self) -> Handle {
        let _entries = self.store.read();
        self.next_handle.load(Ordering::Relaxed)
    }
}

impl<V: Clone + Default> HandlePool<V> {
    /// Returns a clone of the value for `handle`, or `V::default()` if there is none
    pub fn get(&self, handle: Handle) -> V {
        self.try_get(handle).unwrap_or_default()
    }

    /// Returns the value for `handle` along with whether it was present at all
    pub fn get_checked(&self, handle: Handle) -> (V, bool) {
        match self.try_get(handle) {
            Some(value) => (value, true),
            None => (V::default(), false),
        }
    }

    pub fn try_get(&self, handle: Handle) -> Option<V> {
        self.store.get_cloned(&handle)
    }

    /// Calls `f` with a copy of the value for `handle`.
    ///
    /// The value is read first and `f` runs after the lock is released, so another
    /// thread may change or delete the entry before `f` sees it. Use `modify` when
    /// the read and the action must be atomic.
    pub fn apply(&self, handle: Handle, f: impl FnOnce(V)) {
        f(self.get(handle))
    }

    /// Returns `f` applied to a copy of the value for `handle`.
    /// The result is not written back; `modify` does that.
    pub fn transform(&self, handle: Handle, f: impl FnOnce(V) -> V) -> V {
        f(self.get(handle))
    }
}

impl<V: PartialEq> HandlePool<V> {
    /// Looks for an entry equal to `value`, returning `(NULL_HANDLE, false)` if there is none.
    /// When several entries are equal any one of their handles may be returned.
    pub fn find(&self, value: &V) -> (Handle, bool) {
        self.store
            .read()
            .iter()
            .find(|(_, stored)| *stored == value)
            .map_or((NULL_HANDLE, false), |(handle, _)| (*handle, true))
    }
}
