use crate::{PoolConfig, PoolError};
use std::{
    borrow::Borrow,
    collections::HashMap,
    hash::Hash,
    ops::{Deref, DerefMut},
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError},
};

/// The map every pool keeps its entries in.
pub type Registry<K, V> = HashMap<K, V>;

/// A `Registry` behind a single `RwLock`, shared by `HandlePool` and `NamedPool`.
///
/// Every method takes the lock for exactly its own duration. A poisoned lock is
/// recovered from and the map is used as the panicking thread left it. A panic
/// inside `modify` or while a `PoolGuard` is held can leave a value half updated,
/// and that value is what later readers see.
pub(crate) struct Store<K, V> {
    entries: RwLock<Registry<K, V>>,
    label: String,
}

impl<K: Eq + Hash, V> Store<K, V> {
    pub(crate) fn with_config(config: PoolConfig) -> Self {
        tracing::debug!(
            pool = %config.label,
            capacity = config.capacity,
            "Creating pool"
        );
        Self {
            entries: RwLock::new(HashMap::with_capacity(config.capacity)),
            label: config.label,
        }
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    /// Shared access, waiting for any writer to finish
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Registry<K, V>> {
        self.entries.read().unwrap_or_else(|e| self.recover(e))
    }

    /// Exclusive access, waiting for every reader and writer to finish
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Registry<K, V>> {
        self.entries.write().unwrap_or_else(|e| self.recover(e))
    }

    fn recover<G>(&self, err: PoisonError<G>) -> G {
        tracing::warn!(pool = %self.label, "Recovering pool from a poisoned lock");
        let guard = err.into_inner();
        self.entries.clear_poison();
        guard
    }

    pub(crate) fn insert(&self, key: K, value: V) -> Option<V> {
        self.write().insert(key, value)
    }

    pub(crate) fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.write().remove(key)
    }

    pub(crate) fn get_cloned<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.read().get(key).cloned()
    }

    pub(crate) fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.read().contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.read().len()
    }

    /// Entry count without waiting, `None` while a writer holds the lock
    pub(crate) fn try_len(&self) -> Option<usize> {
        match self.entries.try_read() {
            Ok(entries) => Some(entries.len()),
            Err(TryLockError::Poisoned(e)) => Some(e.into_inner().len()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Runs `f` against the stored value while the write lock is held, keeping its changes.
    /// If `f` panics, whatever it already wrote stays in the map.
    pub(crate) fn modify<Q, R>(&self, key: &Q, f: impl FnOnce(&mut V) -> R) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.write().get_mut(key).map(f)
    }

    /// Calls `f` for every value while the read lock is held for the whole iteration
    pub(crate) fn each(&self, f: impl FnMut(&V)) {
        self.read().values().for_each(f);
    }

    pub(crate) fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.read().keys().cloned().collect()
    }

    pub(crate) fn lock(&self) -> PoolGuard<'_, K, V> {
        PoolGuard {
            entries: self.write(),
        }
    }

    pub(crate) fn try_lock(&self) -> Result<PoolGuard<'_, K, V>, PoolError> {
        Ok(PoolGuard {
            entries: self.entries.try_write()?,
        })
    }
}

/// Exclusive access to a pool's raw `Registry`, released when dropped.
///
/// While a `PoolGuard` is alive every other operation on the same pool blocks,
/// so calling the pool again from the thread holding the guard deadlocks.
/// Formatting the pool with `{:?}` does not block and reports the length as `<locked>`.
/// Changes made through the guard stay in place even if the holder panics.
/// Entries written through the guard bypass the pool's own bookkeeping: keys
/// inserted into a `HandlePool` this way may later be overwritten by a handle
/// the pool issues.
pub struct PoolGuard<'a, K, V> {
    entries: RwLockWriteGuard<'a, Registry<K, V>>,
}

impl<K, V> Deref for PoolGuard<'_, K, V> {
    type Target = Registry<K, V>;

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

impl<K, V> DerefMut for PoolGuard<'_, K, V> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.entries
    }
}

impl<K: std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for PoolGuard<'_, K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolGuard")
            .field("entries", &*self.entries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Store;
    use crate::{PoolConfig, PoolError};
    use std::sync::Arc;

    fn store() -> Store<u8, String> {
        Store::with_config(PoolConfig::from("registry-test"))
    }

    #[test]
    fn insert_remove() {
        let store = store();
        assert_eq!(store.insert(1, "a".to_string()), None);
        assert_eq!(store.insert(1, "b".to_string()), Some("a".to_string()));
        assert_eq!(store.get_cloned(&1), Some("b".to_string()));
        assert!(store.contains(&1));
        assert_eq!(store.remove(&1), Some("b".to_string()));
        assert_eq!(store.remove(&1), None);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn modify_keeps_changes() {
        let store = store();
        store.insert(7, "seven".to_string());
        assert_eq!(
            store.modify(&7, |value| {
                value.push('!');
                value.len()
            }),
            Some(6)
        );
        assert_eq!(store.get_cloned(&7), Some("seven!".to_string()));
        assert_eq!(store.modify(&8, |value| value.clear()), None);
    }

    #[test]
    fn guard_blocks_try_lock() {
        let store = store();
        {
            let mut guard = store.lock();
            guard.insert(3, "three".to_string());
            assert!(matches!(store.try_lock(), Err(PoolError::WouldBlock)));
        }
        assert_eq!(store.try_lock().unwrap().get(&3), Some(&"three".to_string()));
    }

    #[test]
    fn guard_debug() {
        let store = store();
        store.insert(1, "one".to_string());
        assert_eq!(
            format!("{:?}", store.lock()),
            "PoolGuard { entries: {1: \"one\"} }"
        );
    }

    #[test]
    fn recovers_from_poison() {
        let store = Arc::new(store());
        store.insert(1, "kept".to_string());
        let poisoner = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let mut guard = poisoner.lock();
            guard.insert(2, "written before the panic".to_string());
            panic!("poison the pool");
        })
        .join();

        assert!(matches!(store.try_lock(), Err(PoolError::LockPoisoned(_))));
        assert_eq!(store.len(), 2);
        // Recovery clears the poison flag
        assert!(store.try_lock().is_ok());
    }

    #[test]
    fn try_len_does_not_block() {
        let store = store();
        store.insert(1, "one".to_string());
        assert_eq!(store.try_len(), Some(1));
        let _guard = store.lock();
        assert_eq!(store.try_len(), None);
    }
}
