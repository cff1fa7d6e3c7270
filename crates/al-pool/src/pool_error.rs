use std::sync::{PoisonError, TryLockError};

/// Error type for the fallible `try_*` operations of the pools
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// A thread panicked while holding the pool's exclusive lock
    LockPoisoned(String),
    /// The lock is currently held and the caller asked not to wait for it
    WouldBlock,
    /// Every `Handle` up to `u64::MAX` has already been issued
    HandlesExhausted,
}

impl std::fmt::Display for PoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolError::LockPoisoned(e) => write!(f, "Pool lock poisoned: {e}"),
            PoolError::WouldBlock => f.write_str("Pool lock is held elsewhere"),
            PoolError::HandlesExhausted => f.write_str("Pool has no handles left to issue"),
        }
    }
}

impl std::error::Error for PoolError {}

impl<T> From<PoisonError<T>> for PoolError {
    fn from(err: PoisonError<T>) -> Self {
        PoolError::LockPoisoned(err.to_string())
    }
}

impl<T> From<TryLockError<T>> for PoolError {
    fn from(err: TryLockError<T>) -> Self {
        match err {
            TryLockError::Poisoned(e) => e.into(),
            TryLockError::WouldBlock => PoolError::WouldBlock,
        }
    }
}
