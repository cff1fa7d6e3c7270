mod pool_config;
mod pool_error;
mod pools;
mod registry;

pub use pool_config::PoolConfig;
pub use pool_error::PoolError;
pub use pools::handle_pool::HandlePool;
pub use pools::named_pool::NamedPool;
pub use registry::PoolGuard;
pub use registry::Registry;

/// Opaque reference to a value in a `HandlePool`
pub type Handle = u64;

/// Never issued by a `HandlePool`, returned by `HandlePool::find` when nothing matches
pub const NULL_HANDLE: Handle = 0;
