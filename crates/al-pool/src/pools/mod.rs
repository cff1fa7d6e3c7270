pub mod handle_pool;
pub mod named_pool;
