/// `PoolConfig` contains the settings used to construct a pool
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct PoolConfig {
    /// Name attached to every log event the pool emits
    pub label: String,
    /// Number of entries the map is pre-sized for. Not an upper bound
    pub capacity: usize,
}

impl PoolConfig {
    pub fn new(label: impl Into<String>, capacity: usize) -> Self {
        Self {
            label: label.into(),
            capacity,
        }
    }

    fn default_label() -> String {
        String::from("pool")
    }

    fn default_capacity() -> usize {
        0
    }
}

impl Default for PoolConfig {
    /// Creates a `PoolConfig` labeled `pool` with no pre-allocated capacity
    fn default() -> Self {
        Self {
            label: PoolConfig::default_label(),
            capacity: PoolConfig::default_capacity(),
        }
    }
}

impl From<&str> for PoolConfig {
    fn from(label: &str) -> Self {
        Self::new(label, PoolConfig::default_capacity())
    }
}

impl From<usize> for PoolConfig {
    fn from(capacity: usize) -> Self {
        Self::new(PoolConfig::default_label(), capacity)
    }
}
