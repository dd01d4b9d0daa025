//! Broadcaster configuration

/// Broadcaster configuration options
#[derive(Debug, Clone)]
pub struct BroadcasterConfig {
    /// Name attached to log events
    pub name: String,

    /// Capacity reserved for the connection set on first registration
    pub initial_capacity: usize,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            name: "broadcaster".to_string(),
            initial_capacity: 0,
        }
    }
}

impl BroadcasterConfig {
    /// Create a new config with a custom name
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the name used in log events
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the initial connection set capacity
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BroadcasterConfig::default();

        assert_eq!(config.name, "broadcaster");
        assert_eq!(config.initial_capacity, 0);
    }

    #[test]
    fn test_with_name() {
        let config = BroadcasterConfig::with_name("video");

        assert_eq!(config.name, "video");
        assert_eq!(config.initial_capacity, 0);
    }

    #[test]
    fn test_builder_chaining() {
        let config = BroadcasterConfig::default()
            .name("audio")
            .initial_capacity(16);

        assert_eq!(config.name, "audio");
        assert_eq!(config.initial_capacity, 16);
    }
}
