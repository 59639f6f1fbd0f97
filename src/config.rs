use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Capacity of the internal re-entry channel
const DEFAULT_INTERNAL_CAPACITY: usize = 100;
/// Capacity of the inbox built by `ProcessHandle::pair`
const DEFAULT_MAILBOX_CAPACITY: usize = 100;
/// Capacity of the events channel built by `ProcessHandle::pair`
const DEFAULT_EVENT_CAPACITY: usize = 32;

/// Runtime tuning for a single actor.
///
/// Everything has a sensible default; hosts that embed the runtime can load
/// a config from a TOML file instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Buffer size of the internal re-entry channel. Off-loop producers
    /// block when it fills; the dispatch loop itself never blocks on it.
    #[serde(default = "default_internal_capacity")]
    pub internal_capacity: usize,
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// Level this crate logs at under `logging::init_logging`
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            internal_capacity: DEFAULT_INTERNAL_CAPACITY,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            log_level: default_log_level(),
        }
    }
}

impl ActorConfig {
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ActorConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

fn default_internal_capacity() -> usize {
    DEFAULT_INTERNAL_CAPACITY
}

fn default_mailbox_capacity() -> usize {
    DEFAULT_MAILBOX_CAPACITY
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ActorConfig::default();
        assert_eq!(config.internal_capacity, 100);
        assert_eq!(config.mailbox_capacity, 100);
        assert_eq!(config.event_capacity, 32);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ActorConfig = toml::from_str("internal_capacity = 8").unwrap();
        assert_eq!(config.internal_capacity, 8);
        assert_eq!(config.mailbox_capacity, 100);
        assert_eq!(config.log_level, "info");
    }
}
