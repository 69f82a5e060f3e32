use playerlink_wire::WireConfig;

use crate::error::Result;

/// Controls host behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Namespace and version used on the wire.
    pub wire: WireConfig,
    /// Maximum number of `ready` announcements held while frame discovery
    /// has not completed. The oldest is dropped when full.
    pub max_early_announcements: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            wire: WireConfig::default(),
            max_early_announcements: 64,
        }
    }
}

impl HostConfig {
    /// Override the wire configuration.
    pub fn with_wire(mut self, wire: WireConfig) -> Self {
        self.wire = wire;
        self
    }

    /// Override the early announcement queue capacity.
    pub fn with_max_early_announcements(mut self, max: usize) -> Self {
        self.max_early_announcements = max;
        self
    }

    /// Check the configuration before a host is built from it.
    pub fn validate(&self) -> Result<()> {
        self.wire.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PeerError;

    #[test]
    fn default_config_is_valid() {
        let config = HostConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_early_announcements, 64);
    }

    #[test]
    fn empty_namespace_fails_validation() {
        let config = HostConfig::default().with_wire(WireConfig::default().with_namespace(""));
        assert!(matches!(config.validate(), Err(PeerError::Wire(_))));
    }
}
