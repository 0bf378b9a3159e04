//! Builder pattern for creating session coordinators

use std::sync::Arc;

use crate::{
    config::{CoordinatorConfig, PublisherProperties, SubscriberProperties},
    coordinator::SessionCoordinator,
    error::{CoordinatorError, CoordinatorResult},
    sdk::RtcSdk,
};

/// Builder for creating a [`SessionCoordinator`] with custom configuration
pub struct CoordinatorBuilder {
    config: CoordinatorConfig,
}

impl CoordinatorBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CoordinatorConfig::default(),
        }
    }

    /// Set the vendor API key (required)
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = api_key.into();
        self
    }

    /// Set the default publisher properties
    pub fn publisher_defaults(mut self, properties: PublisherProperties) -> Self {
        self.config.publisher_defaults = properties;
        self
    }

    /// Set the default subscriber properties
    pub fn subscriber_defaults(mut self, properties: SubscriberProperties) -> Self {
        self.config.subscriber_defaults = properties;
        self
    }

    /// Build the coordinator against the given SDK implementation
    pub fn build(self, sdk: Arc<dyn RtcSdk>) -> CoordinatorResult<SessionCoordinator> {
        let config = self.into_config()?;
        Ok(SessionCoordinator::new(config, sdk))
    }

    /// Get the validated configuration without building
    pub fn into_config(self) -> CoordinatorResult<CoordinatorConfig> {
        self.validate()?;
        Ok(self.config)
    }

    /// Validate the configuration
    fn validate(&self) -> CoordinatorResult<()> {
        if self.config.api_key.is_empty() {
            return Err(CoordinatorError::config("API key is required"));
        }
        Ok(())
    }
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected() {
        let result = CoordinatorBuilder::new().into_config();
        assert!(matches!(
            result,
            Err(CoordinatorError::Configuration { .. })
        ));
    }

    #[test]
    fn valid_config_builds() {
        let config = CoordinatorBuilder::new()
            .api_key("46203472")
            .publisher_defaults(PublisherProperties {
                publish_video: false,
                ..Default::default()
            })
            .into_config()
            .expect("config should validate");

        assert_eq!(config.api_key, "46203472");
        assert!(!config.publisher_defaults.publish_video);
        assert!(config.subscriber_defaults.subscribe_to_audio);
    }
}
