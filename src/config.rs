//! Configuration types for the session coordinator

use serde::{Deserialize, Serialize};

/// Configuration for a [`SessionCoordinator`](crate::SessionCoordinator)
///
/// The API key is the only required value; it is handed through to the
/// vendor SDK whenever a session is created. Publisher and subscriber
/// property defaults apply when the corresponding operation is called
/// without explicit properties.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfig {
    /// Vendor API key, passed through on session creation
    pub api_key: String,
    /// Defaults for outbound media created by `init_caller`
    pub publisher_defaults: PublisherProperties,
    /// Defaults for inbound media created when subscribing to new streams
    pub subscriber_defaults: SubscriberProperties,
}

impl CoordinatorConfig {
    /// Create a configuration with the given API key and default properties
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Set the publisher property defaults
    pub fn with_publisher_defaults(mut self, properties: PublisherProperties) -> Self {
        self.publisher_defaults = properties;
        self
    }

    /// Set the subscriber property defaults
    pub fn with_subscriber_defaults(mut self, properties: SubscriberProperties) -> Self {
        self.subscriber_defaults = properties;
        self
    }
}

/// Capability options for the local outbound publisher
///
/// Mirrors the vendor SDK's publisher property bag; unknown vendor options
/// stay inside the SDK adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherProperties {
    /// Display name attached to the published stream
    pub name: Option<String>,
    /// Whether to capture and send audio
    pub publish_audio: bool,
    /// Whether to capture and send video
    pub publish_video: bool,
    /// Whether the local preview is mirrored
    pub mirror: bool,
}

impl Default for PublisherProperties {
    fn default() -> Self {
        Self {
            name: None,
            publish_audio: true,
            publish_video: true,
            mirror: true,
        }
    }
}

/// Capability options for inbound subscriptions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberProperties {
    /// Whether to receive the remote audio track
    pub subscribe_to_audio: bool,
    /// Whether to receive the remote video track
    pub subscribe_to_video: bool,
}

impl Default for SubscriberProperties {
    fn default() -> Self {
        Self {
            subscribe_to_audio: true,
            subscribe_to_video: true,
        }
    }
}
