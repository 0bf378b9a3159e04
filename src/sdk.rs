//! Vendor SDK capability seam
//!
//! The coordinator never touches a vendor global object. Everything it
//! needs from the SDK — capability check, session construction, publish and
//! subscribe, signaling, and the notification catalog — is expressed as the
//! traits in this module, so real vendor bindings and test doubles are
//! interchangeable at construction time.
//!
//! Connection negotiation, media capture, signaling transport, and
//! reconnection all live behind these traits; the coordinator only
//! sequences lifecycle calls and relays events.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::config::{PublisherProperties, SubscriberProperties};
use crate::error::SdkError;
use crate::events::{PublisherEvent, SessionEvent, Signal, StreamInfo};

/// Entry points of the vendor SDK (the former global object)
#[async_trait]
pub trait RtcSdk: Send + Sync {
    /// Whether the runtime environment meets the SDK's media/transport
    /// requirements. Pure query, no side effects.
    fn check_system_requirements(&self) -> bool;

    /// Create a session handle for the given room. Does not connect.
    fn init_session(
        &self,
        api_key: &str,
        session_id: &str,
    ) -> Result<Arc<dyn SdkSession>, SdkError>;

    /// Create the local outbound publisher, optionally bound to a render
    /// target. May fail when hardware or permissions are unavailable.
    async fn init_publisher(
        &self,
        target: Option<&str>,
        properties: &PublisherProperties,
    ) -> Result<Arc<dyn SdkPublisher>, SdkError>;
}

/// A session handle: the connected real-time room
#[async_trait]
pub trait SdkSession: Send + Sync {
    /// Connect to the room with an authorization token
    async fn connect(&self, token: &str) -> Result<(), SdkError>;

    /// Attach the publisher's media to the session
    async fn publish(&self, publisher: Arc<dyn SdkPublisher>) -> Result<(), SdkError>;

    /// Detach the publisher's media from the session
    fn unpublish(&self, publisher: &dyn SdkPublisher);

    /// Subscribe to a remote stream, optionally bound to a render target
    fn subscribe(
        &self,
        stream: &StreamInfo,
        target: Option<&str>,
        properties: &SubscriberProperties,
    ) -> Result<Arc<dyn SdkSubscriber>, SdkError>;

    /// Stop receiving a remote stream
    fn unsubscribe(&self, subscriber: &dyn SdkSubscriber);

    /// Send a signal over the session side-channel
    async fn send_signal(&self, signal: Signal) -> Result<(), SdkError>;

    /// Receiver for session-scoped notifications, in emission order
    fn events(&self) -> broadcast::Receiver<SessionEvent>;

    /// Unhook every vendor callback registered for this session
    fn remove_listeners(&self);

    /// Disconnect from the room. Fire-and-forget.
    fn disconnect(&self);
}

/// A publisher handle: the local participant's outbound media
pub trait SdkPublisher: Send + Sync {
    /// Enable or disable the outbound video track
    fn set_video_enabled(&self, enabled: bool);

    /// Receiver for publisher-scoped notifications, in emission order
    fn events(&self) -> broadcast::Receiver<PublisherEvent>;

    /// Unhook every vendor callback registered for this publisher
    fn remove_listeners(&self);

    /// Release capture devices and destroy the publisher
    fn destroy(&self);
}

/// A subscriber handle: a remote participant's inbound stream
pub trait SdkSubscriber: Send + Sync {
    /// The stream this subscriber is bound to
    fn stream(&self) -> StreamInfo;

    /// A still-frame snapshot of the current video, when one is available
    fn image_data(&self) -> Option<Vec<u8>>;

    /// Unhook every vendor callback registered for this subscriber
    fn remove_listeners(&self);
}
