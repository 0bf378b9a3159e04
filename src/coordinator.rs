//! The session coordinator facade
//!
//! [`SessionCoordinator`] holds at most one active session, one outbound
//! publisher, and one inbound subscriber at a time, and translates the
//! vendor SDK's notifications into filtered async streams.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────┐
//! │       Application       │
//! └───────────┬─────────────┘
//!             │ connect / call / hang_up / on_*()
//! ┌───────────▼─────────────┐
//! │   SessionCoordinator    │ ◄── This module
//! │  session │ publisher │  │
//! │        subscriber       │
//! └───────────┬─────────────┘
//!             │ RtcSdk / SdkSession / SdkPublisher traits
//! ┌───────────▼─────────────┐
//! │     Vendor RTC SDK      │
//! └─────────────────────────┘
//! ```
//!
//! All methods are non-blocking; suspension happens only at the SDK's own
//! async boundaries (connect, publisher creation, publish, signal send).
//! Handle slots are guarded by short [`parking_lot`] critical sections that
//! are never held across an `.await`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use rtc_client_core::{CoordinatorBuilder, RtcSdk};
//! use std::sync::Arc;
//!
//! async fn video_call(sdk: Arc<dyn RtcSdk>) -> Result<(), Box<dyn std::error::Error>> {
//!     let coordinator = CoordinatorBuilder::new()
//!         .api_key("46203472")
//!         .build(sdk)?;
//!
//!     coordinator.connect("room1", "tok1").await?;
//!     coordinator.init_caller(None, None).await?;
//!     coordinator.call().await?;
//!     // ... consume coordinator.on_incoming_call(None, None)? ...
//!     coordinator.hang_up();
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use futures::Stream;
use parking_lot::RwLock;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::{debug, info, warn};

use crate::config::{CoordinatorConfig, PublisherProperties, SubscriberProperties};
use crate::error::{CoordinatorError, CoordinatorResult};
use crate::events::{
    ConnectionEvent, DisconnectReason, PropertyChange, PublisherEvent, SessionEvent, Signal,
    SignalEvent, StreamInfo, StreamPropertyEvent,
};
use crate::sdk::{RtcSdk, SdkPublisher, SdkSession, SdkSubscriber};

/// Coordinates the lifecycle of one session, one publisher, and one
/// subscriber against an injected vendor SDK
pub struct SessionCoordinator {
    config: CoordinatorConfig,
    sdk: Arc<dyn RtcSdk>,
    session: Arc<RwLock<Option<Arc<dyn SdkSession>>>>,
    publisher: Arc<RwLock<Option<Arc<dyn SdkPublisher>>>>,
    subscriber: Arc<RwLock<Option<Arc<dyn SdkSubscriber>>>>,
    // Derived from the latest stream-created / video-property-changed event
    video_active: Arc<RwLock<bool>>,
}

impl SessionCoordinator {
    /// Create a coordinator from a validated configuration and an SDK
    /// implementation
    pub fn new(config: CoordinatorConfig, sdk: Arc<dyn RtcSdk>) -> Self {
        Self {
            config,
            sdk,
            session: Arc::new(RwLock::new(None)),
            publisher: Arc::new(RwLock::new(None)),
            subscriber: Arc::new(RwLock::new(None)),
            video_active: Arc::new(RwLock::new(false)),
        }
    }

    /// Whether the runtime environment meets the SDK's requirements
    pub fn is_supported(&self) -> bool {
        self.sdk.check_system_requirements()
    }

    /// Establish a session for the given room with an authorization token
    ///
    /// The session handle is retained by the coordinator; connection errors
    /// from the SDK propagate unchanged.
    pub async fn connect(&self, session_id: &str, token: &str) -> CoordinatorResult<()> {
        let session = self.sdk.init_session(&self.config.api_key, session_id)?;
        *self.session.write() = Some(session.clone());
        session.connect(token).await?;
        info!("connected to session {}", session_id);
        Ok(())
    }

    /// Create the local outbound publisher and retain it
    ///
    /// `target` names an optional render target; `properties` falls back to
    /// the configured publisher defaults. Creation fails when hardware or
    /// permissions are unavailable.
    pub async fn init_caller(
        &self,
        target: Option<&str>,
        properties: Option<PublisherProperties>,
    ) -> CoordinatorResult<()> {
        let props = properties.unwrap_or_else(|| self.config.publisher_defaults.clone());
        let publisher = self.sdk.init_publisher(target, &props).await?;
        *self.publisher.write() = Some(publisher);
        debug!("publisher initialized");
        Ok(())
    }

    /// Attach the active publisher's media to the active session
    pub async fn call(&self) -> CoordinatorResult<()> {
        let session = self.active_session()?;
        let publisher = self.active_publisher()?;
        session.publish(publisher).await?;
        info!("outbound media published");
        Ok(())
    }

    /// Enable or disable the outbound video track
    ///
    /// A no-op (with a warning) when no publisher exists.
    pub fn publish_video(&self, publish: bool) {
        match self.publisher.read().as_ref() {
            Some(publisher) => publisher.set_video_enabled(publish),
            None => warn!("publish_video({}) ignored: no active publisher", publish),
        }
    }

    /// Stream of incoming remote streams
    ///
    /// For each stream-created notification observed through the returned
    /// stream, the coordinator subscribes to the reported stream, retains
    /// the subscriber, and records whether the stream currently carries
    /// video. A failed subscription is logged and the notification is still
    /// delivered.
    pub fn on_incoming_call(
        &self,
        target: Option<String>,
        properties: Option<SubscriberProperties>,
    ) -> CoordinatorResult<impl Stream<Item = StreamInfo> + Send + 'static> {
        let session = self.active_session()?;
        let props = properties.unwrap_or_else(|| self.config.subscriber_defaults.clone());
        let subscriber_slot = Arc::clone(&self.subscriber);
        let video_active = Arc::clone(&self.video_active);
        let events = BroadcastStream::new(session.events());

        Ok(events.filter_map(move |event| match event {
            Ok(SessionEvent::StreamCreated { stream }) => {
                match session.subscribe(&stream, target.as_deref(), &props) {
                    Ok(subscriber) => {
                        *subscriber_slot.write() = Some(subscriber);
                        *video_active.write() = stream.has_video;
                        debug!("subscribed to incoming stream {}", stream.id);
                    }
                    Err(e) => warn!("failed to subscribe to stream {}: {}", stream.id, e),
                }
                Some(stream)
            }
            _ => None,
        }))
    }

    /// Stream of remote streams that stopped
    pub fn on_stream_destroyed(
        &self,
    ) -> CoordinatorResult<impl Stream<Item = StreamInfo> + Send + 'static> {
        let session = self.active_session()?;
        Ok(
            BroadcastStream::new(session.events()).filter_map(|event| match event {
                Ok(SessionEvent::StreamDestroyed { stream }) => Some(stream),
                _ => None,
            }),
        )
    }

    /// Stream of remote connection teardowns (the far side hung up)
    pub fn on_end_call(
        &self,
    ) -> CoordinatorResult<impl Stream<Item = ConnectionEvent> + Send + 'static> {
        let session = self.active_session()?;
        Ok(
            BroadcastStream::new(session.events()).filter_map(|event| match event {
                Ok(SessionEvent::ConnectionDestroyed { connection }) => Some(connection),
                _ => None,
            }),
        )
    }

    /// Stream of session disconnects caused by network loss
    ///
    /// This is the generic session-disconnected notification filtered by its
    /// network predicate; deliberate and forced disconnects are not emitted.
    pub fn on_network_failed(
        &self,
    ) -> CoordinatorResult<impl Stream<Item = DisconnectReason> + Send + 'static> {
        let session = self.active_session()?;
        Ok(
            BroadcastStream::new(session.events()).filter_map(|event| match event {
                Ok(SessionEvent::SessionDisconnected { reason })
                    if reason.is_network_disconnected() =>
                {
                    Some(reason)
                }
                _ => None,
            }),
        )
    }

    /// Stream of video flag transitions on remote streams
    ///
    /// Emits only when the video flag actually changed value; observing an
    /// emission updates the cached video-active flag used by
    /// [`subscriber_screenshot`](Self::subscriber_screenshot).
    pub fn on_video_changed(
        &self,
    ) -> CoordinatorResult<impl Stream<Item = StreamPropertyEvent> + Send + 'static> {
        let session = self.active_session()?;
        let video_active = Arc::clone(&self.video_active);
        Ok(
            BroadcastStream::new(session.events()).filter_map(move |event| match event {
                Ok(SessionEvent::StreamPropertyChanged { event })
                    if event.change.is_video_change() =>
                {
                    if let PropertyChange::Video { to, .. } = event.change {
                        *video_active.write() = to;
                    }
                    Some(event)
                }
                _ => None,
            }),
        )
    }

    /// Stream of audio flag transitions on remote streams
    ///
    /// Emits only when the audio flag actually changed value.
    pub fn on_audio_changed(
        &self,
    ) -> CoordinatorResult<impl Stream<Item = StreamPropertyEvent> + Send + 'static> {
        let session = self.active_session()?;
        Ok(
            BroadcastStream::new(session.events()).filter_map(|event| match event {
                Ok(SessionEvent::StreamPropertyChanged { event })
                    if event.change.is_audio_change() =>
                {
                    Some(event)
                }
                _ => None,
            }),
        )
    }

    /// A still-frame snapshot from the active subscriber
    ///
    /// Returns `None` unless the cached video-active flag is true and a
    /// subscriber exists. The flag is updated when stream-created and
    /// video-changed notifications are observed, in SDK emission order;
    /// last writer wins.
    pub fn subscriber_screenshot(&self) -> Option<Vec<u8>> {
        if !*self.video_active.read() {
            return None;
        }
        self.subscriber
            .read()
            .as_ref()
            .and_then(|subscriber| subscriber.image_data())
    }

    /// Send a typed signal over the session side-channel
    ///
    /// The signal type is the bare custom type, without any vendor prefix.
    pub async fn send_signal(
        &self,
        signal_type: impl Into<String>,
        data: impl Into<String>,
    ) -> CoordinatorResult<()> {
        let session = self.active_session()?;
        let signal = Signal::new(signal_type, data);
        debug!("sending signal type={}", signal.signal_type);
        session.send_signal(signal).await?;
        Ok(())
    }

    /// Stream of received signals scoped to the given type
    pub fn on_signal(
        &self,
        signal_type: impl Into<String>,
    ) -> CoordinatorResult<impl Stream<Item = SignalEvent> + Send + 'static> {
        let session = self.active_session()?;
        let signal_type = signal_type.into();
        Ok(
            BroadcastStream::new(session.events()).filter_map(move |event| match event {
                Ok(SessionEvent::SignalReceived { event })
                    if event.signal.signal_type == signal_type =>
                {
                    Some(event)
                }
                _ => None,
            }),
        )
    }

    /// Stream of reconnecting notifications
    pub fn on_reconnecting(&self) -> CoordinatorResult<impl Stream<Item = ()> + Send + 'static> {
        let session = self.active_session()?;
        Ok(
            BroadcastStream::new(session.events()).filter_map(|event| match event {
                Ok(SessionEvent::Reconnecting) => Some(()),
                _ => None,
            }),
        )
    }

    /// Stream of reconnected notifications
    pub fn on_reconnected(&self) -> CoordinatorResult<impl Stream<Item = ()> + Send + 'static> {
        let session = self.active_session()?;
        Ok(
            BroadcastStream::new(session.events()).filter_map(|event| match event {
                Ok(SessionEvent::Reconnected) => Some(()),
                _ => None,
            }),
        )
    }

    /// Stream of media permission dialog openings
    pub fn on_media_access_dialog_opened(
        &self,
    ) -> CoordinatorResult<impl Stream<Item = ()> + Send + 'static> {
        self.publisher_relay(|event| matches!(event, PublisherEvent::AccessDialogOpened))
    }

    /// Stream of media permission dialog dismissals
    pub fn on_media_access_dialog_closed(
        &self,
    ) -> CoordinatorResult<impl Stream<Item = ()> + Send + 'static> {
        self.publisher_relay(|event| matches!(event, PublisherEvent::AccessDialogClosed))
    }

    /// Stream of granted media access notifications
    pub fn on_media_access_allowed(
        &self,
    ) -> CoordinatorResult<impl Stream<Item = ()> + Send + 'static> {
        self.publisher_relay(|event| matches!(event, PublisherEvent::AccessAllowed))
    }

    /// Stream of denied media access notifications
    pub fn on_media_access_denied(
        &self,
    ) -> CoordinatorResult<impl Stream<Item = ()> + Send + 'static> {
        self.publisher_relay(|event| matches!(event, PublisherEvent::AccessDenied))
    }

    /// Stream of sampled microphone levels from the active publisher
    pub fn on_audio_level_updated(
        &self,
    ) -> CoordinatorResult<impl Stream<Item = f32> + Send + 'static> {
        let publisher = self.active_publisher()?;
        Ok(
            BroadcastStream::new(publisher.events()).filter_map(|event| match event {
                Ok(PublisherEvent::AudioLevelUpdated { level }) => Some(level),
                _ => None,
            }),
        )
    }

    /// Ordered, idempotent teardown
    ///
    /// With a session: unpublish the active publisher, unsubscribe the
    /// active subscriber, remove session listeners, disconnect, clear the
    /// session. Then destroy and clear the publisher, then release the
    /// subscriber. Every branch is guarded; calling this with nothing
    /// active is a safe no-op.
    pub fn hang_up(&self) {
        let session = self.session.read().clone();
        if let Some(session) = session {
            if let Some(publisher) = self.publisher.read().clone() {
                session.unpublish(publisher.as_ref());
            }
            if let Some(subscriber) = self.subscriber.read().clone() {
                session.unsubscribe(subscriber.as_ref());
            }
            session.remove_listeners();
            session.disconnect();
            *self.session.write() = None;
            info!("session disconnected and released");
        }

        if let Some(publisher) = self.publisher.write().take() {
            publisher.remove_listeners();
            publisher.destroy();
        }

        if let Some(subscriber) = self.subscriber.write().take() {
            subscriber.remove_listeners();
        }

        *self.video_active.write() = false;
    }

    /// Whether a session is currently retained
    pub fn is_connected(&self) -> bool {
        self.session.read().is_some()
    }

    /// Whether a publisher is currently retained
    pub fn has_publisher(&self) -> bool {
        self.publisher.read().is_some()
    }

    /// Whether a subscriber is currently retained
    pub fn has_subscriber(&self) -> bool {
        self.subscriber.read().is_some()
    }

    /// The cached video-active flag
    pub fn is_video_active(&self) -> bool {
        *self.video_active.read()
    }

    fn active_session(&self) -> CoordinatorResult<Arc<dyn SdkSession>> {
        self.session
            .read()
            .clone()
            .ok_or_else(|| CoordinatorError::not_connected("no active session"))
    }

    fn active_publisher(&self) -> CoordinatorResult<Arc<dyn SdkPublisher>> {
        self.publisher
            .read()
            .clone()
            .ok_or(CoordinatorError::NoPublisher)
    }

    fn publisher_relay(
        &self,
        matcher: fn(&PublisherEvent) -> bool,
    ) -> CoordinatorResult<impl Stream<Item = ()> + Send + 'static> {
        let publisher = self.active_publisher()?;
        Ok(
            BroadcastStream::new(publisher.events()).filter_map(move |event| match event {
                Ok(event) if matcher(&event) => Some(()),
                _ => None,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CoordinatorBuilder;
    use crate::error::SdkError;
    use crate::mock::{stream_info, MockSdk};
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_test::assert_ok;

    const WAIT: Duration = Duration::from_secs(1);
    const QUIET: Duration = Duration::from_millis(50);

    fn coordinator() -> (SessionCoordinator, Arc<MockSdk>) {
        let sdk = Arc::new(MockSdk::new());
        let coordinator = CoordinatorBuilder::new()
            .api_key("key-123")
            .build(sdk.clone())
            .expect("builder should validate");
        (coordinator, sdk)
    }

    #[tokio::test]
    async fn capability_check_is_a_pass_through() {
        let (coordinator, sdk) = coordinator();
        assert!(coordinator.is_supported());

        sdk.supported.store(false, Ordering::SeqCst);
        assert!(!coordinator.is_supported());
    }

    #[tokio::test]
    async fn connect_passes_api_key_and_token_through() {
        let (coordinator, sdk) = coordinator();
        assert_ok!(coordinator.connect("room1", "tok1").await);

        assert!(coordinator.is_connected());
        assert_eq!(
            sdk.init_session_calls.read().as_slice(),
            &[("key-123".to_string(), "room1".to_string())]
        );
        assert_eq!(sdk.session.connected_tokens.read().as_slice(), &["tok1"]);
    }

    #[tokio::test]
    async fn connect_surfaces_the_sdk_error_unchanged() {
        let (coordinator, sdk) = coordinator();
        let scripted = SdkError::new("OT_CONNECT_FAILED", 1006, "connection failed");
        *sdk.session.fail_connect.write() = Some(scripted.clone());

        let err = coordinator.connect("room1", "tok1").await.unwrap_err();
        assert!(matches!(err, CoordinatorError::Sdk(e) if e == scripted));
    }

    #[tokio::test]
    async fn call_requires_session_and_publisher() {
        let (coordinator, sdk) = coordinator();
        assert!(matches!(
            coordinator.call().await.unwrap_err(),
            CoordinatorError::NotConnected { .. }
        ));

        coordinator.connect("room1", "tok1").await.unwrap();
        assert!(matches!(
            coordinator.call().await.unwrap_err(),
            CoordinatorError::NoPublisher
        ));

        coordinator.init_caller(None, None).await.unwrap();
        coordinator.call().await.unwrap();
        assert_eq!(sdk.session.publish_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn publisher_creation_failure_leaves_no_publisher() {
        let (coordinator, sdk) = coordinator();
        let scripted = SdkError::new("OT_USER_MEDIA_ACCESS_DENIED", 1500, "camera unavailable");
        *sdk.fail_publisher.write() = Some(scripted.clone());

        let err = coordinator.init_caller(None, None).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::Sdk(e) if e == scripted));
        assert!(!coordinator.has_publisher());
    }

    #[tokio::test]
    async fn full_call_lifecycle() {
        let (coordinator, sdk) = coordinator();

        coordinator.connect("room1", "tok1").await.unwrap();
        coordinator.init_caller(None, None).await.unwrap();
        coordinator.call().await.unwrap();

        let mut incoming = coordinator.on_incoming_call(None, None).unwrap();
        sdk.session.emit(SessionEvent::StreamCreated {
            stream: stream_info(true, true),
        });

        let stream = timeout(WAIT, incoming.next())
            .await
            .expect("stream-created should arrive")
            .expect("stream should not end");
        assert!(stream.has_video);
        assert!(coordinator.has_subscriber());
        assert!(coordinator.is_video_active());
        assert!(coordinator.subscriber_screenshot().is_some());

        coordinator.hang_up();

        assert!(!coordinator.is_connected());
        assert!(!coordinator.has_publisher());
        assert!(!coordinator.has_subscriber());
        assert!(!coordinator.is_video_active());

        // Teardown runs session first, then publisher, then subscriber
        assert_eq!(
            sdk.operations.read().as_slice(),
            &[
                "session.unpublish",
                "session.unsubscribe",
                "session.remove_listeners",
                "session.disconnect",
                "publisher.remove_listeners",
                "publisher.destroy",
                "subscriber.remove_listeners",
            ]
        );

        let subscribers = sdk.session.subscribers.read().clone();
        assert_eq!(subscribers.len(), 1);
        assert_eq!(subscribers[0].stream().id, stream.id);
    }

    #[tokio::test]
    async fn hang_up_is_idempotent() {
        let (coordinator, sdk) = coordinator();

        // Nothing active at all
        coordinator.hang_up();
        coordinator.hang_up();
        assert_eq!(sdk.session.disconnects.load(Ordering::SeqCst), 0);

        // Session only, no publisher or subscriber
        coordinator.connect("room1", "tok1").await.unwrap();
        coordinator.hang_up();
        coordinator.hang_up();
        assert_eq!(sdk.session.disconnects.load(Ordering::SeqCst), 1);
        assert_eq!(sdk.session.unpublish_count.load(Ordering::SeqCst), 0);
        assert_eq!(sdk.session.unsubscribe_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn audio_only_stream_yields_no_screenshot() {
        let (coordinator, sdk) = coordinator();
        coordinator.connect("room1", "tok1").await.unwrap();

        let mut incoming = coordinator.on_incoming_call(None, None).unwrap();
        sdk.session.emit(SessionEvent::StreamCreated {
            stream: stream_info(true, false),
        });

        let stream = timeout(WAIT, incoming.next()).await.unwrap().unwrap();
        assert!(!stream.has_video);
        assert!(coordinator.has_subscriber());
        assert!(!coordinator.is_video_active());
        assert!(coordinator.subscriber_screenshot().is_none());
    }

    #[tokio::test]
    async fn failed_subscription_still_delivers_the_notification() {
        let (coordinator, sdk) = coordinator();
        coordinator.connect("room1", "tok1").await.unwrap();
        *sdk.session.fail_subscribe.write() =
            Some(SdkError::new("OT_STREAM_LIMIT", 1605, "too many streams"));

        let mut incoming = coordinator.on_incoming_call(None, None).unwrap();
        sdk.session.emit(SessionEvent::StreamCreated {
            stream: stream_info(true, true),
        });

        let stream = timeout(WAIT, incoming.next()).await.unwrap().unwrap();
        assert!(stream.has_video);
        assert!(!coordinator.has_subscriber());
    }

    #[tokio::test]
    async fn video_changed_emits_only_real_video_transitions() {
        let (coordinator, sdk) = coordinator();
        coordinator.connect("room1", "tok1").await.unwrap();

        let mut incoming = coordinator.on_incoming_call(None, None).unwrap();
        sdk.session.emit(SessionEvent::StreamCreated {
            stream: stream_info(true, true),
        });
        timeout(WAIT, incoming.next()).await.unwrap().unwrap();
        assert!(coordinator.is_video_active());

        let mut video_changes = coordinator.on_video_changed().unwrap();

        // Unrelated changes must not emit
        sdk.session.emit(SessionEvent::StreamPropertyChanged {
            event: StreamPropertyEvent {
                stream: stream_info(true, true),
                change: PropertyChange::Dimensions {
                    from: (640, 480),
                    to: (1280, 720),
                },
            },
        });
        sdk.session.emit(SessionEvent::StreamPropertyChanged {
            event: StreamPropertyEvent {
                stream: stream_info(true, true),
                change: PropertyChange::Audio {
                    from: true,
                    to: false,
                },
            },
        });
        // Redundant notification (no actual transition) must not emit either
        sdk.session.emit(SessionEvent::StreamPropertyChanged {
            event: StreamPropertyEvent {
                stream: stream_info(true, true),
                change: PropertyChange::Video {
                    from: true,
                    to: true,
                },
            },
        });
        // The real transition
        sdk.session.emit(SessionEvent::StreamPropertyChanged {
            event: StreamPropertyEvent {
                stream: stream_info(true, false),
                change: PropertyChange::Video {
                    from: true,
                    to: false,
                },
            },
        });

        let event = timeout(WAIT, video_changes.next()).await.unwrap().unwrap();
        assert_eq!(
            event.change,
            PropertyChange::Video {
                from: true,
                to: false
            }
        );
        // Observing the transition updates the cached flag
        assert!(!coordinator.is_video_active());
        assert!(coordinator.subscriber_screenshot().is_none());

        // Nothing else pending
        assert!(timeout(QUIET, video_changes.next()).await.is_err());
    }

    #[tokio::test]
    async fn audio_changed_emits_only_real_audio_transitions() {
        let (coordinator, sdk) = coordinator();
        coordinator.connect("room1", "tok1").await.unwrap();

        let mut audio_changes = coordinator.on_audio_changed().unwrap();

        sdk.session.emit(SessionEvent::StreamPropertyChanged {
            event: StreamPropertyEvent {
                stream: stream_info(true, true),
                change: PropertyChange::Dimensions {
                    from: (640, 480),
                    to: (320, 240),
                },
            },
        });
        sdk.session.emit(SessionEvent::StreamPropertyChanged {
            event: StreamPropertyEvent {
                stream: stream_info(true, true),
                change: PropertyChange::Video {
                    from: true,
                    to: false,
                },
            },
        });
        sdk.session.emit(SessionEvent::StreamPropertyChanged {
            event: StreamPropertyEvent {
                stream: stream_info(false, true),
                change: PropertyChange::Audio {
                    from: true,
                    to: false,
                },
            },
        });

        let event = timeout(WAIT, audio_changes.next()).await.unwrap().unwrap();
        assert_eq!(
            event.change,
            PropertyChange::Audio {
                from: true,
                to: false
            }
        );
        assert!(timeout(QUIET, audio_changes.next()).await.is_err());
    }

    #[tokio::test]
    async fn network_failed_filters_the_generic_disconnect() {
        let (coordinator, sdk) = coordinator();
        coordinator.connect("room1", "tok1").await.unwrap();

        let mut network_failures = coordinator.on_network_failed().unwrap();

        sdk.session.emit(SessionEvent::SessionDisconnected {
            reason: DisconnectReason::ClientDisconnected,
        });
        sdk.session.emit(SessionEvent::SessionDisconnected {
            reason: DisconnectReason::ForceDisconnected,
        });
        sdk.session.emit(SessionEvent::SessionDisconnected {
            reason: DisconnectReason::NetworkDisconnected,
        });

        let reason = timeout(WAIT, network_failures.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reason, DisconnectReason::NetworkDisconnected);
        assert!(timeout(QUIET, network_failures.next()).await.is_err());
    }

    #[tokio::test]
    async fn send_signal_without_session_is_not_connected() {
        let (coordinator, _sdk) = coordinator();
        let err = coordinator.send_signal("chat", "hello").await.unwrap_err();
        assert!(matches!(err, CoordinatorError::NotConnected { .. }));
    }

    #[tokio::test]
    async fn send_signal_surfaces_the_sdk_send_error() {
        let (coordinator, sdk) = coordinator();
        coordinator.connect("room1", "tok1").await.unwrap();

        let scripted = SdkError::new("OT_NOT_CONNECTED", 500, "signal failed");
        *sdk.session.fail_signal.write() = Some(scripted.clone());

        let err = coordinator.send_signal("chat", "hello").await.unwrap_err();
        assert!(matches!(err, CoordinatorError::Sdk(e) if e == scripted));
    }

    #[tokio::test]
    async fn signals_round_trip_and_filter_by_type() {
        let (coordinator, sdk) = coordinator();
        coordinator.connect("room1", "tok1").await.unwrap();

        let payload = serde_json::json!({ "text": "hello" }).to_string();
        coordinator.send_signal("chat", payload.clone()).await.unwrap();
        assert_eq!(
            sdk.session.sent_signals.read().as_slice(),
            &[Signal::new("chat", payload)]
        );

        let mut chat = coordinator.on_signal("chat").unwrap();
        sdk.session.emit_signal(Signal::new("presence", "away"));
        sdk.session.emit_signal(Signal::new("chat", "hi there"));

        let event = timeout(WAIT, chat.next()).await.unwrap().unwrap();
        assert_eq!(event.signal, Signal::new("chat", "hi there"));
        assert!(timeout(QUIET, chat.next()).await.is_err());
    }

    #[tokio::test]
    async fn lifecycle_relays_deliver_injected_events() {
        let (coordinator, sdk) = coordinator();
        coordinator.connect("room1", "tok1").await.unwrap();

        let mut destroyed = coordinator.on_stream_destroyed().unwrap();
        let mut ended = coordinator.on_end_call().unwrap();
        let mut reconnecting = coordinator.on_reconnecting().unwrap();
        let mut reconnected = coordinator.on_reconnected().unwrap();

        sdk.session.emit(SessionEvent::StreamDestroyed {
            stream: stream_info(true, true),
        });
        sdk.session.emit(SessionEvent::ConnectionDestroyed {
            connection: ConnectionEvent {
                connection_id: "conn-9".into(),
                reason: "clientDisconnected".into(),
            },
        });
        sdk.session.emit(SessionEvent::Reconnecting);
        sdk.session.emit(SessionEvent::Reconnected);

        assert!(timeout(WAIT, destroyed.next()).await.unwrap().is_some());
        let connection = timeout(WAIT, ended.next()).await.unwrap().unwrap();
        assert_eq!(connection.connection_id, "conn-9");
        assert!(timeout(WAIT, reconnecting.next()).await.unwrap().is_some());
        assert!(timeout(WAIT, reconnected.next()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn publisher_relays_require_a_publisher() {
        let (coordinator, _sdk) = coordinator();
        assert!(matches!(
            coordinator.on_audio_level_updated().err().unwrap(),
            CoordinatorError::NoPublisher
        ));
        assert!(matches!(
            coordinator.on_media_access_dialog_opened().err().unwrap(),
            CoordinatorError::NoPublisher
        ));
    }

    #[tokio::test]
    async fn publisher_relays_deliver_and_filter() {
        let (coordinator, sdk) = coordinator();
        coordinator.init_caller(None, None).await.unwrap();

        let mut opened = coordinator.on_media_access_dialog_opened().unwrap();
        let mut denied = coordinator.on_media_access_denied().unwrap();
        let mut levels = coordinator.on_audio_level_updated().unwrap();

        sdk.publisher.emit(PublisherEvent::AccessDialogOpened);
        sdk.publisher.emit(PublisherEvent::AccessDenied);
        sdk.publisher.emit(PublisherEvent::AudioLevelUpdated { level: 0.42 });

        assert!(timeout(WAIT, opened.next()).await.unwrap().is_some());
        assert!(timeout(WAIT, denied.next()).await.unwrap().is_some());
        let level = timeout(WAIT, levels.next()).await.unwrap().unwrap();
        assert!((level - 0.42).abs() < f32::EPSILON);

        // The opened relay saw exactly one event
        assert!(timeout(QUIET, opened.next()).await.is_err());
    }

    #[tokio::test]
    async fn publish_video_toggles_the_outbound_track() {
        let (coordinator, sdk) = coordinator();
        coordinator.init_caller(None, None).await.unwrap();

        coordinator.publish_video(false);
        coordinator.publish_video(true);
        assert_eq!(sdk.publisher.video_calls.read().as_slice(), &[false, true]);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn publish_video_without_publisher_is_a_logged_noop() {
        let (coordinator, _sdk) = coordinator();
        coordinator.publish_video(true);
        assert!(logs_contain("no active publisher"));
    }

    #[tokio::test]
    async fn event_relays_require_a_session() {
        let (coordinator, _sdk) = coordinator();
        assert!(matches!(
            coordinator.on_incoming_call(None, None).err().unwrap(),
            CoordinatorError::NotConnected { .. }
        ));
        assert!(matches!(
            coordinator.on_video_changed().err().unwrap(),
            CoordinatorError::NotConnected { .. }
        ));
        assert!(matches!(
            coordinator.on_network_failed().err().unwrap(),
            CoordinatorError::NotConnected { .. }
        ));
    }

    #[tokio::test]
    async fn subscriber_properties_are_passed_through() {
        let (coordinator, sdk) = coordinator();
        coordinator.connect("room1", "tok1").await.unwrap();

        let props = SubscriberProperties {
            subscribe_to_audio: true,
            subscribe_to_video: false,
        };
        let mut incoming = coordinator
            .on_incoming_call(Some("remote-view".into()), Some(props.clone()))
            .unwrap();
        sdk.session.emit(SessionEvent::StreamCreated {
            stream: stream_info(true, true),
        });
        timeout(WAIT, incoming.next()).await.unwrap().unwrap();

        let recorded = sdk.session.subscribe_calls.read().clone();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].0.as_deref(), Some("remote-view"));
        assert_eq!(recorded[0].1, props);
    }
}
