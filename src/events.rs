//! Event catalog for the session coordinator
//!
//! The vendor SDK reports everything through named notifications; this
//! module is the typed catalog of those notifications plus the broadcast
//! fan-out used to deliver them. Session-scoped events arrive as
//! [`SessionEvent`], publisher-scoped events as [`PublisherEvent`], and the
//! coordinator exposes filtered views of both (see
//! [`SessionCoordinator`](crate::SessionCoordinator)).
//!
//! SDK adapters bridge vendor callbacks into an [`EventEmitter`] and hand
//! out receivers from their `events()` trait methods. Broadcast receivers
//! observe events in emission order, which is what the coordinator's
//! derived video-active flag relies on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Descriptor for a media stream announced by the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Vendor-assigned stream identifier
    pub id: String,
    /// Display name attached by the publishing participant
    pub name: Option<String>,
    /// Identifier of the connection that published the stream
    pub connection_id: String,
    /// Whether the stream currently carries audio
    pub has_audio: bool,
    /// Whether the stream currently carries video
    pub has_video: bool,
    /// Video resolution in pixels, when video is present
    pub video_dimensions: Option<(u32, u32)>,
    /// When the stream was created on the vendor side
    pub created_at: DateTime<Utc>,
}

/// A single property transition on a remote stream
///
/// Carries the previous value so consumers (and the coordinator's filters)
/// can distinguish real transitions from redundant notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyChange {
    /// The video flag changed
    Video {
        /// Value before the change
        from: bool,
        /// Value after the change
        to: bool,
    },
    /// The audio flag changed
    Audio {
        /// Value before the change
        from: bool,
        /// Value after the change
        to: bool,
    },
    /// The video resolution changed
    Dimensions {
        /// Resolution before the change
        from: (u32, u32),
        /// Resolution after the change
        to: (u32, u32),
    },
}

impl PropertyChange {
    /// Whether this is a video flag transition to a different value
    pub fn is_video_change(&self) -> bool {
        matches!(self, Self::Video { from, to } if from != to)
    }

    /// Whether this is an audio flag transition to a different value
    pub fn is_audio_change(&self) -> bool {
        matches!(self, Self::Audio { from, to } if from != to)
    }
}

/// A stream property change notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamPropertyEvent {
    /// The stream whose property changed
    pub stream: StreamInfo,
    /// The transition that occurred
    pub change: PropertyChange,
}

/// Why a session was disconnected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisconnectReason {
    /// The local participant disconnected deliberately
    ClientDisconnected,
    /// A moderator forced the disconnect
    ForceDisconnected,
    /// Network loss terminated the session
    NetworkDisconnected,
}

impl DisconnectReason {
    /// Whether the disconnect was caused by network loss
    pub fn is_network_disconnected(&self) -> bool {
        matches!(self, Self::NetworkDisconnected)
    }
}

/// A remote connection teardown notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEvent {
    /// Identifier of the connection that was destroyed
    pub connection_id: String,
    /// Vendor-reported reason string
    pub reason: String,
}

/// Typed message exchanged over the session side-channel
///
/// Signals are ephemeral per call and distinct from media streams. The type
/// is the bare custom type without any vendor prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    /// Application-defined signal type (e.g. "chat")
    pub signal_type: String,
    /// Opaque payload
    pub data: String,
}

impl Signal {
    /// Create a new signal
    pub fn new(signal_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            signal_type: signal_type.into(),
            data: data.into(),
        }
    }
}

/// A received signal with its origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    /// The signal that was received
    pub signal: Signal,
    /// Connection that sent the signal, when the vendor reports it
    pub from_connection_id: Option<String>,
    /// When the signal was received locally
    pub received_at: DateTime<Utc>,
}

/// Events emitted by a connected session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A remote participant started publishing a stream
    StreamCreated {
        /// The new stream
        stream: StreamInfo,
    },
    /// A remote stream stopped
    StreamDestroyed {
        /// The stream that went away
        stream: StreamInfo,
    },
    /// A remote connection left the session
    ConnectionDestroyed {
        /// Teardown details
        connection: ConnectionEvent,
    },
    /// The local session was disconnected
    SessionDisconnected {
        /// Why the disconnect happened
        reason: DisconnectReason,
    },
    /// A property changed on a remote stream
    StreamPropertyChanged {
        /// Transition details
        event: StreamPropertyEvent,
    },
    /// The SDK is attempting to reconnect the session
    Reconnecting,
    /// The session was reconnected
    Reconnected,
    /// A side-channel signal arrived
    SignalReceived {
        /// The received signal
        event: SignalEvent,
    },
}

/// Events emitted by the local publisher
#[derive(Debug, Clone)]
pub enum PublisherEvent {
    /// The media permission dialog was shown to the user
    AccessDialogOpened,
    /// The media permission dialog was dismissed
    AccessDialogClosed,
    /// The user granted media access
    AccessAllowed,
    /// The user denied media access
    AccessDenied,
    /// Sampled microphone level
    AudioLevelUpdated {
        /// Normalized level (0.0 to 1.0)
        level: f32,
    },
}

/// Broadcast fan-out for SDK events
///
/// SDK adapters own one emitter per session or publisher handle, feed vendor
/// callbacks into [`emit`](Self::emit), and return receivers from their
/// `events()` methods. Emitting with no receivers is not an error.
#[derive(Debug, Clone)]
pub struct EventEmitter<T> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> EventEmitter<T> {
    /// Create a new emitter with the specified buffer capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all current receivers
    pub fn emit(&self, event: T) {
        // Ignore send errors (no receivers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events from this emitter
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }

    /// Subscribe as a stream
    pub fn stream(&self) -> BroadcastStream<T> {
        BroadcastStream::new(self.sender.subscribe())
    }

    /// Number of active receivers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone + Send + 'static> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redundant_flag_notifications_are_not_changes() {
        assert!(PropertyChange::Video { from: true, to: false }.is_video_change());
        assert!(!PropertyChange::Video { from: true, to: true }.is_video_change());
        assert!(PropertyChange::Audio { from: false, to: true }.is_audio_change());
        assert!(!PropertyChange::Audio { from: false, to: false }.is_audio_change());

        let resize = PropertyChange::Dimensions {
            from: (640, 480),
            to: (1280, 720),
        };
        assert!(!resize.is_video_change());
        assert!(!resize.is_audio_change());
    }

    #[test]
    fn network_disconnect_predicate() {
        assert!(DisconnectReason::NetworkDisconnected.is_network_disconnected());
        assert!(!DisconnectReason::ClientDisconnected.is_network_disconnected());
        assert!(!DisconnectReason::ForceDisconnected.is_network_disconnected());
    }

    #[tokio::test]
    async fn emitter_fans_out_to_all_receivers() {
        let emitter: EventEmitter<SessionEvent> = EventEmitter::new(8);
        let mut rx1 = emitter.subscribe();
        let mut rx2 = emitter.subscribe();

        emitter.emit(SessionEvent::Reconnecting);

        assert!(matches!(rx1.recv().await, Ok(SessionEvent::Reconnecting)));
        assert!(matches!(rx2.recv().await, Ok(SessionEvent::Reconnecting)));
    }

    #[tokio::test]
    async fn stream_subscription_yields_emitted_events() {
        use tokio_stream::StreamExt;

        let emitter: EventEmitter<PublisherEvent> = EventEmitter::new(8);
        let mut events = emitter.stream();

        emitter.emit(PublisherEvent::AccessAllowed);

        assert!(matches!(
            events.next().await,
            Some(Ok(PublisherEvent::AccessAllowed))
        ));
    }

    #[test]
    fn emitting_without_receivers_is_not_an_error() {
        let emitter: EventEmitter<PublisherEvent> = EventEmitter::default();
        emitter.emit(PublisherEvent::AccessAllowed);
        assert_eq!(emitter.receiver_count(), 0);
    }
}
