//! Scriptable test double for the SDK capability seam
//!
//! [`MockSdk`] implements the whole vendor surface with failure injection,
//! event injection, and call recording, so coordinator behavior can be
//! driven and asserted without vendor bindings. Used by this crate's own
//! tests and exposed to downstream integration tests behind the `mock-sdk`
//! feature.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::{PublisherProperties, SubscriberProperties};
use crate::error::SdkError;
use crate::events::{
    EventEmitter, PublisherEvent, SessionEvent, Signal, SignalEvent, StreamInfo,
};
use crate::sdk::{RtcSdk, SdkPublisher, SdkSession, SdkSubscriber};

/// Ordered record of handle operations, shared across one mock SDK's
/// session, publisher, and subscribers
///
/// Counters alone cannot show the order calls were made in; teardown tests
/// assert against this log.
pub type OperationLog = Arc<RwLock<Vec<&'static str>>>;

/// Build a stream descriptor with generated ids, for test scenarios
pub fn stream_info(has_audio: bool, has_video: bool) -> StreamInfo {
    StreamInfo {
        id: Uuid::new_v4().to_string(),
        name: None,
        connection_id: Uuid::new_v4().to_string(),
        has_audio,
        has_video,
        video_dimensions: has_video.then_some((640, 480)),
        created_at: Utc::now(),
    }
}

/// Mock vendor SDK entry points
///
/// Hands out one shared [`MockSession`] and one shared [`MockPublisher`] so
/// tests can script failures and inject events before or after the
/// coordinator acquires the handles.
pub struct MockSdk {
    /// Result of the capability check
    pub supported: AtomicBool,
    /// When set, `init_session` fails with this error
    pub fail_session_init: RwLock<Option<SdkError>>,
    /// When set, `init_publisher` fails with this error
    pub fail_publisher: RwLock<Option<SdkError>>,
    /// The session every `init_session` call returns
    pub session: Arc<MockSession>,
    /// The publisher every `init_publisher` call returns
    pub publisher: Arc<MockPublisher>,
    /// Recorded `(api_key, session_id)` pairs
    pub init_session_calls: RwLock<Vec<(String, String)>>,
    /// Recorded `(target, properties)` pairs
    pub publisher_inits: RwLock<Vec<(Option<String>, PublisherProperties)>>,
    /// Ordered log of operations across the session, publisher, and
    /// subscriber handles
    pub operations: OperationLog,
}

impl MockSdk {
    /// Create a mock SDK that reports a supported environment
    pub fn new() -> Self {
        let operations = OperationLog::default();
        Self {
            supported: AtomicBool::new(true),
            fail_session_init: RwLock::new(None),
            fail_publisher: RwLock::new(None),
            session: Arc::new(MockSession::with_operations(operations.clone())),
            publisher: Arc::new(MockPublisher::with_operations(operations.clone())),
            init_session_calls: RwLock::new(Vec::new()),
            publisher_inits: RwLock::new(Vec::new()),
            operations,
        }
    }
}

impl Default for MockSdk {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RtcSdk for MockSdk {
    fn check_system_requirements(&self) -> bool {
        self.supported.load(Ordering::SeqCst)
    }

    fn init_session(
        &self,
        api_key: &str,
        session_id: &str,
    ) -> Result<Arc<dyn SdkSession>, SdkError> {
        if let Some(error) = self.fail_session_init.read().clone() {
            return Err(error);
        }
        self.init_session_calls
            .write()
            .push((api_key.to_string(), session_id.to_string()));
        Ok(self.session.clone())
    }

    async fn init_publisher(
        &self,
        target: Option<&str>,
        properties: &PublisherProperties,
    ) -> Result<Arc<dyn SdkPublisher>, SdkError> {
        if let Some(error) = self.fail_publisher.read().clone() {
            return Err(error);
        }
        self.publisher_inits
            .write()
            .push((target.map(str::to_string), properties.clone()));
        Ok(self.publisher.clone())
    }
}

/// Mock session handle with event injection and teardown recording
pub struct MockSession {
    emitter: EventEmitter<SessionEvent>,
    /// When set, `connect` fails with this error
    pub fail_connect: RwLock<Option<SdkError>>,
    /// When set, `publish` fails with this error
    pub fail_publish: RwLock<Option<SdkError>>,
    /// When set, `subscribe` fails with this error
    pub fail_subscribe: RwLock<Option<SdkError>>,
    /// When set, `send_signal` fails with this error
    pub fail_signal: RwLock<Option<SdkError>>,
    /// Tokens `connect` was called with
    pub connected_tokens: RwLock<Vec<String>>,
    /// Number of successful `publish` calls
    pub publish_count: AtomicUsize,
    /// Number of `unpublish` calls
    pub unpublish_count: AtomicUsize,
    /// Number of `unsubscribe` calls
    pub unsubscribe_count: AtomicUsize,
    /// Number of `disconnect` calls
    pub disconnects: AtomicUsize,
    /// Signals forwarded through `send_signal`
    pub sent_signals: RwLock<Vec<Signal>>,
    /// Every subscriber created by `subscribe`
    pub subscribers: RwLock<Vec<Arc<MockSubscriber>>>,
    /// Recorded `(target, properties)` pairs from `subscribe`
    pub subscribe_calls: RwLock<Vec<(Option<String>, SubscriberProperties)>>,
    operations: OperationLog,
}

impl MockSession {
    /// Create an idle mock session with its own operation log
    pub fn new() -> Self {
        Self::with_operations(OperationLog::default())
    }

    /// Create an idle mock session recording into the given log
    pub fn with_operations(operations: OperationLog) -> Self {
        Self {
            emitter: EventEmitter::default(),
            fail_connect: RwLock::new(None),
            fail_publish: RwLock::new(None),
            fail_subscribe: RwLock::new(None),
            fail_signal: RwLock::new(None),
            connected_tokens: RwLock::new(Vec::new()),
            publish_count: AtomicUsize::new(0),
            unpublish_count: AtomicUsize::new(0),
            unsubscribe_count: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            sent_signals: RwLock::new(Vec::new()),
            subscribers: RwLock::new(Vec::new()),
            subscribe_calls: RwLock::new(Vec::new()),
            operations,
        }
    }

    /// Inject a session event, as the vendor dispatch would
    pub fn emit(&self, event: SessionEvent) {
        self.emitter.emit(event);
    }

    /// Inject an inbound signal from a generated remote connection
    pub fn emit_signal(&self, signal: Signal) {
        self.emit(SessionEvent::SignalReceived {
            event: SignalEvent {
                signal,
                from_connection_id: Some(Uuid::new_v4().to_string()),
                received_at: Utc::now(),
            },
        });
    }
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SdkSession for MockSession {
    async fn connect(&self, token: &str) -> Result<(), SdkError> {
        if let Some(error) = self.fail_connect.read().clone() {
            return Err(error);
        }
        self.connected_tokens.write().push(token.to_string());
        Ok(())
    }

    async fn publish(&self, _publisher: Arc<dyn SdkPublisher>) -> Result<(), SdkError> {
        if let Some(error) = self.fail_publish.read().clone() {
            return Err(error);
        }
        self.publish_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn unpublish(&self, _publisher: &dyn SdkPublisher) {
        self.unpublish_count.fetch_add(1, Ordering::SeqCst);
        self.operations.write().push("session.unpublish");
    }

    fn subscribe(
        &self,
        stream: &StreamInfo,
        target: Option<&str>,
        properties: &SubscriberProperties,
    ) -> Result<Arc<dyn SdkSubscriber>, SdkError> {
        if let Some(error) = self.fail_subscribe.read().clone() {
            return Err(error);
        }
        self.subscribe_calls
            .write()
            .push((target.map(str::to_string), properties.clone()));
        let subscriber = Arc::new(MockSubscriber::with_operations(
            stream.clone(),
            self.operations.clone(),
        ));
        self.subscribers.write().push(subscriber.clone());
        Ok(subscriber)
    }

    fn unsubscribe(&self, _subscriber: &dyn SdkSubscriber) {
        self.unsubscribe_count.fetch_add(1, Ordering::SeqCst);
        self.operations.write().push("session.unsubscribe");
    }

    async fn send_signal(&self, signal: Signal) -> Result<(), SdkError> {
        if let Some(error) = self.fail_signal.read().clone() {
            return Err(error);
        }
        self.sent_signals.write().push(signal);
        Ok(())
    }

    fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.emitter.subscribe()
    }

    fn remove_listeners(&self) {
        self.operations.write().push("session.remove_listeners");
    }

    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.operations.write().push("session.disconnect");
    }
}

/// Mock publisher handle
pub struct MockPublisher {
    emitter: EventEmitter<PublisherEvent>,
    /// Arguments `set_video_enabled` was called with, in order
    pub video_calls: RwLock<Vec<bool>>,
    operations: OperationLog,
}

impl MockPublisher {
    /// Create an idle mock publisher with its own operation log
    pub fn new() -> Self {
        Self::with_operations(OperationLog::default())
    }

    /// Create an idle mock publisher recording into the given log
    pub fn with_operations(operations: OperationLog) -> Self {
        Self {
            emitter: EventEmitter::default(),
            video_calls: RwLock::new(Vec::new()),
            operations,
        }
    }

    /// Inject a publisher event, as the vendor dispatch would
    pub fn emit(&self, event: PublisherEvent) {
        self.emitter.emit(event);
    }
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl SdkPublisher for MockPublisher {
    fn set_video_enabled(&self, enabled: bool) {
        self.video_calls.write().push(enabled);
    }

    fn events(&self) -> broadcast::Receiver<PublisherEvent> {
        self.emitter.subscribe()
    }

    fn remove_listeners(&self) {
        self.operations.write().push("publisher.remove_listeners");
    }

    fn destroy(&self) {
        self.operations.write().push("publisher.destroy");
    }
}

/// Mock subscriber handle
pub struct MockSubscriber {
    stream: StreamInfo,
    /// The still frame `image_data` returns
    pub frame: RwLock<Option<Vec<u8>>>,
    operations: OperationLog,
}

impl MockSubscriber {
    /// Create a subscriber bound to the given stream, with a default frame
    pub fn new(stream: StreamInfo) -> Self {
        Self::with_operations(stream, OperationLog::default())
    }

    /// Create a subscriber recording into the given log
    pub fn with_operations(stream: StreamInfo, operations: OperationLog) -> Self {
        Self {
            stream,
            frame: RwLock::new(Some(b"still-frame".to_vec())),
            operations,
        }
    }
}

impl SdkSubscriber for MockSubscriber {
    fn stream(&self) -> StreamInfo {
        self.stream.clone()
    }

    fn image_data(&self) -> Option<Vec<u8>> {
        self.frame.read().clone()
    }

    fn remove_listeners(&self) {
        self.operations.write().push("subscriber.remove_listeners");
    }
}
