//! # RTC Client Core - Session Coordination Layer
//!
//! This crate is a thin coordination layer over a vendor real-time
//! communication SDK. It owns no transport, codec, or negotiation logic of
//! its own: the vendor SDK (injected behind the [`RtcSdk`] trait family)
//! does ICE, media capture, signaling transport, and reconnection, and this
//! layer sequences the lifecycle — connect, publish/subscribe, teardown —
//! and re-exposes the SDK's callbacks as filtered async streams.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rtc_client_core::{CoordinatorBuilder, RtcSdk};
//! use std::sync::Arc;
//! use tokio_stream::StreamExt;
//!
//! async fn run(sdk: Arc<dyn RtcSdk>) -> Result<(), Box<dyn std::error::Error>> {
//!     let coordinator = CoordinatorBuilder::new()
//!         .api_key("46203472")
//!         .build(sdk)?;
//!
//!     // Lifecycle: connect, publish, react to the remote side
//!     coordinator.connect("room1", "tok1").await?;
//!     coordinator.init_caller(None, None).await?;
//!     coordinator.call().await?;
//!
//!     let mut incoming = coordinator.on_incoming_call(None, None)?;
//!     if let Some(stream) = incoming.next().await {
//!         println!("remote stream {} (video: {})", stream.id, stream.has_video);
//!     }
//!
//!     coordinator.hang_up();
//!     Ok(())
//! }
//! ```
//!
//! ## Design
//!
//! - At most one session, one publisher, and one subscriber are live at a
//!   time; the coordinator is their sole owner.
//! - Every notification the SDK dispatches is available as a typed stream
//!   ([`SessionCoordinator::on_video_changed`],
//!   [`SessionCoordinator::on_signal`], ...), with filtering done here so
//!   consumers only see what they asked for.
//! - Failures raised by the SDK are surfaced unchanged as [`SdkError`];
//!   the coordinator adds no error taxonomy of its own.
//! - [`SessionCoordinator::hang_up`] is idempotent and releases listeners,
//!   media, and handles in a fixed order.

#![warn(missing_docs)]

pub mod builder;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod sdk;

#[cfg(any(test, feature = "mock-sdk"))]
pub mod mock;

// Re-export main types
pub use builder::CoordinatorBuilder;
pub use config::{CoordinatorConfig, PublisherProperties, SubscriberProperties};
pub use coordinator::SessionCoordinator;
pub use error::{CoordinatorError, CoordinatorResult, SdkError};
pub use events::{
    ConnectionEvent, DisconnectReason, EventEmitter, PropertyChange, PublisherEvent, SessionEvent,
    Signal, SignalEvent, StreamInfo, StreamPropertyEvent,
};
pub use sdk::{RtcSdk, SdkPublisher, SdkSession, SdkSubscriber};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
