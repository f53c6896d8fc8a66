//! Trait seam for the native media engine.
//!
//! The engine itself (session establishment, SCTP transport, capture,
//! codecs) lives behind these traits. Engine objects are internally
//! synchronized and deliver events from threads they own; the boundary
//! never assumes a particular runtime on either side.

pub mod sim;

use std::sync::Arc;
use thiserror::Error;

use crate::video::frame::VideoFrame;

/// Lifecycle state of a data channel. Discriminant values are part of the
/// ABI contract (reported verbatim through the state callback).
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Channel is being negotiated
    Connecting = 0,
    /// Channel is open and ready for messages
    Open = 1,
    /// Channel is closing
    Closing = 2,
    /// Channel is closed
    Closed = 3,
}

/// Failure reported by the engine when queueing outbound bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// Channel is not in a sendable state
    #[error("channel is not in a sendable state")]
    NotOpen,

    /// Send would exceed the outbound buffer capacity. The engine reacts
    /// by closing the channel abruptly rather than queueing further.
    #[error("send would exceed the outbound buffer capacity")]
    BufferFull,
}

/// Engine-side data channel. Internally synchronized; all methods may be
/// called from any thread.
pub trait NativeDataChannel: Send + Sync {
    /// Numeric channel identifier (negotiated SCTP stream id)
    fn id(&self) -> i32;

    /// Channel label
    fn label(&self) -> &str;

    /// Current lifecycle state
    fn state(&self) -> ChannelState;

    /// Current occupancy of the outbound buffer, in bytes
    fn buffered_amount(&self) -> u64;

    /// Fixed capacity of the outbound buffer, in bytes
    fn buffered_amount_limit(&self) -> u64;

    /// Queue bytes into the outbound buffer. Success means the bytes were
    /// accepted for sending, not that they were delivered.
    fn send(&self, data: &[u8]) -> Result<(), SendError>;
}

/// Events a data channel delivers to its boundary proxy. Invoked on
/// engine-owned threads, in engine order per event kind.
pub trait DataChannelEvents: Send + Sync {
    /// An application message arrived. `data` is valid only for the call.
    fn on_message(&self, data: &[u8]);

    /// The outbound buffer occupancy changed.
    fn on_buffered_amount_change(&self, current: u64);

    /// The channel transitioned to a new lifecycle state.
    fn on_state_change(&self, state: ChannelState);
}

/// Sink settings passed when registering a video sink with a source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinkWants {
    /// Request frames with rotation already applied, so the consumer never
    /// has to rotate pixels itself.
    pub rotation_applied: bool,
}

/// Receiver of decoded video frames, registered with a native source.
/// `on_frame` is invoked on engine-owned threads.
pub trait VideoSink: Send + Sync {
    fn on_frame(&self, frame: &VideoFrame);
}

/// Engine-side video track source. Sinks are identified by pointer
/// identity, mirroring how the engine tracks registered sinks.
pub trait NativeVideoSource: Send + Sync {
    /// Register a sink, or update its settings if already registered.
    fn add_or_update_sink(&self, sink: Arc<dyn VideoSink>, wants: SinkWants);

    /// Unregister a sink. Unknown sinks are ignored.
    fn remove_sink(&self, sink: &Arc<dyn VideoSink>);
}
