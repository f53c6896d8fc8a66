//! Error types for the peerlink boundary

use thiserror::Error;

use crate::engine::ChannelState;

/// Result type alias for boundary operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur at the interop boundary
#[derive(Debug, Error)]
pub enum Error {
    /// Caller-supplied argument rejected before touching engine state
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Handle does not resolve to a live object (stale or never valid)
    #[error("handle does not resolve to a live object")]
    InvalidHandle,

    /// Operation requires an open channel
    #[error("data channel is not open (state: {0:?})")]
    NotOpen(ChannelState),

    /// Send would exceed the outbound buffer capacity. The engine closes
    /// the channel on overflow, so this is channel-fatal, not transient.
    #[error("outbound buffer full: {current} of {limit} bytes used, {requested} more requested")]
    BufferFull {
        /// Occupancy at the time of the rejected send
        current: u64,
        /// Size of the rejected payload
        requested: u64,
        /// Fixed capacity of the outbound buffer
        limit: u64,
    },

    /// Malformed video frame (odd dimensions, truncated payload)
    #[error("invalid video frame: {0}")]
    InvalidFrame(String),
}
