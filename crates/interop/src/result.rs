//! Result codes returned across the boundary.
//!
//! The numeric values are an ABI contract with foreign callers and must
//! never change: 0 is success, failures set the high bit, and the low
//! bits group by subsystem (generic, then data channel).

use peerlink_core::Error;

/// Boundary result code.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlkResult {
    /// Operation succeeded
    Success = 0,
    /// Unclassified internal failure
    Unknown = 0x8000_0000,
    /// Caller-supplied argument rejected before touching engine state
    InvalidArgument = 0x8000_0001,
    /// Handle does not resolve to a live object
    InvalidHandle = 0x8000_0002,
    /// Channel is not in a sendable state
    NotOpen = 0x8000_0301,
    /// Send would exceed the outbound buffer capacity; the channel is
    /// closing, treat as channel-fatal
    BufferFull = 0x8000_0302,
}

impl From<&Error> for PlkResult {
    fn from(err: &Error) -> Self {
        match err {
            Error::InvalidArgument(_) => PlkResult::InvalidArgument,
            Error::InvalidHandle => PlkResult::InvalidHandle,
            Error::NotOpen(_) => PlkResult::NotOpen,
            Error::BufferFull { .. } => PlkResult::BufferFull,
            Error::InvalidFrame(_) => PlkResult::Unknown,
        }
    }
}

impl From<peerlink_core::Result<()>> for PlkResult {
    fn from(result: peerlink_core::Result<()>) -> Self {
        match result {
            Ok(()) => PlkResult::Success,
            Err(err) => PlkResult::from(&err),
        }
    }
}
