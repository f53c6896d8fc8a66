//! Core boundary objects for the peerlink interop surface.
//!
//! This crate reconciles two lifetime/threading models: the engine's
//! internally synchronized, reference-counted object graph on one side,
//! and a foreign caller that holds only opaque handles and may call from
//! arbitrary threads on the other. It provides:
//!
//! - **engine**: the trait seam behind which the real engine lives, plus
//!   a deterministic simulated engine for tests and demos
//! - **registry**: generational handle registry with per-handle user data
//! - **channel**: the data channel proxy (callback set, send path,
//!   buffering monitor)
//! - **video**: the video track source proxy (observer lifecycle guard,
//!   frame conversion to planar I420)
//!
//! The C ABI over these types lives in the `peerlink-interop` crate.

#![warn(clippy::all)]

pub mod channel;
pub mod engine;
pub mod error;
pub mod registry;
pub mod video;

pub use channel::{BufferingSnapshot, CallbackSet, DataChannelProxy};
pub use engine::ChannelState;
pub use error::{Error, Result};
pub use registry::{Handle, Registry};
pub use video::VideoTrackSourceProxy;
