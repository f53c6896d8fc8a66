//! C ABI interop surface for peerlink.
//!
//! Foreign callers (C, C#, Unity, ...) drive and observe engine objects
//! through opaque handles and `extern "C"` callbacks; they never own
//! native memory. Nothing unwinds across this boundary: every fallible
//! function reports failure through [`result::PlkResult`] codes or
//! null/sentinel returns.
//!
//! # Architecture
//!
//! - **result.rs**: stable ABI result codes
//! - **handles.rs**: global handle registries + embedder mint/revoke API
//! - **channel.rs**: data channel functions (user data, callbacks, send)
//! - **video.rs**: video track source functions (frame callback, user data)

#![warn(clippy::all)]

pub mod channel;
pub mod handles;
pub mod result;
pub mod video;

use std::ffi::c_void;

pub use handles::{
    register_data_channel, register_video_track_source, unregister_data_channel,
    unregister_video_track_source, PlkDataChannelHandle, PlkVideoTrackSourceHandle,
};
pub use result::PlkResult;

/// Caller-supplied context pointer captured into a dispatch closure.
///
/// The boundary contract makes the caller responsible for whatever the
/// pointer refers to staying valid (and usable from engine threads) for
/// as long as the callback is registered, which is what makes carrying it
/// across threads sound.
#[derive(Clone, Copy)]
pub(crate) struct RawContext(pub(crate) *mut c_void);

impl RawContext {
    pub(crate) fn get(self) -> *mut c_void {
        self.0
    }
}

unsafe impl Send for RawContext {}
unsafe impl Sync for RawContext {}

/// Initialize tracing for the host process. Idempotent; safe to call more
/// than once. Foreign hosts cannot install a Rust subscriber themselves,
/// so the boundary exposes this explicitly. Filtering follows the
/// standard `RUST_LOG` environment variable, defaulting to `info`.
#[no_mangle]
pub extern "C" fn plk_logging_init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
