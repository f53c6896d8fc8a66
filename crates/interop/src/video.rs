//! Video track source C ABI: frame callback registration and user data.

use std::ffi::c_void;
use tracing::debug;

use peerlink_core::video::frame::I420Frame;
use peerlink_core::Handle;

use crate::handles::{self, PlkVideoTrackSourceHandle};
use crate::result::PlkResult;
use crate::RawContext;

/// Fired once per decoded frame, with the frame converted to planar I420
/// (Y plane, then U, then V, 4:2:0, tightly packed). The buffer is valid
/// only for the duration of the call.
pub type PlkVideoFrameCallback =
    unsafe extern "C" fn(user_data: *mut c_void, buffer: *const u8, size: u64);

/// Register, replace or clear the per-frame callback of a video track
/// source.
///
/// A non-null `callback` attaches an observer to the source on first
/// registration (requesting frames with rotation already applied) or
/// swaps the stored callback in place when already attached. A null
/// `callback` detaches synchronously: once this returns, no further frame
/// callback fires for this source, even against concurrent delivery.
/// Clearing while detached is a no-op.
///
/// # Safety
///
/// A non-null `callback` must remain callable with `user_data` for as
/// long as it stays registered.
#[no_mangle]
pub unsafe extern "C" fn plk_video_track_source_register_frame_callback(
    handle: PlkVideoTrackSourceHandle,
    callback: Option<PlkVideoFrameCallback>,
    user_data: *mut c_void,
) -> PlkResult {
    let Some(proxy) = handles::resolve_video_track_source(handle) else {
        return PlkResult::InvalidHandle;
    };
    match callback {
        Some(callback) => {
            let context = RawContext(user_data);
            proxy.set_frame_callback(Some(Box::new(move |frame: &I420Frame<'_>| unsafe {
                callback(context.get(), frame.data().as_ptr(), frame.data().len() as u64);
            })));
        }
        None => proxy.set_frame_callback(None),
    }
    PlkResult::Success
}

/// Assign an opaque user-data value to the video track source. Same
/// contract as the data channel slot: stored verbatim, overwrite discards
/// silently, caller serializes set/get.
#[no_mangle]
pub extern "C" fn plk_video_track_source_set_user_data(
    handle: PlkVideoTrackSourceHandle,
    user_data: *mut c_void,
) {
    if !handles::video_sources().set_user_data(Handle::from_raw(handle.0), user_data) {
        debug!(handle = handle.0, "set_user_data on stale video source handle");
    }
}

/// Read back the user-data value previously assigned with
/// [`plk_video_track_source_set_user_data`], or null when unset or stale.
#[no_mangle]
pub extern "C" fn plk_video_track_source_get_user_data(
    handle: PlkVideoTrackSourceHandle,
) -> *mut c_void {
    handles::video_sources().user_data(Handle::from_raw(handle.0))
}
