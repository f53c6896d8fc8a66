//! Data channel C ABI: user-data slot, callback registration, send path.

use std::ffi::c_void;
use std::ptr;
use std::slice;
use tracing::debug;

use peerlink_core::channel::{BufferingSnapshot, CallbackSet};
use peerlink_core::Handle;

use crate::handles::{self, PlkDataChannelHandle};
use crate::result::PlkResult;
use crate::RawContext;

/// Fired once per received application message. `data` is valid only for
/// the duration of the call.
pub type PlkDataChannelMessageCallback =
    unsafe extern "C" fn(user_data: *mut c_void, data: *const u8, size: u64);

/// Fired on every outbound buffer occupancy change. `previous` and
/// `current` are the old and new occupancy in bytes, `limit` the fixed
/// capacity. When the buffer is full, any further send closes the channel
/// abruptly, so monitoring this signal is critical.
pub type PlkDataChannelBufferingCallback =
    unsafe extern "C" fn(user_data: *mut c_void, previous: u64, current: u64, limit: u64);

/// Fired on every channel lifecycle transition, with the state code and
/// the numeric channel id.
pub type PlkDataChannelStateCallback =
    unsafe extern "C" fn(user_data: *mut c_void, state: i32, id: i32);

/// One registration's worth of data channel callbacks. A null function
/// pointer disables that callback kind; all-null silences the channel.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct PlkDataChannelCallbacks {
    pub message_callback: Option<PlkDataChannelMessageCallback>,
    pub message_user_data: *mut c_void,
    pub buffering_callback: Option<PlkDataChannelBufferingCallback>,
    pub buffering_user_data: *mut c_void,
    pub state_callback: Option<PlkDataChannelStateCallback>,
    pub state_user_data: *mut c_void,
}

impl Default for PlkDataChannelCallbacks {
    fn default() -> Self {
        Self {
            message_callback: None,
            message_user_data: ptr::null_mut(),
            buffering_callback: None,
            buffering_user_data: ptr::null_mut(),
            state_callback: None,
            state_user_data: ptr::null_mut(),
        }
    }
}

fn callback_set_from_raw(raw: &PlkDataChannelCallbacks) -> CallbackSet {
    let mut set = CallbackSet::default();
    if let Some(callback) = raw.message_callback {
        let context = RawContext(raw.message_user_data);
        set.message = Some(Box::new(move |data: &[u8]| unsafe {
            callback(context.get(), data.as_ptr(), data.len() as u64);
        }));
    }
    if let Some(callback) = raw.buffering_callback {
        let context = RawContext(raw.buffering_user_data);
        set.buffering = Some(Box::new(move |snapshot: BufferingSnapshot| unsafe {
            callback(
                context.get(),
                snapshot.previous,
                snapshot.current,
                snapshot.limit,
            );
        }));
    }
    if let Some(callback) = raw.state_callback {
        let context = RawContext(raw.state_user_data);
        set.state = Some(Box::new(move |state, id| unsafe {
            callback(context.get(), state as i32, id);
        }));
    }
    set
}

/// Assign an opaque user-data value to the data channel. The value is
/// stored verbatim and can be read back with
/// [`plk_data_channel_get_user_data`] at any point during the channel's
/// lifetime; an overwritten value is silently discarded. Set/get carry no
/// synchronization contract and must be serialized by the caller.
#[no_mangle]
pub extern "C" fn plk_data_channel_set_user_data(
    handle: PlkDataChannelHandle,
    user_data: *mut c_void,
) {
    if !handles::data_channels().set_user_data(Handle::from_raw(handle.0), user_data) {
        debug!(handle = handle.0, "set_user_data on stale data channel handle");
    }
}

/// Read back the user-data value previously assigned with
/// [`plk_data_channel_set_user_data`]. Returns null when no value was
/// ever assigned or the handle is stale.
#[no_mangle]
pub extern "C" fn plk_data_channel_get_user_data(handle: PlkDataChannelHandle) -> *mut c_void {
    handles::data_channels().user_data(Handle::from_raw(handle.0))
}

/// Replace the channel's message/buffering/state callbacks in one call.
///
/// After this returns, any dispatch started afterwards uses the new set;
/// a dispatch already in flight on an engine thread may still complete
/// with the previous set.
///
/// # Safety
///
/// `callbacks` must point to a valid [`PlkDataChannelCallbacks`]; each
/// non-null function pointer must remain callable with its paired
/// user-data for as long as it stays registered.
#[no_mangle]
pub unsafe extern "C" fn plk_data_channel_register_callbacks(
    handle: PlkDataChannelHandle,
    callbacks: *const PlkDataChannelCallbacks,
) -> PlkResult {
    if callbacks.is_null() {
        return PlkResult::InvalidArgument;
    }
    let Some(proxy) = handles::resolve_data_channel(handle) else {
        return PlkResult::InvalidHandle;
    };
    let raw = unsafe { *callbacks };
    proxy.register_callbacks(callback_set_from_raw(&raw));
    PlkResult::Success
}

/// Queue `size` bytes starting at `data` on the channel's outbound
/// buffer. Success means the engine accepted the bytes, not that they
/// were delivered. A `BufferFull` result is channel-fatal: the engine
/// closes the channel and the state callback reports the transition.
///
/// # Safety
///
/// When `size` is non-zero, `data` must point to `size` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn plk_data_channel_send_message(
    handle: PlkDataChannelHandle,
    data: *const u8,
    size: u64,
) -> PlkResult {
    // Argument errors are rejected before any engine state is touched.
    if size == 0 || data.is_null() {
        return PlkResult::InvalidArgument;
    }
    let Some(proxy) = handles::resolve_data_channel(handle) else {
        return PlkResult::InvalidHandle;
    };
    let payload = unsafe { slice::from_raw_parts(data, size as usize) };
    proxy.send(payload).into()
}
