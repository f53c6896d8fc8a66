//! End-to-end boundary tests: foreign-caller view of the C ABI, driven
//! against the simulated engine. Callbacks go through real `extern "C"`
//! trampolines that recover their context struct from the user-data
//! pointer, exactly as a foreign host would wire them.

use std::ffi::c_void;
use std::ptr;
use std::slice;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use peerlink_core::engine::sim::{SimDataChannel, SimVideoSource};
use peerlink_core::engine::{ChannelState, NativeDataChannel};
use peerlink_core::video::frame::{i420_len, PixelFormat, VideoFrame};
use peerlink_core::{DataChannelProxy, VideoTrackSourceProxy};

use peerlink_interop::channel::{
    plk_data_channel_get_user_data, plk_data_channel_register_callbacks,
    plk_data_channel_send_message, plk_data_channel_set_user_data, PlkDataChannelCallbacks,
};
use peerlink_interop::video::{
    plk_video_track_source_get_user_data, plk_video_track_source_register_frame_callback,
    plk_video_track_source_set_user_data,
};
use peerlink_interop::{
    plk_logging_init, register_data_channel, register_video_track_source,
    unregister_data_channel, unregister_video_track_source, PlkDataChannelHandle, PlkResult,
};

// --- trampolines ---------------------------------------------------------

#[derive(Default)]
struct ChannelLog {
    messages: Mutex<Vec<Vec<u8>>>,
    buffering: Mutex<Vec<(u64, u64, u64)>>,
    states: Mutex<Vec<(i32, i32)>>,
}

unsafe extern "C" fn message_trampoline(user_data: *mut c_void, data: *const u8, size: u64) {
    let log = &*(user_data as *const ChannelLog);
    let payload = slice::from_raw_parts(data, size as usize).to_vec();
    log.messages.lock().unwrap().push(payload);
}

unsafe extern "C" fn buffering_trampoline(
    user_data: *mut c_void,
    previous: u64,
    current: u64,
    limit: u64,
) {
    let log = &*(user_data as *const ChannelLog);
    log.buffering.lock().unwrap().push((previous, current, limit));
}

unsafe extern "C" fn state_trampoline(user_data: *mut c_void, state: i32, id: i32) {
    let log = &*(user_data as *const ChannelLog);
    log.states.lock().unwrap().push((state, id));
}

#[derive(Default)]
struct FrameLog {
    sizes: Mutex<Vec<u64>>,
}

unsafe extern "C" fn frame_trampoline(user_data: *mut c_void, _buffer: *const u8, size: u64) {
    let log = &*(user_data as *const FrameLog);
    log.sizes.lock().unwrap().push(size);
}

unsafe extern "C" fn counting_frame_trampoline(
    user_data: *mut c_void,
    _buffer: *const u8,
    _size: u64,
) {
    let counter = &*(user_data as *const AtomicU64);
    counter.fetch_add(1, Ordering::Relaxed);
}

// --- fixtures ------------------------------------------------------------

fn open_channel(id: i32, limit: u64) -> (Arc<SimDataChannel>, PlkDataChannelHandle) {
    plk_logging_init();
    let native = SimDataChannel::new(id, "boundary-test", limit);
    let proxy = DataChannelProxy::new(native.clone());
    native.set_events(proxy.clone());
    native.open();
    (native, register_data_channel(proxy))
}

fn all_callbacks(log: &ChannelLog) -> PlkDataChannelCallbacks {
    let context = log as *const ChannelLog as *mut c_void;
    PlkDataChannelCallbacks {
        message_callback: Some(message_trampoline),
        message_user_data: context,
        buffering_callback: Some(buffering_trampoline),
        buffering_user_data: context,
        state_callback: Some(state_trampoline),
        state_user_data: context,
    }
}

// --- user data -----------------------------------------------------------

#[test]
fn user_data_round_trip_and_sentinels() {
    let (_native, handle) = open_channel(1, 1024);

    // Never set: null sentinel.
    assert!(plk_data_channel_get_user_data(handle).is_null());

    let mut value = 0xABu8;
    let user_data = &mut value as *mut u8 as *mut c_void;
    plk_data_channel_set_user_data(handle, user_data);
    assert_eq!(plk_data_channel_get_user_data(handle), user_data);

    // Stale handle: fails cleanly with the sentinel, never a crash.
    unregister_data_channel(handle);
    assert!(plk_data_channel_get_user_data(handle).is_null());
    plk_data_channel_set_user_data(handle, user_data); // ignored
    assert!(plk_data_channel_get_user_data(handle).is_null());
}

#[test]
fn video_user_data_round_trip() {
    let source = SimVideoSource::new();
    let handle = register_video_track_source(VideoTrackSourceProxy::new(source));

    assert!(plk_video_track_source_get_user_data(handle).is_null());
    let mut value = 1u32;
    let user_data = &mut value as *mut u32 as *mut c_void;
    plk_video_track_source_set_user_data(handle, user_data);
    assert_eq!(plk_video_track_source_get_user_data(handle), user_data);

    unregister_video_track_source(handle);
    assert!(plk_video_track_source_get_user_data(handle).is_null());
}

// --- send path -----------------------------------------------------------

#[test]
fn send_rejects_bad_arguments_before_the_engine() {
    let (native, handle) = open_channel(2, 1024);

    let result = unsafe { plk_data_channel_send_message(handle, ptr::null(), 5) };
    assert_eq!(result, PlkResult::InvalidArgument);

    let payload = [1u8; 4];
    let result = unsafe { plk_data_channel_send_message(handle, payload.as_ptr(), 0) };
    assert_eq!(result, PlkResult::InvalidArgument);

    // The engine never saw either call.
    assert_eq!(native.buffered_amount(), 0);
    assert_eq!(native.state(), ChannelState::Open);

    unregister_data_channel(handle);
}

#[test]
fn send_reports_invalid_and_stale_handles() {
    let payload = [1u8; 4];
    let null_handle = PlkDataChannelHandle(0);
    let result = unsafe { plk_data_channel_send_message(null_handle, payload.as_ptr(), 4) };
    assert_eq!(result, PlkResult::InvalidHandle);

    let (_native, handle) = open_channel(3, 1024);
    unregister_data_channel(handle);
    let result = unsafe { plk_data_channel_send_message(handle, payload.as_ptr(), 4) };
    assert_eq!(result, PlkResult::InvalidHandle);
}

#[test]
fn send_requires_an_open_channel() {
    plk_logging_init();
    let native = SimDataChannel::new(4, "never-opened", 1024);
    let proxy = DataChannelProxy::new(native.clone());
    native.set_events(proxy.clone());
    let handle = register_data_channel(proxy);

    let payload = [1u8; 4];
    let result = unsafe { plk_data_channel_send_message(handle, payload.as_ptr(), 4) };
    assert_eq!(result, PlkResult::NotOpen);

    unregister_data_channel(handle);
}

// --- callback registration & dispatch ------------------------------------

#[test]
fn registered_callbacks_receive_events_until_silenced() {
    let (native, handle) = open_channel(5, 1024);
    let log = ChannelLog::default();

    let callbacks = all_callbacks(&log);
    let result = unsafe { plk_data_channel_register_callbacks(handle, &callbacks) };
    assert_eq!(result, PlkResult::Success);

    native.receive(b"hello");
    let payload = [7u8; 16];
    let result = unsafe { plk_data_channel_send_message(handle, payload.as_ptr(), 16) };
    assert_eq!(result, PlkResult::Success);
    native.close();

    assert_eq!(*log.messages.lock().unwrap(), vec![b"hello".to_vec()]);
    assert_eq!(*log.buffering.lock().unwrap(), vec![(0, 16, 1024)]);
    assert_eq!(
        *log.states.lock().unwrap(),
        vec![
            (ChannelState::Closing as i32, 5),
            (ChannelState::Closed as i32, 5)
        ]
    );

    // All-null registration silences every kind.
    let silent = PlkDataChannelCallbacks::default();
    let result = unsafe { plk_data_channel_register_callbacks(handle, &silent) };
    assert_eq!(result, PlkResult::Success);

    native.receive(b"unheard");
    native.open();
    assert_eq!(log.messages.lock().unwrap().len(), 1);
    assert_eq!(log.states.lock().unwrap().len(), 2);

    unregister_data_channel(handle);
}

#[test]
fn register_callbacks_rejects_null_struct() {
    let (_native, handle) = open_channel(6, 1024);
    let result = unsafe { plk_data_channel_register_callbacks(handle, ptr::null()) };
    assert_eq!(result, PlkResult::InvalidArgument);
    unregister_data_channel(handle);
}

#[test]
fn buffer_overflow_is_reported_and_channel_fatal() {
    // 10 sends of 1 KB against a 5 KB limit with no drain.
    let (native, handle) = open_channel(42, 5 * 1024);
    let log = ChannelLog::default();
    let callbacks = all_callbacks(&log);
    assert_eq!(
        unsafe { plk_data_channel_register_callbacks(handle, &callbacks) },
        PlkResult::Success
    );

    let payload = [0u8; 1024];
    let mut results = Vec::new();
    for _ in 0..10 {
        results.push(unsafe { plk_data_channel_send_message(handle, payload.as_ptr(), 1024) });
    }

    // Growth to the 5 KB limit, then the overflowing send fails with the
    // capacity code and the closure arrives through the state callback.
    assert!(results[..5].iter().all(|r| *r == PlkResult::Success));
    assert_eq!(results[5], PlkResult::BufferFull);
    assert!(results[6..].iter().all(|r| *r == PlkResult::NotOpen));

    let buffering = log.buffering.lock().unwrap();
    assert_eq!(buffering.len(), 5);
    for (index, (previous, current, limit)) in buffering.iter().enumerate() {
        assert_eq!(*previous, index as u64 * 1024);
        assert_eq!(*current, (index as u64 + 1) * 1024);
        assert_eq!(*limit, 5 * 1024);
        assert!(current <= limit);
    }
    assert_eq!(
        *log.states.lock().unwrap(),
        vec![(ChannelState::Closed as i32, 42)]
    );
    assert_eq!(native.state(), ChannelState::Closed);

    unregister_data_channel(handle);
}

// --- video frame observer --------------------------------------------------

fn nv12_frame(width: u32, height: u32) -> VideoFrame {
    VideoFrame::new(
        PixelFormat::Nv12,
        width,
        height,
        vec![0u8; i420_len(width, height)],
    )
}

#[test]
fn frame_callback_lifecycle_over_the_abi() {
    plk_logging_init();
    let source = SimVideoSource::new();
    let handle = register_video_track_source(VideoTrackSourceProxy::new(source.clone()));

    let log = FrameLog::default();
    let context = &log as *const FrameLog as *mut c_void;

    // First registration attaches exactly one sink, with rotation applied.
    let result = unsafe {
        plk_video_track_source_register_frame_callback(handle, Some(frame_trampoline), context)
    };
    assert_eq!(result, PlkResult::Success);
    assert_eq!(source.registration_count(), 1);
    assert!(source.last_wants().unwrap().rotation_applied);

    source.deliver_frame(&nv12_frame(16, 8));
    assert_eq!(*log.sizes.lock().unwrap(), vec![i420_len(16, 8) as u64]);

    // Re-registering a different callback swaps in place: no new sink.
    let counter = AtomicU64::new(0);
    let counter_ctx = &counter as *const AtomicU64 as *mut c_void;
    let result = unsafe {
        plk_video_track_source_register_frame_callback(
            handle,
            Some(counting_frame_trampoline),
            counter_ctx,
        )
    };
    assert_eq!(result, PlkResult::Success);
    assert_eq!(source.registration_count(), 1);

    source.deliver_frame(&nv12_frame(16, 8));
    assert_eq!(counter.load(Ordering::Relaxed), 1);
    assert_eq!(log.sizes.lock().unwrap().len(), 1);

    // Null callback detaches; no frame callback fires afterwards.
    let result = unsafe {
        plk_video_track_source_register_frame_callback(handle, None, ptr::null_mut())
    };
    assert_eq!(result, PlkResult::Success);
    assert_eq!(source.sink_count(), 0);

    source.deliver_frame(&nv12_frame(16, 8));
    assert_eq!(counter.load(Ordering::Relaxed), 1);

    // Detaching again is a no-op, not a fault.
    let result = unsafe {
        plk_video_track_source_register_frame_callback(handle, None, ptr::null_mut())
    };
    assert_eq!(result, PlkResult::Success);

    unregister_video_track_source(handle);
}

#[test]
fn frame_callback_on_stale_handle_fails_cleanly() {
    let source = SimVideoSource::new();
    let handle = register_video_track_source(VideoTrackSourceProxy::new(source));
    unregister_video_track_source(handle);

    let result = unsafe {
        plk_video_track_source_register_frame_callback(handle, None, ptr::null_mut())
    };
    assert_eq!(result, PlkResult::InvalidHandle);
}
