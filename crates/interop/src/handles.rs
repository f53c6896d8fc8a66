//! Process-global handle registries and the embedder-side mint/revoke API.
//!
//! The session layer (out of scope here) registers boundary objects when
//! the engine creates them and revokes the handles when they go away;
//! foreign callers only ever see the minted handles. Handles are
//! generational: a revoked handle never resolves again.

use std::sync::{Arc, LazyLock};

use peerlink_core::{DataChannelProxy, Handle, Registry, VideoTrackSourceProxy};

/// Opaque data channel handle as seen by foreign callers.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlkDataChannelHandle(pub u64);

/// Opaque video track source handle as seen by foreign callers.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlkVideoTrackSourceHandle(pub u64);

static DATA_CHANNELS: LazyLock<Registry<DataChannelProxy>> = LazyLock::new(Registry::new);
static VIDEO_SOURCES: LazyLock<Registry<VideoTrackSourceProxy>> = LazyLock::new(Registry::new);

pub(crate) fn data_channels() -> &'static Registry<DataChannelProxy> {
    &DATA_CHANNELS
}

pub(crate) fn video_sources() -> &'static Registry<VideoTrackSourceProxy> {
    &VIDEO_SOURCES
}

/// Mint a handle for a data channel proxy. Called by the session layer
/// when the engine announces a new channel.
pub fn register_data_channel(proxy: Arc<DataChannelProxy>) -> PlkDataChannelHandle {
    PlkDataChannelHandle(DATA_CHANNELS.insert(proxy).into_raw())
}

/// Revoke a data channel handle, returning the proxy it pointed to. The
/// user-data slot is discarded; whatever it pointed to is the caller's to
/// free.
pub fn unregister_data_channel(handle: PlkDataChannelHandle) -> Option<Arc<DataChannelProxy>> {
    DATA_CHANNELS.remove(Handle::from_raw(handle.0))
}

/// Mint a handle for a video track source proxy.
pub fn register_video_track_source(
    proxy: Arc<VideoTrackSourceProxy>,
) -> PlkVideoTrackSourceHandle {
    PlkVideoTrackSourceHandle(VIDEO_SOURCES.insert(proxy).into_raw())
}

/// Revoke a video track source handle, returning the proxy.
pub fn unregister_video_track_source(
    handle: PlkVideoTrackSourceHandle,
) -> Option<Arc<VideoTrackSourceProxy>> {
    VIDEO_SOURCES.remove(Handle::from_raw(handle.0))
}

pub(crate) fn resolve_data_channel(handle: PlkDataChannelHandle) -> Option<Arc<DataChannelProxy>> {
    DATA_CHANNELS.resolve(Handle::from_raw(handle.0))
}

pub(crate) fn resolve_video_track_source(
    handle: PlkVideoTrackSourceHandle,
) -> Option<Arc<VideoTrackSourceProxy>> {
    VIDEO_SOURCES.resolve(Handle::from_raw(handle.0))
}
