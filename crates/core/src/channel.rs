//! Data channel boundary proxy.
//!
//! Wraps an engine data channel and carries the three caller-registered
//! callbacks (message, buffering, state). Registration replaces the whole
//! set as one immutable snapshot behind an `ArcSwap`; every dispatch loads
//! the snapshot exactly once, so a dispatch already in flight may complete
//! with the previous set while every dispatch started after registration
//! returns observes the new one.

use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::engine::{ChannelState, DataChannelEvents, NativeDataChannel, SendError};
use crate::{Error, Result};

/// Callback invoked once per received application message. The payload is
/// valid only for the duration of the call.
pub type MessageCallback = Box<dyn Fn(&[u8]) + Send + Sync>;

/// Callback invoked on every outbound buffer occupancy change.
pub type BufferingCallback = Box<dyn Fn(BufferingSnapshot) + Send + Sync>;

/// Callback invoked on every channel lifecycle transition, with the new
/// state and the numeric channel id.
pub type StateCallback = Box<dyn Fn(ChannelState, i32) + Send + Sync>;

/// Outbound buffer occupancy snapshot delivered to the buffering callback.
///
/// This is the only backpressure signal available to the caller: a send
/// that would push `current` past `limit` closes the channel abruptly, so
/// callers must throttle on it rather than wait for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferingSnapshot {
    /// Occupancy before the change, in bytes
    pub previous: u64,
    /// Occupancy after the change, in bytes
    pub current: u64,
    /// Fixed capacity of the outbound buffer, in bytes
    pub limit: u64,
}

/// One full set of data channel callbacks. A `None` member disables that
/// callback kind.
#[derive(Default)]
pub struct CallbackSet {
    pub message: Option<MessageCallback>,
    pub buffering: Option<BufferingCallback>,
    pub state: Option<StateCallback>,
}

impl CallbackSet {
    fn is_silent(&self) -> bool {
        self.message.is_none() && self.buffering.is_none() && self.state.is_none()
    }
}

/// Boundary proxy for one engine data channel.
///
/// The proxy itself takes no locks: the callback set is a swapped
/// snapshot and the buffering monitor state is a single atomic, so event
/// dispatch from engine threads never contends with caller threads.
pub struct DataChannelProxy {
    native: Arc<dyn NativeDataChannel>,
    callbacks: ArcSwap<CallbackSet>,
    /// Last occupancy observed by the buffering monitor
    last_buffered: AtomicU64,
}

impl DataChannelProxy {
    pub fn new(native: Arc<dyn NativeDataChannel>) -> Arc<Self> {
        let initial = native.buffered_amount();
        Arc::new(Self {
            native,
            callbacks: ArcSwap::from_pointee(CallbackSet::default()),
            last_buffered: AtomicU64::new(initial),
        })
    }

    /// Numeric id of the underlying channel
    pub fn id(&self) -> i32 {
        self.native.id()
    }

    /// Label of the underlying channel
    pub fn label(&self) -> &str {
        self.native.label()
    }

    /// The engine channel this proxy fronts
    pub fn native(&self) -> &Arc<dyn NativeDataChannel> {
        &self.native
    }

    /// Replace all three callbacks in one atomic snapshot store. Passing a
    /// set with all members `None` silences the channel: no callback of
    /// any kind fires for events dispatched after this call returns.
    pub fn register_callbacks(&self, set: CallbackSet) {
        if set.is_silent() {
            debug!(id = self.id(), label = self.label(), "data channel silenced");
        } else {
            debug!(id = self.id(), label = self.label(), "data channel callbacks registered");
        }
        self.callbacks.store(Arc::new(set));
    }

    /// Forward a payload to the engine's outbound queue.
    ///
    /// Success means the engine accepted the bytes into its buffer, not
    /// that they were delivered. A `BufferFull` failure is channel-fatal:
    /// the engine closes the channel and reports the transition through
    /// the state callback, which is the authoritative signal.
    pub fn send(&self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InvalidArgument("payload must not be empty"));
        }
        let state = self.native.state();
        if state != ChannelState::Open {
            return Err(Error::NotOpen(state));
        }
        self.native.send(data).map_err(|err| match err {
            SendError::NotOpen => Error::NotOpen(self.native.state()),
            SendError::BufferFull => {
                warn!(
                    id = self.id(),
                    requested = data.len(),
                    "send exceeded outbound buffer capacity, channel closing"
                );
                Error::BufferFull {
                    current: self.native.buffered_amount(),
                    requested: data.len() as u64,
                    limit: self.native.buffered_amount_limit(),
                }
            }
        })
    }
}

impl DataChannelEvents for DataChannelProxy {
    fn on_message(&self, data: &[u8]) {
        let set = self.callbacks.load();
        if let Some(callback) = &set.message {
            callback(data);
        }
    }

    fn on_buffered_amount_change(&self, current: u64) {
        let previous = self.last_buffered.swap(current, Ordering::AcqRel);
        if previous == current {
            return;
        }
        let set = self.callbacks.load();
        if let Some(callback) = &set.buffering {
            callback(BufferingSnapshot {
                previous,
                current,
                limit: self.native.buffered_amount_limit(),
            });
        }
    }

    fn on_state_change(&self, state: ChannelState) {
        debug!(id = self.id(), ?state, "data channel state change");
        let set = self.callbacks.load();
        if let Some(callback) = &set.state {
            callback(state, self.native.id());
        }
    }
}
