//! Deterministic in-process engine used by tests and demos.
//!
//! Implements the engine traits with the same observable contract as the
//! production engine: sends are accepted into a bounded outbound buffer,
//! occupancy changes are reported to the wired events sink, and a send
//! that would overflow the buffer closes the channel abruptly instead of
//! queueing.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::{
    ChannelState, DataChannelEvents, NativeDataChannel, NativeVideoSource, SendError, SinkWants,
    VideoSink,
};
use crate::video::frame::VideoFrame;

/// Simulated data channel with a fixed outbound buffer capacity.
pub struct SimDataChannel {
    id: i32,
    label: String,
    limit: u64,
    state: Mutex<ChannelState>,
    buffered: AtomicU64,
    events: Mutex<Option<Arc<dyn DataChannelEvents>>>,
}

impl SimDataChannel {
    /// Create a channel in the `Connecting` state.
    pub fn new(id: i32, label: impl Into<String>, limit: u64) -> Arc<Self> {
        Arc::new(Self {
            id,
            label: label.into(),
            limit,
            state: Mutex::new(ChannelState::Connecting),
            buffered: AtomicU64::new(0),
            events: Mutex::new(None),
        })
    }

    /// Wire the boundary proxy that receives this channel's events.
    pub fn set_events(&self, events: Arc<dyn DataChannelEvents>) {
        *self.events.lock() = Some(events);
    }

    /// Transition to `Open`, notifying the events sink.
    pub fn open(&self) {
        self.transition(ChannelState::Open);
    }

    /// Close the channel normally (`Closing`, then `Closed`).
    pub fn close(&self) {
        self.transition(ChannelState::Closing);
        self.transition(ChannelState::Closed);
    }

    /// Simulate an application message arriving from the remote peer.
    pub fn receive(&self, data: &[u8]) {
        if let Some(events) = self.events() {
            events.on_message(data);
        }
    }

    /// Simulate the transport draining bytes out of the outbound buffer.
    pub fn drain(&self, bytes: u64) {
        let mut current = self.buffered.load(Ordering::Acquire);
        loop {
            let drained = current.saturating_sub(bytes);
            match self.buffered.compare_exchange_weak(
                current,
                drained,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.notify_buffered(drained);
                    return;
                }
                Err(observed) => current = observed,
            }
        }
    }

    fn transition(&self, state: ChannelState) {
        *self.state.lock() = state;
        debug!(id = self.id, ?state, "sim channel transition");
        if let Some(events) = self.events() {
            events.on_state_change(state);
        }
    }

    fn events(&self) -> Option<Arc<dyn DataChannelEvents>> {
        // Clone out so no lock is held while dispatching.
        self.events.lock().clone()
    }

    fn notify_buffered(&self, current: u64) {
        if let Some(events) = self.events() {
            events.on_buffered_amount_change(current);
        }
    }
}

impl NativeDataChannel for SimDataChannel {
    fn id(&self) -> i32 {
        self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn state(&self) -> ChannelState {
        *self.state.lock()
    }

    fn buffered_amount(&self) -> u64 {
        self.buffered.load(Ordering::Acquire)
    }

    fn buffered_amount_limit(&self) -> u64 {
        self.limit
    }

    fn send(&self, data: &[u8]) -> Result<(), SendError> {
        if self.state() != ChannelState::Open {
            return Err(SendError::NotOpen);
        }
        let len = data.len() as u64;
        let current = self.buffered.load(Ordering::Acquire);
        if current + len > self.limit {
            // Overflow closes the channel abruptly; the caller learns of
            // the closure through the state callback.
            self.transition(ChannelState::Closed);
            return Err(SendError::BufferFull);
        }
        let occupancy = current + len;
        self.buffered.store(occupancy, Ordering::Release);
        self.notify_buffered(occupancy);
        Ok(())
    }
}

/// Simulated video track source delivering frames to registered sinks.
pub struct SimVideoSource {
    sinks: Mutex<Vec<Arc<dyn VideoSink>>>,
    last_wants: Mutex<Option<SinkWants>>,
    registrations: AtomicUsize,
}

impl SimVideoSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sinks: Mutex::new(Vec::new()),
            last_wants: Mutex::new(None),
            registrations: AtomicUsize::new(0),
        })
    }

    /// Deliver a frame to every registered sink, as the engine would from
    /// one of its own threads.
    pub fn deliver_frame(&self, frame: &VideoFrame) {
        // Snapshot the sink list so delivery never holds the source lock.
        let sinks: Vec<Arc<dyn VideoSink>> = self.sinks.lock().clone();
        for sink in sinks {
            sink.on_frame(frame);
        }
    }

    /// Number of distinct sink registrations ever made.
    pub fn registration_count(&self) -> usize {
        self.registrations.load(Ordering::Relaxed)
    }

    /// Number of sinks currently registered.
    pub fn sink_count(&self) -> usize {
        self.sinks.lock().len()
    }

    /// Settings passed with the most recent registration.
    pub fn last_wants(&self) -> Option<SinkWants> {
        *self.last_wants.lock()
    }
}

impl NativeVideoSource for SimVideoSource {
    fn add_or_update_sink(&self, sink: Arc<dyn VideoSink>, wants: SinkWants) {
        let mut sinks = self.sinks.lock();
        if !sinks.iter().any(|existing| Arc::ptr_eq(existing, &sink)) {
            sinks.push(sink);
            self.registrations.fetch_add(1, Ordering::Relaxed);
        }
        *self.last_wants.lock() = Some(wants);
    }

    fn remove_sink(&self, sink: &Arc<dyn VideoSink>) {
        self.sinks
            .lock()
            .retain(|existing| !Arc::ptr_eq(existing, sink));
    }
}
