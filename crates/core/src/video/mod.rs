//! Video track source boundary proxy.
//!
//! The proxy owns at most one [`FrameObserver`] registered with the native
//! source. Attach/detach is serialized by a single lifecycle mutex; the
//! observer's stored callback sits behind its own mutex that frame
//! delivery holds while invoking the callback, so detaching synchronizes
//! with any in-flight delivery: once `set_frame_callback(None)` returns,
//! no further frame callback fires for this source.

pub mod frame;

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::engine::{NativeVideoSource, SinkWants, VideoSink};
use frame::{I420Frame, VideoFrame};

/// Callback invoked once per delivered frame, with the converted planar
/// I420 buffer. The buffer is valid only for the duration of the call.
pub type FrameCallback = Box<dyn Fn(&I420Frame<'_>) + Send + Sync>;

struct ObserverInner {
    callback: Option<FrameCallback>,
    /// Conversion destination, reused across frames
    scratch: Vec<u8>,
}

/// Sink registered with the native source while a frame callback is set.
/// Converts each incoming frame to planar I420 before dispatch.
struct FrameObserver {
    inner: Mutex<ObserverInner>,
}

impl FrameObserver {
    fn new(callback: FrameCallback) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(ObserverInner {
                callback: Some(callback),
                scratch: Vec::new(),
            }),
        })
    }

    fn set_callback(&self, callback: Option<FrameCallback>) {
        self.inner.lock().callback = callback;
    }
}

impl VideoSink for FrameObserver {
    fn on_frame(&self, frame: &VideoFrame) {
        let mut inner = self.inner.lock();
        let ObserverInner { callback, scratch } = &mut *inner;
        let Some(callback) = callback.as_ref() else {
            // Detached between the engine snapshotting its sink list and
            // this delivery; drop the frame.
            return;
        };
        match frame.to_i420_into(scratch) {
            Ok(converted) => callback(&converted),
            Err(err) => {
                warn!(width = frame.width, height = frame.height, %err, "dropping undeliverable frame");
            }
        }
    }
}

/// Boundary proxy for one engine video track source.
pub struct VideoTrackSourceProxy {
    source: Arc<dyn NativeVideoSource>,
    /// `Some` while attached. Guards every state transition; never held
    /// during frame delivery (delivery takes only the observer's inner
    /// callback mutex).
    observer: Mutex<Option<Arc<FrameObserver>>>,
}

impl VideoTrackSourceProxy {
    pub fn new(source: Arc<dyn NativeVideoSource>) -> Arc<Self> {
        Arc::new(Self {
            source,
            observer: Mutex::new(None),
        })
    }

    /// Whether an observer is currently registered with the native source.
    pub fn is_attached(&self) -> bool {
        self.observer.lock().is_some()
    }

    /// Register, replace or clear the per-frame callback.
    ///
    /// First non-null callback creates the observer and registers it with
    /// the native source, requesting rotation already applied. Subsequent
    /// non-null callbacks swap the stored callback in place without
    /// touching the source. A null callback unregisters and destroys the
    /// observer; after this returns, no frame callback fires until a new
    /// one is registered. Clearing while detached is a no-op.
    pub fn set_frame_callback(&self, callback: Option<FrameCallback>) {
        let mut guard = self.observer.lock();
        match callback {
            Some(callback) => {
                if let Some(observer) = guard.as_ref() {
                    observer.set_callback(Some(callback));
                } else {
                    let observer = FrameObserver::new(callback);
                    let sink: Arc<dyn VideoSink> = observer.clone();
                    self.source.add_or_update_sink(
                        sink,
                        SinkWants {
                            rotation_applied: true,
                        },
                    );
                    *guard = Some(observer);
                    debug!("video frame observer attached");
                }
            }
            None => {
                if let Some(observer) = guard.take() {
                    let sink: Arc<dyn VideoSink> = observer.clone();
                    self.source.remove_sink(&sink);
                    // Synchronize with any delivery already in flight:
                    // clearing takes the callback mutex, which delivery
                    // holds while invoking.
                    observer.set_callback(None);
                    debug!("video frame observer detached");
                }
            }
        }
    }
}

impl Drop for VideoTrackSourceProxy {
    fn drop(&mut self) {
        // Unregister before the adapter goes away so the source cannot
        // deliver to a destroyed observer.
        if let Some(observer) = self.observer.get_mut().take() {
            let sink: Arc<dyn VideoSink> = observer.clone();
            self.source.remove_sink(&sink);
            observer.set_callback(None);
        }
    }
}
