//! Handle registry: opaque generational ids mapping to live boundary objects.
//!
//! Foreign callers never hold native references, only a `Handle` minted
//! here. Ids are allocated from a monotonically increasing counter and
//! never reused, so a handle to a removed object fails to resolve instead
//! of dangling. Each entry also carries the per-handle untyped user-data
//! slot.

use dashmap::DashMap;
use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicU64, Ordering};
use std::sync::Arc;

/// Opaque handle to a boundary object. `0` is the invalid (null) handle.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u64);

impl Handle {
    /// The null handle; never resolves.
    pub const INVALID: Handle = Handle(0);

    /// Reconstruct a handle from its raw ABI representation.
    pub const fn from_raw(raw: u64) -> Self {
        Handle(raw)
    }

    /// Raw ABI representation.
    pub const fn into_raw(self) -> u64 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

struct Entry<T> {
    object: Arc<T>,
    /// Untyped per-handle slot. Relaxed ordering only: the boundary
    /// documents set/get as caller-serialized, so no ordering is implied;
    /// the atomic exists to keep concurrent misuse data-race-free.
    user_data: AtomicPtr<c_void>,
}

/// Registry of live objects of one kind, keyed by handle.
pub struct Registry<T> {
    entries: DashMap<u64, Entry<T>>,
    next_id: AtomicU64,
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            // 0 is reserved for Handle::INVALID
            next_id: AtomicU64::new(1),
        }
    }

    /// Register an object and mint a handle for it.
    pub fn insert(&self, object: Arc<T>) -> Handle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(
            id,
            Entry {
                object,
                user_data: AtomicPtr::new(ptr::null_mut()),
            },
        );
        Handle(id)
    }

    /// Resolve a handle to its live object, or `None` if stale or invalid.
    pub fn resolve(&self, handle: Handle) -> Option<Arc<T>> {
        self.entries
            .get(&handle.0)
            .map(|entry| Arc::clone(&entry.object))
    }

    /// Revoke a handle, returning the object it pointed to. The user-data
    /// slot is discarded with the entry; freeing whatever it pointed to is
    /// the caller's responsibility.
    pub fn remove(&self, handle: Handle) -> Option<Arc<T>> {
        self.entries.remove(&handle.0).map(|(_, entry)| entry.object)
    }

    /// Store an opaque value on the handle's entry, overwriting any prior
    /// value with no cleanup. Returns false if the handle is stale.
    pub fn set_user_data(&self, handle: Handle, value: *mut c_void) -> bool {
        match self.entries.get(&handle.0) {
            Some(entry) => {
                entry.user_data.store(value, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Last value stored with [`set_user_data`](Self::set_user_data), or
    /// null when never set or the handle is stale.
    pub fn user_data(&self, handle: Handle) -> *mut c_void {
        match self.entries.get(&handle.0) {
            Some(entry) => entry.user_data.load(Ordering::Relaxed),
            None => ptr::null_mut(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}
