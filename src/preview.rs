//! Display handles for previewing the current upload.
//!
//! A UI shows the uploaded image through some host resource (an object URL,
//! a texture, a temp file). The session acquires one [`PreviewHandle`] per
//! accepted asset and gives it back when the asset is replaced or the session
//! ends. Handles are not `Clone` and [`PreviewRegistry::release`] takes them
//! by value, so a handle cannot be released twice.
//!
//! The registry is shared (`Arc`) between the session and the host so the
//! host can check that nothing is leaking.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A live preview resource.
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewHandle {
    id: u64,
    url: String,
}

impl PreviewHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Opaque locator for the host, e.g. `preview://3`.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    next_id: u64,
    live: BTreeSet<u64>,
    released: u64,
}

/// Issues and tracks preview handles.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    state: Mutex<RegistryState>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn acquire(&self) -> PreviewHandle {
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.live.insert(id);
        PreviewHandle {
            id,
            url: format!("preview://{id}"),
        }
    }

    /// Give a handle back. Returns `false` if this registry never issued it.
    pub fn release(&self, handle: PreviewHandle) -> bool {
        let mut state = self.lock();
        let known = state.live.remove(&handle.id);
        if known {
            state.released += 1;
        }
        known
    }

    pub fn is_live(&self, handle: &PreviewHandle) -> bool {
        self.lock().live.contains(&handle.id)
    }

    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    pub fn released_count(&self) -> u64 {
        self.lock().released
    }
}
