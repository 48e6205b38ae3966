//! Process-lifetime session identifier.
//!
//! One `SessionIdentity` is created at application start and cloned into
//! whatever needs it; clones share the same id. Get and reset hold the same
//! lock, so a reader never observes a half-replaced value.

use std::sync::{Arc, Mutex, MutexGuard};

use log::info;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct SessionIdentity {
    current: Arc<Mutex<Option<String>>>,
}

impl SessionIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session id, generated on first access.
    pub fn session_id(&self) -> String {
        let mut guard = self.lock();
        guard.get_or_insert_with(generate_session_id).clone()
    }

    /// Replaces the current id with a fresh one and returns it.
    ///
    /// Contexts that already captured the old id keep it.
    pub fn reset_session_id(&self) -> String {
        let fresh = generate_session_id();
        let previous = self.lock().replace(fresh.clone());
        info!(
            "Session id reset (had previous: {})",
            previous.is_some()
        );
        fresh
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        // The guarded value is always a complete id, so a poisoned lock is
        // still safe to read.
        match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl std::fmt::Debug for SessionIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIdentity")
            .field("initialized", &self.lock().is_some())
            .finish()
    }
}

fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}
