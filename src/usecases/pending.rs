//! The single pending authorization attempt.
//!
//! One slot for the whole process: starting a new attempt replaces the
//! previous one, so only the newest attempt can ever be finalized. All
//! operations are synchronous and complete inside the lock — the slot is
//! never held across a suspension point, which is what makes accept-and-clear
//! race-free against duplicate callbacks.

use crate::domain::AuthProvider;
use std::sync::{Mutex, PoisonError};

/// The (state, provider) pair of one in-progress authorization attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAttempt {
    pub state: String,
    pub provider: AuthProvider,
}

/// Mutex-guarded slot holding at most one pending attempt.
#[derive(Debug, Default)]
pub struct PendingAuth {
    slot: Mutex<Option<PendingAttempt>>,
}

impl PendingAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new attempt, returning the superseded one if any. A late
    /// callback bearing the superseded state will no longer match.
    pub fn replace(&self, state: String, provider: AuthProvider) -> Option<PendingAttempt> {
        self.lock().replace(PendingAttempt { state, provider })
    }

    /// Take the pending attempt if `state` matches it exactly. A mismatch (or
    /// an empty slot) leaves the slot untouched and returns `None`. On a
    /// match the slot is emptied in the same locked operation, so a second
    /// message for the same state can never be accepted.
    pub fn accept(&self, state: &str) -> Option<PendingAttempt> {
        let mut slot = self.lock();
        match slot.as_ref() {
            Some(attempt) if attempt.state == state => slot.take(),
            _ => None,
        }
    }

    /// Drop the pending attempt, if any.
    pub fn clear(&self) {
        self.lock().take();
    }

    pub fn current_state(&self) -> Option<String> {
        self.lock().as_ref().map(|a| a.state.clone())
    }

    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<PendingAttempt>> {
        // A poisoned lock still holds a coherent Option; keep going.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
