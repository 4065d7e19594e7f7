//! SessionRegistry: the single authorized controller and pending requests.
//!
//! # Who is allowed to drive this host? (for beginners)
//!
//! Any peer on the relay can *send* us input events, so every side-effecting
//! message is first checked against the registry.  Exactly one controller can
//! be Active at a time.  A controller becomes Active only after the external
//! [`ConnectionApprover`] accepts its `connection-request`; a later accepted
//! request supersedes the earlier controller.
//!
//! The registry itself is plain state.  The agent decides what to send and
//! which streams or recordings to stop when the controller changes.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

/// Session state as seen from the outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No controller and no request waiting for approval.
    Idle,
    /// At least one request is waiting for the approver.
    Awaiting,
    /// A controller is authorized.
    Active,
}

/// Why a sender failed authorization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("no active controller")]
    NoController,
    #[error("sender is not the active controller")]
    NotController,
}

/// Result of applying an approval decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The request was no longer pending (teardown or duplicate decision).
    NotPending,
    Rejected,
    Accepted {
        /// The previously Active controller, if a different one existed.
        superseded: Option<String>,
    },
}

/// External collaborator that decides whether a controller may connect.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionApprover: Send + Sync {
    /// Returns `true` to accept `client_id`.
    async fn approve(&self, client_id: &str) -> bool;
}

/// Tracks the single Active controller.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    controller_id: Option<String>,
    pending: HashSet<String>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        if self.controller_id.is_some() {
            SessionState::Active
        } else if !self.pending.is_empty() {
            SessionState::Awaiting
        } else {
            SessionState::Idle
        }
    }

    /// The Active controller, if any.
    pub fn controller(&self) -> Option<&str> {
        self.controller_id.as_deref()
    }

    /// Records an incoming `connection-request`.
    ///
    /// Returns `false` if the same client already has a request pending, in
    /// which case the caller must not ask the approver again.
    pub fn begin_request(&mut self, client_id: &str) -> bool {
        self.pending.insert(client_id.to_string())
    }

    pub fn is_pending(&self, client_id: &str) -> bool {
        self.pending.contains(client_id)
    }

    /// Applies the approver's decision for `client_id`.
    ///
    /// Decisions for requests that are no longer pending are ignored.
    pub fn resolve(&mut self, client_id: &str, accepted: bool) -> Resolution {
        if !self.pending.remove(client_id) {
            return Resolution::NotPending;
        }
        if !accepted {
            return Resolution::Rejected;
        }
        let superseded = self
            .controller_id
            .replace(client_id.to_string())
            .filter(|previous| previous != client_id);
        Resolution::Accepted { superseded }
    }

    /// `true` iff `sender` is the Active controller.
    pub fn authorize(&self, sender: &str) -> bool {
        self.controller_id.as_deref() == Some(sender)
    }

    /// Authorization for messages whose sender id is optional.
    ///
    /// With an id it must be the Active controller.  Without one the relay has
    /// already attributed the message to the paired controller, so it is
    /// accepted only while a controller is Active.
    pub fn check_sender(&self, sender: Option<&str>) -> Result<(), AuthorizationError> {
        match (self.controller_id.as_deref(), sender) {
            (None, _) => Err(AuthorizationError::NoController),
            (Some(_), None) => Ok(()),
            (Some(current), Some(sender)) if current == sender => Ok(()),
            (Some(_), Some(_)) => Err(AuthorizationError::NotController),
        }
    }

    /// Clears the Active controller and returns it.
    pub fn release(&mut self) -> Option<String> {
        self.controller_id.take()
    }

    /// Teardown: releases the controller and forgets pending requests.
    pub fn clear(&mut self) -> Option<String> {
        self.pending.clear();
        self.release()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
