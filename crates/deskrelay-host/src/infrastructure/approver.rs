//! Connection approvers bundled with the binary.
//!
//! The agent asks a [`ConnectionApprover`] whenever a controller requests a
//! session.  `PolicyApprover` implements the three `[host] approval`
//! settings: accept everything, reject everything, or ask the person at the
//! host on the terminal.

use async_trait::async_trait;
use std::io::Write;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::application::session_registry::ConnectionApprover;
use crate::infrastructure::storage::config::ApprovalPolicy;

/// Approver driven by [`ApprovalPolicy`].
pub struct PolicyApprover {
    policy: ApprovalPolicy,
    /// Serializes terminal prompts so two requests never interleave.
    prompt: Mutex<()>,
}

impl PolicyApprover {
    pub fn new(policy: ApprovalPolicy) -> Self {
        Self {
            policy,
            prompt: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> ApprovalPolicy {
        self.policy
    }

    async fn ask(&self, client_id: &str) -> bool {
        let _turn = self.prompt.lock().await;
        let question = format!("Controller {client_id} wants to control this computer. Allow? [y/N] ");
        let answer = tokio::task::spawn_blocking(move || {
            print!("{question}");
            let _ = std::io::stdout().flush();
            let mut line = String::new();
            match std::io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => None,
                Ok(_) => Some(line),
            }
        })
        .await;

        match answer {
            Ok(Some(line)) => is_affirmative(&line),
            Ok(None) => {
                warn!("no terminal input available; rejecting connection request");
                false
            }
            Err(e) => {
                warn!("approval prompt failed: {e}");
                false
            }
        }
    }
}

#[async_trait]
impl ConnectionApprover for PolicyApprover {
    async fn approve(&self, client_id: &str) -> bool {
        let accepted = match self.policy {
            ApprovalPolicy::AutoAccept => true,
            ApprovalPolicy::Reject => false,
            ApprovalPolicy::Prompt => self.ask(client_id).await,
        };
        info!(client = %client_id, accepted, policy = ?self.policy, "connection request decided");
        accepted
    }
}

/// `y` / `yes` in any case, surrounding whitespace ignored.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
