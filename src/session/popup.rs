//! One-shot relay between the OAuth callback page and the waiting initiator
//!
//! The initiator opens a handshake, then waits on it without blocking. The
//! callback delivers exactly one outcome. Opening a new handshake tears down
//! the previous one, and a waiter left on the old handshake resolves with an error.

use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;

/// Result of one authorization handshake, as relayed to the initiator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuthOutcome {
    Success,
    Error { error: String },
}

impl AuthOutcome {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

struct Handshake {
    sender: Option<oneshot::Sender<AuthOutcome>>,
    receiver: Option<oneshot::Receiver<AuthOutcome>>,
}

impl Handshake {
    fn is_spent(&self) -> bool {
        self.sender.is_none() && self.receiver.is_none()
    }
}

#[derive(Default)]
pub struct PopupChannel {
    current: Mutex<Option<Handshake>>,
}

impl PopupChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Handshake>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a fresh handshake
    ///
    /// Returns `true` if an unfinished handshake was superseded.
    pub fn open(&self) -> bool {
        let (sender, receiver) = oneshot::channel();
        let previous = self.lock().replace(Handshake {
            sender: Some(sender),
            receiver: Some(receiver),
        });
        let superseded = previous.is_some_and(|handshake| handshake.sender.is_some());
        if superseded {
            log::debug!("Superseded an unfinished authorization handshake");
        }
        superseded
    }

    /// Relay the callback outcome
    ///
    /// Returns `false` if no handshake is open or it already received its outcome.
    pub fn deliver(&self, outcome: AuthOutcome) -> bool {
        let mut current = self.lock();
        let Some(handshake) = current.as_mut() else {
            log::debug!("Dropping authorization outcome: no handshake open");
            return false;
        };
        let Some(sender) = handshake.sender.take() else {
            log::debug!("Dropping duplicate authorization outcome");
            return false;
        };
        if handshake.is_spent() {
            *current = None;
        }
        drop(current);

        // The waiter may have given up already; the outcome is then discarded
        sender.send(outcome).is_ok()
    }

    /// Take the waiting side of the open handshake; only one waiter gets it
    pub fn listen(&self) -> Option<PendingAuthorization> {
        let mut current = self.lock();
        let handshake = current.as_mut()?;
        let receiver = handshake.receiver.take()?;
        if handshake.is_spent() {
            *current = None;
        }
        Some(PendingAuthorization { receiver })
    }

    /// Whether a handshake is open and still waiting for its outcome
    pub fn is_open(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|handshake| handshake.sender.is_some())
    }
}

/// The initiator's side of a handshake; resolves exactly once
pub struct PendingAuthorization {
    receiver: oneshot::Receiver<AuthOutcome>,
}

impl PendingAuthorization {
    pub async fn wait(self) -> AuthOutcome {
        self.receiver
            .await
            .unwrap_or_else(|_| AuthOutcome::error("authorization was superseded or abandoned"))
    }

    pub async fn wait_timeout(self, limit: Duration) -> AuthOutcome {
        tokio::time::timeout(limit, self.wait())
            .await
            .unwrap_or_else(|_| AuthOutcome::error("timed out waiting for Reddit authorization"))
    }
}
