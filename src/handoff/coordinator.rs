//! Entry points for the three actors of the handshake.
//!
//! - desktop: `issue_code`, then `await_confirmation` until it gets a result
//! - scanning device: `confirm_code` with its own verified session

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tracing::{debug, error, info, instrument, warn};

use super::{
    code::{CodeSource, LoginCode, RandomCodeGenerator},
    config::HandshakeConfig,
    error::HandshakeError,
    poll::wait_for,
    store::{CorrelationStore, EntryState, SessionCredential},
};

/// Verified session of the device confirming a code.
#[derive(Clone, Debug)]
pub struct AuthenticatedSession {
    pub subject: Option<String>,
    pub credential: SessionCredential,
}

/// Result of a single poll window.
#[derive(Clone, Debug)]
pub enum AwaitOutcome {
    Resolved(SessionCredential),
    /// Window elapsed while the code was still pending; poll again.
    TimedOut,
    Expired,
    NotFound,
}

pub struct HandshakeCoordinator {
    config: HandshakeConfig,
    store: Arc<CorrelationStore>,
    codes: Arc<dyn CodeSource>,
}

impl HandshakeCoordinator {
    #[must_use]
    pub fn new(
        config: HandshakeConfig,
        store: Arc<CorrelationStore>,
        codes: Arc<dyn CodeSource>,
    ) -> Self {
        Self {
            config: config.normalize(),
            store,
            codes,
        }
    }

    /// Coordinator with an in-memory store and random codes sized by `config`.
    #[must_use]
    pub fn with_defaults(config: HandshakeConfig) -> Self {
        let config = config.normalize();
        let store = Arc::new(CorrelationStore::from_config(&config));
        let codes = Arc::new(RandomCodeGenerator::new(config.code_length()));
        Self::new(config, store, codes)
    }

    #[must_use]
    pub fn config(&self) -> &HandshakeConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<CorrelationStore> {
        &self.store
    }

    /// Register a fresh code for a desktop that wants to log in.
    ///
    /// # Errors
    /// Returns `IssueExhausted` when every attempt collided with a tracked
    /// code, or `Entropy` if the random source failed.
    #[instrument(skip_all)]
    pub async fn issue_code(&self) -> Result<LoginCode, HandshakeError> {
        let attempts = self.config.max_issue_attempts();

        for attempt in 1..=attempts {
            let code = self.codes.issue()?;
            match self.store.create(code).await {
                Ok(entry) => {
                    debug!(attempt, "issued login code");
                    return Ok(entry.code().clone());
                }
                Err(HandshakeError::DuplicateCode) => {
                    warn!(attempt, "login code collision, retrying");
                }
                Err(err) => return Err(err),
            }
        }

        error!(attempts, "failed to issue a unique login code");
        Err(HandshakeError::IssueExhausted { attempts })
    }

    /// Hand the confirming device's session over to whoever polls `code`.
    ///
    /// # Errors
    /// Returns `UnknownCode`, `AlreadyResolved` or `CodeExpired` from the store.
    #[instrument(skip_all, fields(code = %code))]
    pub async fn confirm_code(
        &self,
        code: &LoginCode,
        session: &AuthenticatedSession,
    ) -> Result<(), HandshakeError> {
        match self.store.resolve(code, session.credential.clone()).await {
            Ok(()) => {
                info!(subject = session.subject.as_deref(), "login code confirmed");
                Ok(())
            }
            Err(err) => {
                debug!(subject = session.subject.as_deref(), "login code rejected: {err}");
                Err(err)
            }
        }
    }

    /// Wait up to one poll window for `code` to be confirmed.
    ///
    /// A code that expires during the window ends it with `TimedOut`, so the
    /// desktop polls again and learns about the expiry then. The store lock is
    /// only held for each individual check.
    #[instrument(skip_all, fields(code = %code))]
    pub async fn await_confirmation(&self, code: &LoginCode) -> AwaitOutcome {
        let store = &self.store;
        let seen_pending = AtomicBool::new(false);
        let seen_pending = &seen_pending;
        let outcome = wait_for(
            || async move {
                match store.lookup(code).await {
                    Ok(EntryState::Pending) => {
                        seen_pending.store(true, Ordering::Relaxed);
                        None
                    }
                    Ok(EntryState::Resolved(credential)) => Some(AwaitOutcome::Resolved(credential)),
                    // A code that runs out of TTL while this window waits is a plain
                    // timeout. Only a code already expired on the first check is reported.
                    Ok(EntryState::Expired) if seen_pending.load(Ordering::Relaxed) => {
                        Some(AwaitOutcome::TimedOut)
                    }
                    Ok(EntryState::Expired) => Some(AwaitOutcome::Expired),
                    // Retrying cannot bring back a code the store does not know.
                    Err(_) => Some(AwaitOutcome::NotFound),
                }
            },
            self.config.poll_window(),
            self.config.poll_interval(),
        )
        .await;

        outcome.unwrap_or(AwaitOutcome::TimedOut)
    }
}

impl std::fmt::Debug for HandshakeCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeCoordinator")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
