//! In-memory correlation store for pending login codes.
//!
//! Retention:
//! - `Pending` entries become `Expired` once older than the code TTL.
//! - `Expired` entries stay as tombstones for `grace` after expiry so a late
//!   confirm is told the code expired instead of that it never existed.
//! - `Resolved` entries are dropped `grace` after a lookup first observed
//!   them. An unobserved resolution is never dropped.

use secrecy::{ExposeSecret, SecretString};
use std::collections::{HashMap, hash_map::Entry};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument};

use super::{code::LoginCode, config::HandshakeConfig, error::HandshakeError};

/// Session handle handed from the confirming device to the polling one.
#[derive(Clone)]
pub struct SessionCredential(SecretString);

impl SessionCredential {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionCredential(***)")
    }
}

#[derive(Clone, Debug)]
pub enum EntryState {
    Pending,
    Resolved(SessionCredential),
    Expired,
}

impl EntryState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Clone, Debug)]
pub struct CorrelationEntry {
    code: LoginCode,
    state: EntryState,
    created_at: Instant,
    observed_at: Option<Instant>,
}

impl CorrelationEntry {
    fn pending(code: LoginCode, now: Instant) -> Self {
        Self {
            code,
            state: EntryState::Pending,
            created_at: now,
            observed_at: None,
        }
    }

    #[must_use]
    pub fn code(&self) -> &LoginCode {
        &self.code
    }

    #[must_use]
    pub fn state(&self) -> &EntryState {
        &self.state
    }

    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }
}

pub struct CorrelationStore {
    ttl: Duration,
    grace: Duration,
    entries: Mutex<HashMap<LoginCode, CorrelationEntry>>,
}

impl CorrelationStore {
    #[must_use]
    pub fn new(ttl: Duration, grace: Duration) -> Self {
        Self {
            ttl,
            grace,
            entries: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn from_config(config: &HandshakeConfig) -> Self {
        Self::new(config.code_ttl(), config.grace())
    }

    /// Insert a new `Pending` entry for `code`.
    ///
    /// # Errors
    /// Returns `HandshakeError::DuplicateCode` if the code is still tracked.
    #[instrument(skip_all, fields(code = %code))]
    pub async fn create(&self, code: LoginCode) -> Result<CorrelationEntry, HandshakeError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        self.prune(&mut entries, now);

        match entries.entry(code) {
            Entry::Occupied(_) => Err(HandshakeError::DuplicateCode),
            Entry::Vacant(slot) => {
                let entry = CorrelationEntry::pending(slot.key().clone(), now);
                slot.insert(entry.clone());
                Ok(entry)
            }
        }
    }

    /// Attach `credential` to a pending code.
    ///
    /// # Errors
    /// Returns `UnknownCode` if the code is not tracked, `AlreadyResolved` if
    /// it was confirmed before, and `CodeExpired` once its TTL has passed.
    #[instrument(skip_all, fields(code = %code))]
    pub async fn resolve(
        &self,
        code: &LoginCode,
        credential: SessionCredential,
    ) -> Result<(), HandshakeError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(code).ok_or(HandshakeError::UnknownCode)?;
        self.refresh(entry, now);

        match entry.state {
            EntryState::Pending => {
                entry.state = EntryState::Resolved(credential);
                Ok(())
            }
            EntryState::Resolved(_) => Err(HandshakeError::AlreadyResolved),
            EntryState::Expired => Err(HandshakeError::CodeExpired),
        }
    }

    /// Current state of `code`.
    ///
    /// The first lookup that sees a terminal state starts its grace period;
    /// a lookup after the grace period still returns the state, then drops
    /// the entry.
    ///
    /// # Errors
    /// Returns `HandshakeError::UnknownCode` if the code is not tracked.
    pub async fn lookup(&self, code: &LoginCode) -> Result<EntryState, HandshakeError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(code).ok_or(HandshakeError::UnknownCode)?;
        self.refresh(entry, now);

        if entry.state.is_terminal() && entry.observed_at.is_none() {
            entry.observed_at = Some(now);
        }

        let state = entry.state.clone();
        if self.collectable(entry, now) {
            entries.remove(code);
        }

        Ok(state)
    }

    /// Drop entries whose retention has run out, returning how many went.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        self.prune(&mut entries, now)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    fn prune(&self, entries: &mut HashMap<LoginCode, CorrelationEntry>, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| {
            self.refresh(entry, now);
            !self.collectable(entry, now)
        });
        before - entries.len()
    }

    fn refresh(&self, entry: &mut CorrelationEntry, now: Instant) {
        if matches!(entry.state, EntryState::Pending)
            && now.duration_since(entry.created_at) > self.ttl
        {
            entry.state = EntryState::Expired;
        }
    }

    fn collectable(&self, entry: &CorrelationEntry, now: Instant) -> bool {
        match entry.state {
            EntryState::Pending => false,
            EntryState::Expired => {
                now.duration_since(entry.created_at) > self.ttl.saturating_add(self.grace)
            }
            EntryState::Resolved(_) => entry
                .observed_at
                .is_some_and(|observed| now.duration_since(observed) >= self.grace),
        }
    }
}

impl fmt::Debug for CorrelationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrelationStore")
            .field("ttl", &self.ttl)
            .field("grace", &self.grace)
            .finish_non_exhaustive()
    }
}

/// Spawn a background task that sweeps `store` every `every` until
/// `shutdown` flips to `true` or its sender is dropped.
pub fn spawn_sweeper(
    store: Arc<CorrelationStore>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = store.sweep().await;
                    if removed > 0 {
                        debug!(removed, "swept login codes");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("login code sweeper stopped");
    })
}
