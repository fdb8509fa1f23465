//! Session context and background balance refresh
//!
//! The signed-in account is held in an explicit [`SessionContext`] that is
//! loaded, saved and cleared through a [`SessionStore`]. A
//! [`BalanceRefresher`] keeps the cached snapshot current by re-reading the
//! Account Store on a fixed interval; it never writes to any ledger store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use core_kernel::PortError;

use crate::account::{Account, Actor, BalanceSnapshot};
use crate::directory::AccountDirectory;
use crate::error::LedgerError;
use crate::ports::AccountStore;

/// Errors from persisting a session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<SessionError> for LedgerError {
    fn from(err: SessionError) -> Self {
        LedgerError::Storage(PortError::Internal {
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

/// The signed-in account and when it was last refreshed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub account: BalanceSnapshot,
    pub signed_in_at: DateTime<Utc>,
    pub refreshed_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn new(account: &Account) -> Self {
        let now = Utc::now();
        Self {
            account: BalanceSnapshot::from(account),
            signed_in_at: now,
            refreshed_at: now,
        }
    }

    pub fn actor(&self) -> Actor {
        self.account.actor()
    }

    /// Replaces the snapshot with a fresh read of the account
    pub fn refresh(&mut self, account: &Account) {
        self.account = BalanceSnapshot::from(account);
        self.refreshed_at = Utc::now();
    }
}

/// Persistence for the current session
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn load(&self) -> Result<Option<SessionContext>, SessionError>;
    async fn save(&self, context: &SessionContext) -> Result<(), SessionError>;
    async fn clear(&self) -> Result<(), SessionError>;
}

/// Keeps the session as a JSON file
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<SessionContext>, SessionError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&raw) {
            Ok(context) => Ok(Some(context)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Discarding unreadable session file");
                self.clear().await?;
                Ok(None)
            }
        }
    }

    async fn save(&self, context: &SessionContext) -> Result<(), SessionError> {
        let json = serde_json::to_vec_pretty(context)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps the session in process memory
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    context: RwLock<Option<SessionContext>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<SessionContext>, SessionError> {
        Ok(self.context.read().await.clone())
    }

    async fn save(&self, context: &SessionContext) -> Result<(), SessionError> {
        *self.context.write().await = Some(context.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        *self.context.write().await = None;
        Ok(())
    }
}

/// Session shared between the caller and the refresher
pub type SharedSession = Arc<RwLock<Option<SessionContext>>>;

/// Authenticates and persists a new session
pub async fn sign_in(
    directory: &AccountDirectory,
    store: &dyn SessionStore,
    name: &str,
    pin: &str,
) -> Result<SessionContext, LedgerError> {
    let account = directory.authenticate(name, pin).await?;
    let context = SessionContext::new(&account);
    store.save(&context).await?;
    info!(account_id = %account.id, "Signed in");
    Ok(context)
}

/// Stops the refresher (if any) and clears the session everywhere
pub async fn sign_out(
    session: &SharedSession,
    store: &dyn SessionStore,
    refresher: Option<RefreshHandle>,
) -> Result<(), LedgerError> {
    if let Some(handle) = refresher {
        handle.stop().await;
    }
    *session.write().await = None;
    store.clear().await?;
    info!("Signed out");
    Ok(())
}

/// Handle to a running refresher
///
/// Dropping the handle also ends the task.
#[derive(Debug)]
pub struct RefreshHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Cancels the task and waits for it to finish
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Balance refresher ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Periodic read-only resynchronization of the session snapshot
pub struct BalanceRefresher;

impl BalanceRefresher {
    /// Spawns the refresh loop; the first refresh happens one interval from now
    pub fn spawn(
        interval: Duration,
        accounts: Arc<dyn AccountStore>,
        session: SharedSession,
        store: Arc<dyn SessionStore>,
    ) -> RefreshHandle {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            debug!("Balance refresher stopped");
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        if !refresh_once(accounts.as_ref(), &session, store.as_ref()).await {
                            break;
                        }
                    }
                }
            }
        });

        RefreshHandle { shutdown, task }
    }
}

/// Returns false when the session is over and the loop should end
async fn refresh_once(accounts: &dyn AccountStore, session: &SharedSession, store: &dyn SessionStore) -> bool {
    let account_id = match session.read().await.as_ref() {
        Some(context) => context.account.account_id,
        None => return false,
    };

    match accounts.get_account(account_id).await {
        Ok(account) => {
            let updated = {
                let mut guard = session.write().await;
                match guard.as_mut() {
                    Some(context) if context.account.account_id == account_id => {
                        context.refresh(&account);
                        context.clone()
                    }
                    _ => return false,
                }
            };
            if let Err(e) = store.save(&updated).await {
                warn!(%account_id, error = %e, "Could not persist refreshed session");
            }
            true
        }
        Err(e) if e.is_not_found() => {
            info!(%account_id, "Account no longer exists, ending session");
            *session.write().await = None;
            if let Err(e) = store.clear().await {
                warn!(error = %e, "Could not clear session");
            }
            false
        }
        Err(e) => {
            warn!(%account_id, error = %e, "Balance refresh failed, keeping last snapshot");
            true
        }
    }
}
