//! Session table
//!
//! Keyed storage for live sessions plus per-key serialization. The table
//! itself only guarantees atomic single operations; callers that need
//! check-then-insert hold the key's guard from [`SessionTable::lock_key`] for
//! the whole sequence.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::entry::{SessionInfo, StreamSession};
use super::key::SessionKey;

/// Table of active sessions
///
/// Thread-safe via `RwLock`; lookups by the request path are read-only.
pub struct SessionTable {
    /// Map of session key to session
    sessions: RwLock<HashMap<SessionKey, StreamSession>>,

    /// One mutex per key, created on first use
    key_locks: RwLock<HashMap<SessionKey, Arc<Mutex<()>>>>,

    next_id: AtomicU64,
}

impl SessionTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            key_locks: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Serialize work on one key
    ///
    /// Holders of the guard are the only writers that may insert under `key`.
    pub async fn lock_key(&self, key: &SessionKey) -> OwnedMutexGuard<()> {
        let lock = {
            let locks = self.key_locks.read().await;
            locks.get(key).cloned()
        };

        let lock = match lock {
            Some(lock) => lock,
            None => {
                let mut locks = self.key_locks.write().await;
                locks
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(())))
                    .clone()
            }
        };

        lock.lock_owned().await
    }

    /// Allocate a session id
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Register a session
    ///
    /// Returns the entry it displaced, which callers holding the key guard
    /// never produce.
    pub async fn insert(&self, session: StreamSession) -> Option<StreamSession> {
        let mut sessions = self.sessions.write().await;
        let displaced = sessions.insert(session.key.clone(), session);

        if let Some(ref old) = displaced {
            tracing::error!(
                key = %old.key,
                id = old.id,
                "Session displaced without supersession"
            );
        }

        displaced
    }

    /// Remove the session under `key`, whatever its id
    pub async fn remove(&self, key: &SessionKey) -> Option<StreamSession> {
        self.sessions.write().await.remove(key)
    }

    /// Remove the session under `key` only if it is session `id`
    ///
    /// Used by exit handlers so that the exit of a superseded converter
    /// cannot remove its replacement.
    pub async fn remove_if(&self, key: &SessionKey, id: u64) -> Option<StreamSession> {
        let mut sessions = self.sessions.write().await;

        match sessions.get(key) {
            Some(session) if session.id == id => sessions.remove(key),
            Some(session) => {
                tracing::debug!(
                    key = %key,
                    expected = id,
                    actual = session.id,
                    "Session id mismatch, keeping entry"
                );
                None
            }
            None => None,
        }
    }

    /// Whether a session is registered under `key`
    pub async fn contains(&self, key: &SessionKey) -> bool {
        self.sessions.read().await.contains_key(key)
    }

    /// Public path of the session under `key`
    pub async fn public_path(&self, key: &SessionKey) -> Option<String> {
        self.sessions
            .read()
            .await
            .get(key)
            .map(|s| s.public_path.clone())
    }

    /// Snapshot of one session
    pub async fn info(&self, key: &SessionKey) -> Option<SessionInfo> {
        self.sessions.read().await.get(key).map(StreamSession::info)
    }

    /// Snapshot of all sessions, ordered by key
    pub async fn snapshot(&self) -> Vec<SessionInfo> {
        let sessions = self.sessions.read().await;
        let mut infos: Vec<SessionInfo> = sessions.values().map(StreamSession::info).collect();
        infos.sort_by(|a, b| a.key.cmp(&b.key));
        infos
    }

    /// Number of registered sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the table is empty
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Remove and return every session
    pub async fn drain(&self) -> Vec<StreamSession> {
        self.sessions.write().await.drain().map(|(_, s)| s).collect()
    }
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::new()
    }
}
