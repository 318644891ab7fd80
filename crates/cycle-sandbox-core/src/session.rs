//! In-memory session store.
//!
//! A session binds a generated id to one model handle plus the metadata it was
//! created with. Sessions live until they are closed; the store enforces a
//! capacity limit instead of expiring them.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{require_session_id, ErrorKind, ToolError};
use crate::model::CycleModel;

/// Default number of live sessions a store accepts.
pub const DEFAULT_MAX_SESSIONS: usize = 32;

/// Creation-time metadata of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionMeta {
    pub cycle_type: String,
    pub mode: String,
    pub options: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl SessionMeta {
    pub fn new(cycle_type: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            cycle_type: cycle_type.into(),
            mode: mode.into(),
            options: Map::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_options(mut self, options: Map<String, Value>) -> Self {
        self.options = options;
        self
    }
}

/// One live session.
pub struct Session {
    id: String,
    meta: SessionMeta,
    model: Mutex<Box<dyn CycleModel>>,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn meta(&self) -> &SessionMeta {
        &self.meta
    }

    /// Exclusive access to the model for the duration of one operation.
    pub fn model(&self) -> MutexGuard<'_, Box<dyn CycleModel>> {
        self.model.lock()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

/// Maps session ids to sessions.
///
/// The map lock is held only for insert, lookup and removal. Model work happens
/// under the per-session lock, so different sessions never block each other.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_sessions,
        }
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Register a model under a fresh id.
    pub fn create(
        &self,
        model: Box<dyn CycleModel>,
        meta: SessionMeta,
    ) -> Result<String, ToolError> {
        let mut sessions = self.sessions.lock();
        if sessions.len() >= self.max_sessions {
            return Err(ToolError::new(
                ErrorKind::SessionLimit,
                format!(
                    "Session limit reached ({} live sessions); close a session first",
                    self.max_sessions
                ),
            ));
        }

        let id = Uuid::new_v4().to_string();
        tracing::info!(
            session_id = %id,
            cycle_type = %meta.cycle_type,
            mode = %meta.mode,
            "session created"
        );
        sessions.insert(
            id.clone(),
            Arc::new(Session {
                id: id.clone(),
                meta,
                model: Mutex::new(model),
            }),
        );
        Ok(id)
    }

    /// Look up a live session.
    pub fn get(&self, session_id: &str) -> Result<Arc<Session>, ToolError> {
        require_session_id(session_id)?;
        self.sessions
            .lock()
            .get(session_id)
            .cloned()
            .ok_or_else(|| ToolError::session_not_found(session_id))
    }

    /// Remove a session. Returns whether it existed; absent ids are a no-op.
    pub fn close(&self, session_id: &str) -> bool {
        let removed = self.sessions.lock().remove(session_id).is_some();
        if removed {
            tracing::info!(session_id = %session_id, "session closed");
        }
        removed
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.lock().contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live session ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.lock().keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableModel;

    fn model() -> Box<dyn CycleModel> {
        Box::new(TableModel::new("probe"))
    }

    #[test]
    fn create_get_close() {
        let store = SessionStore::default();
        let id = store.create(model(), SessionMeta::new("turbojet", "design")).unwrap();

        let session = store.get(&id).unwrap();
        assert_eq!(session.id(), id);
        assert_eq!(session.meta().mode, "design");
        assert_eq!(session.model().name(), "probe");

        assert!(store.close(&id));
        let err = store.get(&id).unwrap_err();
        assert_eq!(err.kind, ErrorKind::SessionNotFound);
    }

    #[test]
    fn close_is_idempotent() {
        let store = SessionStore::default();
        assert!(!store.close("missing"));
        let id = store.create(model(), SessionMeta::new("custom", "design")).unwrap();
        assert!(store.close(&id));
        assert!(!store.close(&id));
        assert!(store.is_empty());
    }

    #[test]
    fn ids_are_unique() {
        let store = SessionStore::default();
        let a = store.create(model(), SessionMeta::new("t", "design")).unwrap();
        let b = store.create(model(), SessionMeta::new("t", "design")).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn capacity_is_enforced() {
        let store = SessionStore::new(1);
        let first = store.create(model(), SessionMeta::new("t", "design")).unwrap();
        let err = store
            .create(model(), SessionMeta::new("t", "design"))
            .unwrap_err();
        assert_eq!(err.type_name(), "SessionLimitExceeded");

        store.close(&first);
        assert!(store.create(model(), SessionMeta::new("t", "design")).is_ok());
    }

    #[test]
    fn blank_id_is_validation_error() {
        let err = SessionStore::default().get("").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
