//! Process-wide session store.
//!
//! Each operation takes the shard lock for the duration of a single map
//! access only; workflows are driven on a snapshot and written back, so no
//! lock is held across an await.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::session::{Session, SessionField, SessionId, SessionParams, SessionValue};

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<SessionId, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, params: &SessionParams) -> Result<SessionId, AppError> {
        params.validate()?;
        let session = Session::new(params);
        let id = session.id;
        self.sessions.insert(id, session);
        info!(session_id = %id, steps = ?params.steps, "Session created");
        Ok(id)
    }

    pub fn get_field(&self, id: SessionId, field: SessionField) -> Result<SessionValue, AppError> {
        self.sessions
            .get(&id)
            .map(|s| s.field(field))
            .ok_or(AppError::SessionNotFound(id))
    }

    /// Applies all values or none: every value is validated first.
    pub fn set_fields(&self, id: SessionId, values: Vec<SessionValue>) -> Result<(), AppError> {
        for value in &values {
            value.validate()?;
        }
        let mut session = self
            .sessions
            .get_mut(&id)
            .ok_or(AppError::SessionNotFound(id))?;
        for value in values {
            debug!(session_id = %id, field = value.field().as_str(), "Setting field");
            session.apply(value);
        }
        Ok(())
    }

    /// A copy of the whole session, for driving a workflow off-lock.
    pub fn snapshot(&self, id: SessionId) -> Result<Session, AppError> {
        self.sessions
            .get(&id)
            .map(|s| s.clone())
            .ok_or(AppError::SessionNotFound(id))
    }

    pub fn delete(&self, id: SessionId) -> Result<(), AppError> {
        if self.sessions.remove(&id).is_none() {
            return Err(AppError::SessionNotFound(id));
        }
        info!(session_id = %id, "Session deleted");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
