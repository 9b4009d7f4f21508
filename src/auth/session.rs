//! In-memory session store keyed by cookie value.

use async_trait::async_trait;
use axum::http::{header::COOKIE, HeaderMap};
use dashmap::DashMap;

use crate::auth::collaborators::{CollaboratorError, SessionStore};
use crate::auth::context::Session;

pub struct MemorySessionStore {
    cookie_name: String,
    sessions: DashMap<String, Session>,
}

impl MemorySessionStore {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            sessions: DashMap::new(),
        }
    }

    pub fn insert(&self, session_id: impl Into<String>, session: Session) {
        self.sessions.insert(session_id.into(), session);
    }

    /// Value of the session cookie, searching every `Cookie` header.
    fn session_id<'h>(&self, headers: &'h HeaderMap) -> Option<&'h str> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value.trim_matches('"'))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, CollaboratorError> {
        let Some(id) = self.session_id(headers) else {
            return Ok(None);
        };
        Ok(self.sessions.get(id).map(|s| s.value().clone()))
    }
}
