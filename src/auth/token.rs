//! In-memory custom token store.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::auth::collaborators::{CollaboratorError, CustomTokenVerifier};
use crate::auth::context::UserRecord;

/// Custom tokens are a fixed prefix followed by a fixed number of characters.
pub struct MemoryTokenStore {
    prefix: String,
    length: usize,
    tokens: DashMap<String, UserRecord>,
}

impl MemoryTokenStore {
    pub fn new(prefix: impl Into<String>, length: usize) -> Self {
        Self {
            prefix: prefix.into(),
            length,
            tokens: DashMap::new(),
        }
    }

    /// Register a token for a user. Tokens that do not have the custom
    /// shape are never looked up.
    pub fn insert(&self, token: impl Into<String>, user: UserRecord) {
        self.tokens.insert(token.into(), user);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl CustomTokenVerifier for MemoryTokenStore {
    fn is_custom_token(&self, token: &str) -> bool {
        token
            .strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.chars().count() == self.length)
    }

    async fn verify_custom_token(
        &self,
        token: &str,
    ) -> Result<(bool, Option<UserRecord>), CollaboratorError> {
        Ok(match self.tokens.get(token) {
            Some(user) => (true, Some(user.value().clone())),
            None => (false, None),
        })
    }
}
