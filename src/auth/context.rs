//! Identity records produced and consumed by the resolver.

use serde::{Deserialize, Serialize};

/// A user as seen by handlers behind the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub name: String,
    pub is_owner: bool,
}

/// Session as returned by a session store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user: Option<SessionUser>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: Option<String>,
    pub is_owner: bool,
}

/// Identity outcome attached to every request that passed the auth layer.
///
/// `caller_id` can be set while `is_authenticated` is false: a known reader
/// that may be attributed (comment authorship and the like) but holds no
/// elevated trust.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestContext {
    pub caller_id: Option<String>,
    pub is_guest: bool,
    pub is_authenticated: bool,
    pub token: Option<String>,
    pub user: Option<UserRecord>,
}

impl RequestContext {
    pub fn guest() -> Self {
        Self {
            caller_id: None,
            is_guest: true,
            is_authenticated: false,
            token: None,
            user: None,
        }
    }

    pub(crate) fn authenticate(&mut self, identity: Identity) {
        self.is_authenticated = true;
        self.user = Some(identity.user);
        self.token = identity.token;
    }

    pub(crate) fn finalize(mut self) -> Self {
        self.is_guest = !self.is_authenticated;
        self
    }

    /// True when the resolved user is the owner account.
    pub fn is_owner(&self) -> bool {
        self.is_authenticated && self.user.as_ref().is_some_and(|u| u.is_owner)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::guest()
    }
}

/// What a successful credential stage yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Identity {
    pub user: UserRecord,
    pub token: Option<String>,
    /// Credential that produced this identity, for logs and metrics.
    pub via: &'static str,
}
