//! Owner account lookup backed by configuration.

use async_trait::async_trait;

use crate::auth::collaborators::{CollaboratorError, UserDirectory};
use crate::auth::context::UserRecord;
use crate::config::schema::OwnerConfig;

pub struct StaticUserDirectory {
    owner: UserRecord,
}

impl StaticUserDirectory {
    pub fn new(owner: UserRecord) -> Self {
        Self { owner }
    }

    pub fn from_config(config: &OwnerConfig) -> Self {
        Self::new(UserRecord {
            id: config.id.clone(),
            username: config.username.clone(),
            name: config.name.clone(),
            is_owner: true,
        })
    }

    pub fn owner(&self) -> &UserRecord {
        &self.owner
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn get_owner(&self) -> Result<UserRecord, CollaboratorError> {
        Ok(self.owner.clone())
    }
}
