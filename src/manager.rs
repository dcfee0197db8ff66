use std::{path::Path, sync::Arc};

use tracing::info;

use crate::{
    error::AppError,
    git::{GitGateway, GitIdentity},
    identity::Identity,
    storage::IdentityRepository,
    validation::{validate_email, validate_identity_name, validate_username},
};

/// The workspace's Git identity together with the stored identity it matches, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentIdentity {
    pub git: GitIdentity,
    pub matched: Option<Identity>,
}

/// Add, delete, list and switch stored identities
pub struct IdentityManager {
    repository: Arc<dyn IdentityRepository>,
    git: Arc<dyn GitGateway>,
}

impl IdentityManager {
    pub fn new(repository: Arc<dyn IdentityRepository>, git: Arc<dyn GitGateway>) -> Self {
        Self { repository, git }
    }

    pub fn repository(&self) -> Arc<dyn IdentityRepository> {
        Arc::clone(&self.repository)
    }

    pub fn list(&self) -> Result<Vec<Identity>, AppError> {
        self.repository.load()
    }

    /// Adds a new identity; a duplicate name is rejected and the list is left as is
    pub fn add(&self, name: &str, username: &str, email: &str) -> Result<Identity, AppError> {
        let mut identities = self.repository.load()?;
        validate_identity_name(name, &identities)?;
        validate_username(username)?;
        validate_email(email)?;

        let identity = Identity::new(name, username, email);
        identities.push(identity.clone());
        self.repository.replace_all(&identities)?;
        info!(name = %identity.name, "identity added");
        Ok(identity)
    }

    /// Deletes the identity called `name`; returns `false` when there was none
    pub fn delete(&self, name: &str) -> Result<bool, AppError> {
        let mut identities = self.repository.load()?;
        let initial_len = identities.len();
        identities.retain(|identity| identity.name != name);

        if identities.len() == initial_len {
            return Ok(false);
        }
        self.repository.replace_all(&identities)?;
        info!(%name, "identity deleted");
        Ok(true)
    }

    /// Writes the identity's username and email into the workspace Git config
    pub async fn switch(&self, name: &str, workspace: Option<&Path>) -> Result<Identity, AppError> {
        let identity = self
            .repository
            .load()?
            .into_iter()
            .find(|identity| identity.name == name)
            .ok_or_else(|| AppError::IdentityNotFound(name.to_string()))?;

        self.git
            .write_identity(workspace, &identity.username, &identity.email)
            .await?;
        info!(name = %identity.name, "switched identity");
        Ok(identity)
    }

    pub async fn current(&self, workspace: Option<&Path>) -> Result<CurrentIdentity, AppError> {
        let git = self.git.read_identity(workspace).await?;
        let matched = match (&git.username, &git.email) {
            (Some(username), Some(email)) => self
                .repository
                .load()?
                .into_iter()
                .find(|identity| identity.matches(username, email)),
            _ => None,
        };
        Ok(CurrentIdentity { git, matched })
    }
}
