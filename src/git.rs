use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

use crate::{error::AppError, process};

/// Git config key holding the author name
pub const USER_NAME_KEY: &str = "user.name";
/// Git config key holding the author email
pub const USER_EMAIL_KEY: &str = "user.email";

/// Author fields as Git currently resolves them in a workspace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitIdentity {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Reads and writes the two Git identity keys of a workspace
#[async_trait]
pub trait GitGateway: Send + Sync {
    /// Reads `user.name` and `user.email`; unset keys come back as `None`
    async fn read_identity(&self, workspace: Option<&Path>) -> Result<GitIdentity, AppError>;

    /// Sets `user.name` and `user.email`
    async fn write_identity(
        &self,
        workspace: Option<&Path>,
        username: &str,
        email: &str,
    ) -> Result<(), AppError>;
}

/// `GitGateway` backed by the `git` executable
#[derive(Debug, Default)]
pub struct GitCli;

impl GitCli {
    /// Makes sure a workspace exists and is inside a Git work tree
    async fn require_repository<'a>(&self, workspace: Option<&'a Path>) -> Result<&'a Path, AppError> {
        let workspace = workspace.ok_or(AppError::GitNotRepository)?;
        if !workspace.is_dir() || !is_inside_git_repo(workspace).await? {
            return Err(AppError::GitNotRepository);
        }
        Ok(workspace)
    }
}

#[async_trait]
impl GitGateway for GitCli {
    async fn read_identity(&self, workspace: Option<&Path>) -> Result<GitIdentity, AppError> {
        let workspace = self.require_repository(workspace).await?;
        Ok(GitIdentity {
            username: get_git_config(workspace, USER_NAME_KEY).await?,
            email: get_git_config(workspace, USER_EMAIL_KEY).await?,
        })
    }

    async fn write_identity(
        &self,
        workspace: Option<&Path>,
        username: &str,
        email: &str,
    ) -> Result<(), AppError> {
        let workspace = self.require_repository(workspace).await?;
        set_git_config(workspace, USER_NAME_KEY, username).await?;
        set_git_config(workspace, USER_EMAIL_KEY, email).await?;
        info!(workspace = %workspace.display(), %username, %email, "git identity written");
        Ok(())
    }
}

fn git(workspace: &Path) -> Command {
    let mut command = Command::new("git");
    command.current_dir(workspace);
    command
}

/// Executes Git config get command
///
/// # Arguments
/// * `workspace` - Directory to run Git in
/// * `key` - Git config key (user.name or user.email)
async fn get_git_config(workspace: &Path, key: &str) -> Result<Option<String>, AppError> {
    let mut command = git(workspace);
    command.args(["config", "--get", key]);
    let output = process::run(command, None).await?;

    if !output.success {
        // `git config --get` exits 1 without output when the key is unset
        if output.code == Some(1) && output.stderr.trim().is_empty() {
            return Ok(None);
        }
        return Err(AppError::GitCommand(output.failure_message()));
    }

    let value = output.stdout.trim().to_string();
    Ok((!value.is_empty()).then_some(value))
}

/// Executes a Git config set command
///
/// # Arguments
/// * `workspace` - Directory to run Git in
/// * `key` - Git config key to set (user.name or user.email)
/// * `value` - Value to set for key (username or email)
async fn set_git_config(workspace: &Path, key: &str, value: &str) -> Result<(), AppError> {
    let mut command = git(workspace);
    command.args(["config", key, value]);
    let output = process::run(command, None).await?;

    if !output.success {
        return Err(AppError::GitCommand(output.failure_message()));
    }
    Ok(())
}

/// Checks if the workspace is inside a Git work tree
async fn is_inside_git_repo(workspace: &Path) -> Result<bool, AppError> {
    let mut command = git(workspace);
    command.args(["rev-parse", "--is-inside-work-tree"]);
    let output = process::run(command, None).await?;

    Ok(output.success && output.stdout.trim() == "true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_workspace_is_not_a_repository() {
        let result = GitCli.read_identity(None).await;
        assert!(matches!(result, Err(AppError::GitNotRepository)));
    }

    #[tokio::test]
    async fn nonexistent_directory_is_not_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let result = GitCli.write_identity(Some(&missing), "jdoe", "a@b.com").await;
        assert!(matches!(result, Err(AppError::GitNotRepository)));
    }
}
