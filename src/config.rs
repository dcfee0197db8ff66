use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{cli::GlobalArgs, error::AppError};

/// Directory name under the user's config directory
const APP_DIR: &str = "gitid";
/// Identity settings file name
const SETTINGS_FILE: &str = "settings.json";
/// Settings file used when the platform has no config directory
const HOME_SETTINGS_FILE: &str = ".gitid.json";
/// SSH client configuration file name inside the SSH directory
const SSH_CONFIG_FILE: &str = "config";

/// Resolved locations and limits for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub settings_path: PathBuf,
    pub ssh_dir: PathBuf,
    /// Workspace for Git identity reads and writes
    pub workspace: Option<PathBuf>,
    pub probe_timeout: Duration,
    home_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Resolves CLI/environment values, falling back to per-user defaults
    pub fn resolve(args: &GlobalArgs) -> Result<Self, AppError> {
        let home_dir = dirs::home_dir();
        let missing_home =
            || AppError::Validation("failed to find the home directory".to_string());

        let settings_path = match &args.settings {
            Some(path) => path.clone(),
            None => match dirs::config_dir() {
                Some(config_dir) => config_dir.join(APP_DIR).join(SETTINGS_FILE),
                None => home_dir.as_ref().ok_or_else(missing_home)?.join(HOME_SETTINGS_FILE),
            },
        };

        let ssh_dir = match &args.ssh_dir {
            Some(path) => path.clone(),
            None => home_dir.as_ref().ok_or_else(missing_home)?.join(".ssh"),
        };

        let workspace = args.dir.clone().or_else(|| std::env::current_dir().ok());

        Ok(Self {
            settings_path,
            ssh_dir,
            workspace,
            probe_timeout: Duration::from_secs(args.probe_timeout.max(1)),
            home_dir,
        })
    }

    pub fn workspace(&self) -> Option<&Path> {
        self.workspace.as_deref()
    }

    pub fn ssh_config_path(&self) -> PathBuf {
        self.ssh_dir.join(SSH_CONFIG_FILE)
    }

    /// Key directory as written in `IdentityFile` lines: `~/.ssh` when it is the
    /// default location, the full path otherwise
    pub fn key_dir_display(&self) -> String {
        match &self.home_dir {
            Some(home) if self.ssh_dir == home.join(".ssh") => "~/.ssh".to_string(),
            _ => self.ssh_dir.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_paths_win() {
        let args = GlobalArgs {
            settings: Some(PathBuf::from("/tmp/gitid/settings.json")),
            ssh_dir: Some(PathBuf::from("/tmp/gitid/ssh")),
            dir: Some(PathBuf::from("/tmp/repo")),
            probe_timeout: 3,
            verbose: 0,
        };

        let config = AppConfig::resolve(&args).unwrap();
        assert_eq!(config.settings_path, PathBuf::from("/tmp/gitid/settings.json"));
        assert_eq!(config.ssh_config_path(), PathBuf::from("/tmp/gitid/ssh/config"));
        assert_eq!(config.workspace(), Some(Path::new("/tmp/repo")));
        assert_eq!(config.probe_timeout, Duration::from_secs(3));
        assert_eq!(config.key_dir_display(), "/tmp/gitid/ssh");
    }

    #[test]
    fn default_ssh_dir_is_shown_with_tilde() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let args = GlobalArgs {
            settings: Some(PathBuf::from("/tmp/settings.json")),
            ssh_dir: Some(home.join(".ssh")),
            probe_timeout: 10,
            ..GlobalArgs::default()
        };
        assert_eq!(AppConfig::resolve(&args).unwrap().key_dir_display(), "~/.ssh");
    }
}
