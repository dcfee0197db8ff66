use std::{path::Path, sync::Arc};

use crate::{
    clipboard::{Clipboard, SystemClipboard},
    config::AppConfig,
    git::GitCli,
    manager::IdentityManager,
    ssh::{config::SshConfigSynthesizer, gateway::{SshGateway, SystemSshGateway}},
    storage::JsonSettingsRepository,
    wizard::WizardController,
};

/// Wires the configured collaborators together
pub struct App {
    config: AppConfig,
    manager: IdentityManager,
    ssh: Arc<dyn SshGateway>,
    clipboard: Arc<dyn Clipboard>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let repository = Arc::new(JsonSettingsRepository::new(&config.settings_path));
        let manager = IdentityManager::new(repository, Arc::new(GitCli));
        let ssh = Arc::new(SystemSshGateway::new(&config.ssh_dir, config.probe_timeout));

        Self {
            config,
            manager,
            ssh,
            clipboard: Arc::new(SystemClipboard),
        }
    }

    pub fn manager(&self) -> &IdentityManager {
        &self.manager
    }

    pub fn workspace(&self) -> Option<&Path> {
        self.config.workspace()
    }

    /// Starts a fresh wizard session
    pub fn wizard(&self) -> WizardController {
        WizardController::new(
            Arc::clone(&self.ssh),
            Arc::clone(&self.clipboard),
            self.manager.repository(),
            SshConfigSynthesizer::new(self.config.ssh_config_path(), self.config.key_dir_display()),
        )
    }
}
