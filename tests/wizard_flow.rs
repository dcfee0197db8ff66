use std::{fs, path::Path, sync::Arc};

use async_trait::async_trait;
use gitid::{
    clipboard::Clipboard,
    error::AppError,
    ssh::{
        config::key_file_name, AuthSuccessMatcher, ConnectionReport, KeyPair, Provider,
        SshConfigSynthesizer, SshGateway,
    },
    storage::{IdentityRepository, JsonSettingsRepository},
    wizard::{IdentityInfo, WizardController, WizardStep},
    Identity,
};

const GITHUB_GREETING: &str =
    "Hi jdoe! You've successfully authenticated, but GitHub does not provide shell access.";

/// Writes key files like `ssh-keygen` would, without running it
struct FileKeygen {
    ssh_dir: std::path::PathBuf,
}

#[async_trait]
impl SshGateway for FileKeygen {
    async fn generate_key_pair(&self, identity_name: &str, email: &str) -> Result<KeyPair, AppError> {
        let key_name = key_file_name(identity_name);
        fs::write(self.ssh_dir.join(&key_name), "PRIVATE")?;
        fs::write(
            self.ssh_dir.join(format!("{key_name}.pub")),
            format!("ssh-rsa AAAAB3Nza {email}\n"),
        )?;
        self.read_public_key(&key_name).await
    }

    async fn read_public_key(&self, key_name: &str) -> Result<KeyPair, AppError> {
        let public_key = fs::read_to_string(self.ssh_dir.join(format!("{key_name}.pub")))?;
        Ok(KeyPair {
            key_name: key_name.to_string(),
            public_key: public_key.trim_end().to_string(),
        })
    }

    async fn test_connection(&self, _host_alias: &str, matcher: &dyn AuthSuccessMatcher) -> ConnectionReport {
        ConnectionReport::evaluate(GITHUB_GREETING, matcher)
    }
}

struct NullClipboard;

#[async_trait]
impl Clipboard for NullClipboard {
    async fn write_text(&self, _text: &str) -> Result<(), AppError> {
        Ok(())
    }
}

fn controller(root: &Path) -> WizardController {
    WizardController::new(
        Arc::new(FileKeygen {
            ssh_dir: root.to_path_buf(),
        }),
        Arc::new(NullClipboard),
        Arc::new(JsonSettingsRepository::new(root.join("settings.json"))),
        SshConfigSynthesizer::new(root.join("config"), "~/.ssh"),
    )
}

fn work() -> IdentityInfo {
    IdentityInfo {
        identity_name: "Work".to_string(),
        email: "a@b.com".to_string(),
        provider: Provider::Github,
        host_name: None,
    }
}

#[tokio::test]
async fn work_identity_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let controller = controller(dir.path());

    controller.submit_identity(work()).unwrap();
    let pair = controller.generate_key().await.unwrap();
    assert_eq!(pair.key_name, "id_rsa_work");
    assert_eq!(pair.public_key, "ssh-rsa AAAAB3Nza a@b.com");

    let instructions = controller.instructions().unwrap();
    assert_eq!(instructions.settings_url, Some("https://github.com/settings/keys"));
    controller.continue_to_configure().unwrap();

    let update = controller.update_ssh_config().unwrap();
    assert_eq!(update.host_alias, "github-work");
    assert_eq!(update.clone_example, "git clone git@github-work:username/repo.git");

    let config = fs::read_to_string(dir.path().join("config")).unwrap();
    assert!(config.contains("Host github-work\n"));
    assert!(config.contains("  IdentityFile ~/.ssh/id_rsa_work\n"));

    let report = controller.test_connection().await.unwrap();
    assert!(report.success);
    assert_eq!(controller.snapshot().step, WizardStep::ConfigureAndTest);
}

#[tokio::test]
async fn configured_alias_leaves_config_byte_for_byte() {
    let dir = tempfile::tempdir().unwrap();
    let existing = "Host *\n  AddKeysToAgent yes\n\nHost github-work\n  HostName github.com\n";
    fs::write(dir.path().join("config"), existing).unwrap();

    let controller = controller(dir.path());
    controller.submit_identity(work()).unwrap();
    controller.generate_key().await.unwrap();

    let update = controller.update_ssh_config().unwrap();
    assert_eq!(update.host_alias, "github-work");
    assert!(!update.written);
    assert_eq!(fs::read_to_string(dir.path().join("config")).unwrap(), existing);
}

#[tokio::test]
async fn two_sessions_write_one_block() {
    let dir = tempfile::tempdir().unwrap();

    for _ in 0..2 {
        let controller = controller(dir.path());
        controller.submit_identity(work()).unwrap();
        controller.generate_key().await.unwrap();
        controller.update_ssh_config().unwrap();
    }

    let config = fs::read_to_string(dir.path().join("config")).unwrap();
    assert_eq!(config.matches("Host github-work").count(), 1);
}

#[tokio::test]
async fn stored_identity_with_clashing_key_name_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    JsonSettingsRepository::new(dir.path().join("settings.json"))
        .replace_all(&[Identity::new("work", "jdoe", "jdoe@corp.example")])
        .unwrap();

    let controller = controller(dir.path());
    let result = controller.submit_identity(work());
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(controller.snapshot().step, WizardStep::IdentityInfo);
}
