use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;
use tracing::{info, warn};

use crate::{
    error::AppError,
    process,
    ssh::{
        config::key_file_name,
        probe::{AuthSuccessMatcher, ConnectionReport},
    },
};

/// Upper bound on a connection probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Key size for generated RSA keys
const RSA_KEY_BITS: &str = "4096";

/// A generated (or reused) key pair, identified by its file name in the SSH directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    pub key_name: String,
    pub public_key: String,
}

/// External SSH tooling used by the wizard
#[async_trait]
pub trait SshGateway: Send + Sync {
    /// Generates `id_rsa_<slug>` for the identity, refusing to overwrite an existing key
    async fn generate_key_pair(&self, identity_name: &str, email: &str) -> Result<KeyPair, AppError>;

    /// Reads back the public half of an existing key
    async fn read_public_key(&self, key_name: &str) -> Result<KeyPair, AppError>;

    /// Probes `git@<host_alias>`; never fails, unreachable hosts are reported in the result
    async fn test_connection(&self, host_alias: &str, matcher: &dyn AuthSuccessMatcher) -> ConnectionReport;
}

/// `SshGateway` backed by `ssh-keygen` and `ssh`
#[derive(Debug, Clone)]
pub struct SystemSshGateway {
    ssh_dir: PathBuf,
    probe_timeout: Duration,
    keygen_program: PathBuf,
    ssh_program: PathBuf,
}

impl SystemSshGateway {
    pub fn new(ssh_dir: impl Into<PathBuf>, probe_timeout: Duration) -> Self {
        Self {
            ssh_dir: ssh_dir.into(),
            probe_timeout,
            keygen_program: PathBuf::from("ssh-keygen"),
            ssh_program: PathBuf::from("ssh"),
        }
    }

    /// Replaces the `ssh-keygen` and `ssh` executables
    pub fn with_programs(mut self, keygen: impl Into<PathBuf>, ssh: impl Into<PathBuf>) -> Self {
        self.keygen_program = keygen.into();
        self.ssh_program = ssh.into();
        self
    }

    pub fn ssh_dir(&self) -> &Path {
        &self.ssh_dir
    }

    fn public_key_path(&self, key_name: &str) -> PathBuf {
        self.ssh_dir.join(format!("{key_name}.pub"))
    }

    fn read_public_key_file(&self, key_name: &str) -> Result<KeyPair, AppError> {
        let path = self.public_key_path(key_name);
        let public_key = fs::read_to_string(&path).map_err(|err| {
            AppError::KeyGeneration(format!("cannot read {}: {err}", path.display()))
        })?;
        Ok(KeyPair {
            key_name: key_name.to_string(),
            public_key: public_key.trim_end().to_string(),
        })
    }
}

#[async_trait]
impl SshGateway for SystemSshGateway {
    async fn generate_key_pair(&self, identity_name: &str, email: &str) -> Result<KeyPair, AppError> {
        let key_name = key_file_name(identity_name);
        ensure_ssh_dir(&self.ssh_dir)?;

        let private_key = self.ssh_dir.join(&key_name);
        for path in [&private_key, &self.public_key_path(&key_name)] {
            if path.exists() {
                return Err(AppError::KeyExists(path.clone()));
            }
        }

        let mut command = Command::new(&self.keygen_program);
        command
            .args(["-q", "-t", "rsa", "-b", RSA_KEY_BITS, "-N", "", "-C", email, "-f"])
            .arg(&private_key);

        let output = process::run(command, None)
            .await
            .map_err(|err| AppError::KeyGeneration(err.to_string()))?;
        if !output.success {
            return Err(AppError::KeyGeneration(output.failure_message()));
        }

        info!(key = %private_key.display(), "key pair generated");
        self.read_public_key_file(&key_name)
    }

    async fn read_public_key(&self, key_name: &str) -> Result<KeyPair, AppError> {
        self.read_public_key_file(key_name)
    }

    async fn test_connection(&self, host_alias: &str, matcher: &dyn AuthSuccessMatcher) -> ConnectionReport {
        let mut command = Command::new(&self.ssh_program);
        command
            .args([
                "-T",
                "-o",
                "BatchMode=yes",
                "-o",
                "StrictHostKeyChecking=accept-new",
                "-o",
            ])
            .arg(format!("ConnectTimeout={}", self.probe_timeout.as_secs().max(1)))
            .arg(format!("git@{host_alias}"));

        match process::run(command, Some(self.probe_timeout)).await {
            Ok(output) => {
                let report = ConnectionReport::evaluate(&output.combined(), matcher);
                info!(%host_alias, success = report.success, code = ?output.code, "connection tested");
                report
            }
            Err(err) => {
                warn!(%host_alias, error = %err, "connection test did not complete");
                match &err {
                    AppError::ProcessTimeout { output, .. } if !output.is_empty() => {
                        ConnectionReport::failed(format!("{output}\n{err}"))
                    }
                    _ => ConnectionReport::failed(err.to_string()),
                }
            }
        }
    }
}

/// Creates the SSH directory with owner-only permissions if it is missing
pub fn ensure_ssh_dir(ssh_dir: &Path) -> Result<(), AppError> {
    if ssh_dir.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(ssh_dir)?;
    Ok(())
}
