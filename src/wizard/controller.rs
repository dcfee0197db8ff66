use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::{
    clipboard::Clipboard,
    error::AppError,
    ssh::{
        config::{ConfigUpdate, SshConfigSynthesizer},
        gateway::{KeyPair, SshGateway},
        probe::ConnectionReport,
        provider::ProviderInstructions,
    },
    storage::IdentityRepository,
    wizard::{
        machine::{IdentityInfo, KeyAction, WizardMachine, WizardSnapshot, WizardStep},
        protocol::{
            CopyPublicKeyData, GenerateKeyData, NoData, Outcome, ProbeOutput, TestConnectionData,
            UpdateConfigData, WizardCommand, WizardResponse,
        },
    },
};

/// Marks one wizard step as running; released on drop
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, AppError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| AppError::StepInProgress)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Checks that an optional payload field agrees with the session
fn ensure_matches(field: &str, given: Option<&str>, expected: Option<&str>) -> Result<(), AppError> {
    match (given, expected) {
        (Some(given), Some(expected)) if given != expected => Err(AppError::StepOutOfOrder(format!(
            "{field} '{given}' does not match the wizard session ('{expected}')"
        ))),
        _ => Ok(()),
    }
}

/// Drives one wizard session: runs the side effects of each step and feeds
/// their results into the [`WizardMachine`].
///
/// Only one step runs at a time; a trigger arriving while another step is
/// outstanding fails with [`AppError::StepInProgress`].
pub struct WizardController {
    machine: Mutex<WizardMachine>,
    in_flight: AtomicBool,
    ssh: Arc<dyn SshGateway>,
    clipboard: Arc<dyn Clipboard>,
    identities: Arc<dyn IdentityRepository>,
    synthesizer: SshConfigSynthesizer,
}

impl WizardController {
    pub fn new(
        ssh: Arc<dyn SshGateway>,
        clipboard: Arc<dyn Clipboard>,
        identities: Arc<dyn IdentityRepository>,
        synthesizer: SshConfigSynthesizer,
    ) -> Self {
        Self {
            machine: Mutex::new(WizardMachine::new()),
            in_flight: AtomicBool::new(false),
            ssh,
            clipboard,
            identities,
            synthesizer,
        }
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        self.machine.lock().snapshot()
    }

    pub fn submit_identity(&self, info: IdentityInfo) -> Result<(), AppError> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let stored = self.identities.load()?;
        self.machine.lock().submit_identity(info, &stored)
    }

    /// Generates the identity's key pair, or returns the one this session already made
    pub async fn generate_key(&self) -> Result<KeyPair, AppError> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let action = self.machine.lock().key_action()?;

        let pair = match action {
            KeyAction::Reuse(pair) => pair,
            KeyAction::Generate {
                identity_name,
                email,
            } => {
                info!(%identity_name, "generating key pair");
                self.ssh.generate_key_pair(&identity_name, &email).await?
            }
        };

        self.machine.lock().key_ready(pair.clone());
        Ok(pair)
    }

    /// Adopts a key file that already exists on disk for this identity
    pub async fn reuse_existing_key(&self) -> Result<KeyPair, AppError> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let key_name = self.machine.lock().expected_key_name()?;

        let pair = self.ssh.read_public_key(&key_name).await?;
        info!(%key_name, "reusing existing key pair");
        self.machine.lock().key_ready(pair.clone());
        Ok(pair)
    }

    pub fn instructions(&self) -> Result<ProviderInstructions, AppError> {
        self.machine.lock().instructions()
    }

    /// Copies `public_key`, or the session's key when `None`; available at any step
    pub async fn copy_public_key(&self, public_key: Option<String>) -> Result<(), AppError> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let public_key = match public_key {
            Some(key) => key,
            None => self.machine.lock().public_key()?.to_string(),
        };
        self.clipboard.write_text(&public_key).await
    }

    pub fn continue_to_configure(&self) -> Result<(), AppError> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        self.machine.lock().continue_to_configure()
    }

    pub fn set_host_name(&self, host_name: &str) -> Result<(), AppError> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        self.machine.lock().set_host_name(host_name);
        Ok(())
    }

    /// Writes the host alias block into the SSH client configuration
    pub fn update_ssh_config(&self) -> Result<ConfigUpdate, AppError> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let request = self.machine.lock().config_request()?;

        let update = self.synthesizer.upsert_entry(&request)?;
        self.machine.lock().config_written(&update);
        Ok(update)
    }

    /// Probes the configured alias. A failed probe is a normal result.
    pub async fn test_connection(&self) -> Result<ConnectionReport, AppError> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let (host_alias, provider) = self.machine.lock().probe_target()?;

        let report = self
            .ssh
            .test_connection(&host_alias, &provider.matcher())
            .await;
        if !report.success {
            warn!(%host_alias, "connection test did not confirm authentication");
        }
        self.machine.lock().connection_tested(&report);
        Ok(report)
    }

    pub fn back(&self) -> Result<WizardStep, AppError> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        Ok(self.machine.lock().back())
    }

    /// Answers one protocol command; failures become unsuccessful responses
    pub async fn handle(&self, command: WizardCommand) -> WizardResponse {
        match command {
            WizardCommand::GenerateKey(data) => {
                WizardResponse::KeyGenerated(Outcome::from_result(self.handle_generate(data).await))
            }
            WizardCommand::UpdateSshConfig(data) => {
                WizardResponse::ConfigUpdated(Outcome::from_result(self.handle_update(data)))
            }
            WizardCommand::TestConnection(data) => {
                WizardResponse::ConnectionTested(match self.handle_test(data).await {
                    Ok(report) if report.success => Outcome::ok(ProbeOutput {
                        output: report.output,
                    }),
                    Ok(report) => Outcome {
                        success: false,
                        data: Some(ProbeOutput {
                            output: report.output,
                        }),
                        error: Some("could not confirm authentication with the host".to_string()),
                    },
                    Err(err) => Outcome::err(err.to_string()),
                })
            }
            WizardCommand::CopyPublicKey(data) => {
                WizardResponse::PublicKeyCopied(Outcome::from_result(self.handle_copy(data).await))
            }
        }
    }

    async fn handle_generate(&self, data: GenerateKeyData) -> Result<KeyPair, AppError> {
        self.submit_identity(IdentityInfo {
            identity_name: data.identity_name,
            email: data.email,
            provider: data.provider,
            host_name: data.host_name,
        })?;
        match self.generate_key().await {
            Err(AppError::KeyExists(_)) if data.reuse_existing => self.reuse_existing_key().await,
            result => result,
        }
    }

    fn handle_update(&self, data: UpdateConfigData) -> Result<ConfigUpdate, AppError> {
        {
            let session = self.snapshot().session;
            ensure_matches(
                "identityName",
                data.identity_name.as_deref(),
                session.identity_name.as_deref(),
            )?;
            ensure_matches(
                "provider",
                data.provider.map(|provider| provider.as_str()),
                session.provider.map(|provider| provider.as_str()),
            )?;
            ensure_matches("keyName", data.key_name.as_deref(), session.key_name.as_deref())?;
        }
        if let Some(host_name) = data.host_name.as_deref() {
            self.set_host_name(host_name)?;
        }
        self.update_ssh_config()
    }

    async fn handle_test(&self, data: TestConnectionData) -> Result<ConnectionReport, AppError> {
        let session = self.snapshot().session;
        ensure_matches(
            "hostAlias",
            data.host_alias.as_deref(),
            session.host_alias.as_deref(),
        )?;
        self.test_connection().await
    }

    async fn handle_copy(&self, data: CopyPublicKeyData) -> Result<NoData, AppError> {
        self.copy_public_key(data.public_key).await?;
        Ok(NoData {})
    }
}
