use serde::Serialize;
use tracing::debug;

use crate::{
    error::AppError,
    identity::Identity,
    ssh::{
        config::{key_file_name, slugify, ConfigUpdate, HostEntryRequest},
        gateway::KeyPair,
        probe::ConnectionReport,
        provider::{Provider, ProviderInstructions},
    },
};

/// Wizard steps in the order the user walks through them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WizardStep {
    #[default]
    IdentityInfo,
    GenerateKey,
    ProviderInstructions,
    ConfigureAndTest,
}

impl WizardStep {
    pub const COUNT: usize = 4;

    /// One-based position shown to the user
    pub fn number(self) -> usize {
        self as usize + 1
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::IdentityInfo => "identity info",
            WizardStep::GenerateKey => "generate key",
            WizardStep::ProviderInstructions => "add key to provider",
            WizardStep::ConfigureAndTest => "configure & test",
        }
    }

    fn previous(self) -> Self {
        match self {
            WizardStep::IdentityInfo | WizardStep::GenerateKey => WizardStep::IdentityInfo,
            WizardStep::ProviderInstructions => WizardStep::GenerateKey,
            WizardStep::ConfigureAndTest => WizardStep::ProviderInstructions,
        }
    }
}

/// Input collected by the first step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityInfo {
    pub identity_name: String,
    pub email: String,
    pub provider: Provider,
    /// Real host name, needed only when the provider has no default host
    pub host_name: Option<String>,
}

/// Fields accumulated as the steps complete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSession {
    pub identity_name: Option<String>,
    pub email: Option<String>,
    pub provider: Option<Provider>,
    pub host_name: Option<String>,
    pub key_name: Option<String>,
    pub public_key: Option<String>,
    pub host_alias: Option<String>,
    pub clone_example: Option<String>,
    pub connection_verified: Option<bool>,
}

/// What the current step looks like, for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardSnapshot {
    pub step: WizardStep,
    pub session: WizardSession,
}

/// How the key step obtains its key pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Generate { identity_name: String, email: String },
    /// The session already holds the key for this identity
    Reuse(KeyPair),
}

/// Four-step onboarding flow. Holds no I/O; callers perform the side effects
/// and report their results back.
#[derive(Debug, Default)]
pub struct WizardMachine {
    step: WizardStep,
    session: WizardSession,
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .ok_or_else(|| AppError::StepOutOfOrder(format!("{field} is not set yet")))
}

impl WizardMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            step: self.step,
            session: self.session.clone(),
        }
    }

    fn move_to(&mut self, step: WizardStep) {
        if self.step != step {
            debug!(from = ?self.step, to = ?step, "wizard step changed");
            self.step = step;
        }
    }

    /// Step 1. Stays on the first step and fails when name or email is empty.
    ///
    /// `stored` is the saved identity list; a name whose key file would clash
    /// with a different stored identity is rejected.
    pub fn submit_identity(&mut self, info: IdentityInfo, stored: &[Identity]) -> Result<(), AppError> {
        let identity_name = info.identity_name.trim().to_string();
        let email = info.email.trim().to_string();
        let host_name = info
            .host_name
            .map(|host| host.trim().to_string())
            .filter(|host| !host.is_empty());

        if identity_name.is_empty() || email.is_empty() {
            self.move_to(WizardStep::IdentityInfo);
            return Err(AppError::Validation(
                "identity name and email are required".to_string(),
            ));
        }
        if slugify(&identity_name, '_').is_empty() {
            self.move_to(WizardStep::IdentityInfo);
            return Err(AppError::Validation(
                "identity name needs at least one letter or digit".to_string(),
            ));
        }

        let key_name = key_file_name(&identity_name);
        if let Some(other) = stored
            .iter()
            .find(|identity| identity.name != identity_name && key_file_name(&identity.name) == key_name)
        {
            self.move_to(WizardStep::IdentityInfo);
            return Err(AppError::Validation(format!(
                "'{}' would share the key file {} with identity '{}'",
                identity_name, key_name, other.name
            )));
        }

        let unchanged = self.session.identity_name.as_deref() == Some(identity_name.as_str())
            && self.session.email.as_deref() == Some(email.as_str())
            && self.session.provider == Some(info.provider)
            && self.session.host_name == host_name;

        if !unchanged {
            self.session = WizardSession {
                identity_name: Some(identity_name),
                email: Some(email),
                provider: Some(info.provider),
                host_name,
                ..WizardSession::default()
            };
        }
        self.move_to(WizardStep::GenerateKey);
        Ok(())
    }

    /// Step 2 precondition: the key pair to produce or reuse
    pub fn key_action(&self) -> Result<KeyAction, AppError> {
        let identity_name = required(&self.session.identity_name, "identity name")?;
        let email = required(&self.session.email, "email")?;

        if let (Some(key_name), Some(public_key)) = (&self.session.key_name, &self.session.public_key) {
            if *key_name == key_file_name(identity_name) {
                return Ok(KeyAction::Reuse(KeyPair {
                    key_name: key_name.clone(),
                    public_key: public_key.clone(),
                }));
            }
        }

        Ok(KeyAction::Generate {
            identity_name: identity_name.to_string(),
            email: email.to_string(),
        })
    }

    /// Key file name the current identity maps to
    pub fn expected_key_name(&self) -> Result<String, AppError> {
        required(&self.session.identity_name, "identity name").map(key_file_name)
    }

    /// Step 2 result
    pub fn key_ready(&mut self, pair: KeyPair) {
        self.session.key_name = Some(pair.key_name);
        self.session.public_key = Some(pair.public_key);
        self.move_to(self.step.max(WizardStep::ProviderInstructions));
    }

    /// Step 3 display content
    pub fn instructions(&self) -> Result<ProviderInstructions, AppError> {
        self.session
            .provider
            .map(Provider::instructions)
            .ok_or_else(|| AppError::StepOutOfOrder("provider is not set yet".to_string()))
    }

    pub fn public_key(&self) -> Result<&str, AppError> {
        required(&self.session.public_key, "public key")
    }

    /// Leaves the instructions step; copying the key is not required
    pub fn continue_to_configure(&mut self) -> Result<(), AppError> {
        required(&self.session.public_key, "public key")?;
        self.move_to(WizardStep::ConfigureAndTest);
        Ok(())
    }

    /// Step 4 precondition: the host block to write
    pub fn config_request(&self) -> Result<HostEntryRequest, AppError> {
        let identity_name = required(&self.session.identity_name, "identity name")?;
        let key_name = required(&self.session.key_name, "key name")?;
        required(&self.session.public_key, "public key")?;
        let provider = self
            .session
            .provider
            .ok_or_else(|| AppError::StepOutOfOrder("provider is not set yet".to_string()))?;

        let host_name = match (provider.default_host(), &self.session.host_name) {
            (_, Some(host)) => host.clone(),
            (Some(default), None) => default.to_string(),
            (None, None) => {
                return Err(AppError::Validation(format!(
                    "a host name is required for provider '{}'",
                    provider.as_str()
                )));
            }
        };

        Ok(HostEntryRequest {
            identity_name: identity_name.to_string(),
            provider,
            key_name: key_name.to_string(),
            host_name,
        })
    }

    /// Overrides the real host name; used for providers without a default host
    pub fn set_host_name(&mut self, host_name: &str) {
        let host_name = host_name.trim();
        if !host_name.is_empty() {
            self.session.host_name = Some(host_name.to_string());
        }
    }

    /// Step 4 config result
    pub fn config_written(&mut self, update: &ConfigUpdate) {
        self.session.host_alias = Some(update.host_alias.clone());
        self.session.clone_example = Some(update.clone_example.clone());
        self.session.connection_verified = None;
        self.move_to(WizardStep::ConfigureAndTest);
    }

    /// Step 4 probe precondition: alias and provider to test against
    pub fn probe_target(&self) -> Result<(String, Provider), AppError> {
        let host_alias = required(&self.session.host_alias, "host alias")?;
        let provider = self.session.provider.unwrap_or(Provider::Other);
        Ok((host_alias.to_string(), provider))
    }

    /// Step 4 probe result; does not gate completion
    pub fn connection_tested(&mut self, report: &ConnectionReport) {
        self.session.connection_verified = Some(report.success);
    }

    pub fn back(&mut self) -> WizardStep {
        self.move_to(self.step.previous());
        self.step
    }

    /// Whether the SSH config has been written for this session
    pub fn is_configured(&self) -> bool {
        self.session.host_alias.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, email: &str) -> IdentityInfo {
        IdentityInfo {
            identity_name: name.to_string(),
            email: email.to_string(),
            provider: Provider::Github,
            host_name: None,
        }
    }

    fn pair(key_name: &str) -> KeyPair {
        KeyPair {
            key_name: key_name.to_string(),
            public_key: "ssh-rsa AAAA a@b.com".to_string(),
        }
    }

    #[test]
    fn empty_fields_keep_the_first_step() {
        let mut machine = WizardMachine::new();
        assert!(matches!(
            machine.submit_identity(info("Work", " "), &[]),
            Err(AppError::Validation(_))
        ));
        assert_eq!(machine.step(), WizardStep::IdentityInfo);
        assert!(machine.session().identity_name.is_none());
    }

    #[test]
    fn steps_advance_in_order() {
        let mut machine = WizardMachine::new();
        machine.submit_identity(info("Work", "a@b.com"), &[]).unwrap();
        assert_eq!(machine.step(), WizardStep::GenerateKey);

        let action = machine.key_action().unwrap();
        assert_eq!(
            action,
            KeyAction::Generate {
                identity_name: "Work".to_string(),
                email: "a@b.com".to_string()
            }
        );

        machine.key_ready(pair("id_rsa_work"));
        assert_eq!(machine.step(), WizardStep::ProviderInstructions);

        machine.continue_to_configure().unwrap();
        assert_eq!(machine.step(), WizardStep::ConfigureAndTest);

        let request = machine.config_request().unwrap();
        assert_eq!(request.host_name, "github.com");
        assert_eq!(request.key_name, "id_rsa_work");
    }

    #[test]
    fn config_before_key_is_out_of_order() {
        let mut machine = WizardMachine::new();
        machine.submit_identity(info("Work", "a@b.com"), &[]).unwrap();
        assert!(matches!(machine.config_request(), Err(AppError::StepOutOfOrder(_))));
        assert!(matches!(machine.continue_to_configure(), Err(AppError::StepOutOfOrder(_))));
        assert!(matches!(machine.probe_target(), Err(AppError::StepOutOfOrder(_))));
    }

    #[test]
    fn generated_key_is_reused_after_going_back() {
        let mut machine = WizardMachine::new();
        machine.submit_identity(info("Work", "a@b.com"), &[]).unwrap();
        machine.key_ready(pair("id_rsa_work"));

        assert_eq!(machine.back(), WizardStep::GenerateKey);
        assert_eq!(machine.key_action().unwrap(), KeyAction::Reuse(pair("id_rsa_work")));
    }

    #[test]
    fn changing_identity_resets_later_fields() {
        let mut machine = WizardMachine::new();
        machine.submit_identity(info("Work", "a@b.com"), &[]).unwrap();
        machine.key_ready(pair("id_rsa_work"));

        machine.submit_identity(info("Home", "a@b.com"), &[]).unwrap();
        assert!(machine.session().key_name.is_none());
        assert_eq!(machine.step(), WizardStep::GenerateKey);
    }

    #[test]
    fn key_name_clash_with_other_identity_is_rejected() {
        let stored = vec![Identity::new("work account", "jdoe", "jdoe@corp.example")];
        let mut machine = WizardMachine::new();

        let result = machine.submit_identity(info("Work  Account", "a@b.com"), &stored);
        assert!(matches!(result, Err(AppError::Validation(_))));

        let same = vec![Identity::new("Work Account", "jdoe", "jdoe@corp.example")];
        assert!(machine.submit_identity(info("Work Account", "a@b.com"), &same).is_ok());
    }

    #[test]
    fn other_provider_needs_a_host() {
        let mut machine = WizardMachine::new();
        let mut other = info("Work", "a@b.com");
        other.provider = Provider::Other;
        machine.submit_identity(other, &[]).unwrap();
        machine.key_ready(pair("id_rsa_work"));

        assert!(matches!(machine.config_request(), Err(AppError::Validation(_))));
        machine.set_host_name("git.corp.example");
        assert_eq!(machine.config_request().unwrap().host_name, "git.corp.example");
    }

    #[test]
    fn failed_probe_is_recorded_without_blocking() {
        let mut machine = WizardMachine::new();
        machine.submit_identity(info("Work", "a@b.com"), &[]).unwrap();
        machine.key_ready(pair("id_rsa_work"));
        machine.config_written(&ConfigUpdate {
            host_alias: "github-work".to_string(),
            clone_example: "git clone git@github-work:username/repo.git".to_string(),
            written: true,
        });

        machine.connection_tested(&ConnectionReport::failed("timed out"));
        assert_eq!(machine.session().connection_verified, Some(false));
        assert!(machine.is_configured());
        assert_eq!(machine.step(), WizardStep::ConfigureAndTest);
    }
}
