//! JSON messages exchanged between a wizard front end and the controller.
//!
//! Commands arrive as `{"command": "<name>", "data": {...}}`. Every response
//! carries its `command` name and a `success` flag, plus either the result
//! fields or an `error` message.

use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    ssh::{config::ConfigUpdate, gateway::KeyPair, provider::Provider},
};

fn default_provider() -> Provider {
    Provider::Github
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateKeyData {
    pub identity_name: String,
    pub email: String,
    #[serde(default = "default_provider")]
    pub provider: Provider,
    #[serde(default)]
    pub host_name: Option<String>,
    /// Adopt the key already on disk instead of failing with "key exists"
    #[serde(default)]
    pub reuse_existing: bool,
}

/// Fields are optional; when present they must agree with the session
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateConfigData {
    pub identity_name: Option<String>,
    pub provider: Option<Provider>,
    pub key_name: Option<String>,
    pub host_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestConnectionData {
    pub host_alias: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CopyPublicKeyData {
    /// Key text to copy; defaults to the session's public key
    pub public_key: Option<String>,
}

/// Requests from the front end
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", content = "data", rename_all = "camelCase")]
pub enum WizardCommand {
    GenerateKey(GenerateKeyData),
    #[serde(rename = "updateSSHConfig")]
    UpdateSshConfig(UpdateConfigData),
    TestConnection(TestConnectionData),
    CopyPublicKey(CopyPublicKeyData),
}

/// Result fields of a connection test
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeOutput {
    pub output: String,
}

/// Placeholder for responses without result fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoData {}

/// `success` flag with either data fields or an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Outcome<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn from_result(result: Result<T, AppError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::err(err.to_string()),
        }
    }
}

/// Replies to the front end, one per command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum WizardResponse {
    KeyGenerated(Outcome<KeyPair>),
    ConnectionTested(Outcome<ProbeOutput>),
    ConfigUpdated(Outcome<ConfigUpdate>),
    PublicKeyCopied(Outcome<NoData>),
    /// The incoming line was not a valid command
    InvalidMessage(Outcome<NoData>),
}

impl WizardResponse {
    pub fn is_success(&self) -> bool {
        match self {
            WizardResponse::KeyGenerated(outcome) => outcome.success,
            WizardResponse::ConnectionTested(outcome) => outcome.success,
            WizardResponse::ConfigUpdated(outcome) => outcome.success,
            WizardResponse::PublicKeyCopied(outcome) => outcome.success,
            WizardResponse::InvalidMessage(outcome) => outcome.success,
        }
    }
}
