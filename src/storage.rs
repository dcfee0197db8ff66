use std::{
    fs,
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{error::AppError, identity::Identity};

/// Settings key holding the identity list
pub const IDENTITIES_KEY: &str = "identities";

/// Persisted identity list, read and replaced wholesale
pub trait IdentityRepository: Send + Sync {
    /// Loads all stored identities in insertion order
    fn load(&self) -> Result<Vec<Identity>, AppError>;

    /// Replaces the stored list with `identities`
    fn replace_all(&self, identities: &[Identity]) -> Result<(), AppError>;
}

/// Identity list stored under `identities` in a JSON settings file
pub struct JsonSettingsRepository {
    path: PathBuf,
}

impl JsonSettingsRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole settings object, empty if the file is missing or blank
    fn read_settings(&self) -> Result<Map<String, Value>, AppError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let file_contents = fs::read_to_string(&self.path)?;
        if file_contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&file_contents)? {
            Value::Object(settings) => Ok(settings),
            _ => Err(AppError::Validation(format!(
                "settings file {} is not a JSON object",
                self.path.display()
            ))),
        }
    }
}

impl IdentityRepository for JsonSettingsRepository {
    fn load(&self) -> Result<Vec<Identity>, AppError> {
        let mut settings = self.read_settings()?;
        match settings.remove(IDENTITIES_KEY) {
            Some(identities) => Ok(serde_json::from_value(identities)?),
            None => Ok(Vec::new()),
        }
    }

    fn replace_all(&self, identities: &[Identity]) -> Result<(), AppError> {
        let mut settings = self.read_settings()?;
        settings.insert(IDENTITIES_KEY.to_string(), serde_json::to_value(identities)?);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json: String = serde_json::to_string_pretty(&Value::Object(settings))?;
        fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), count = identities.len(), "saved identities");
        Ok(())
    }
}

/// Identity list held in memory, used when no settings file is wanted
#[derive(Default)]
pub struct MemoryRepository {
    identities: Mutex<Vec<Identity>>,
}

impl MemoryRepository {
    pub fn with_identities(identities: Vec<Identity>) -> Self {
        Self {
            identities: Mutex::new(identities),
        }
    }
}

impl IdentityRepository for MemoryRepository {
    fn load(&self) -> Result<Vec<Identity>, AppError> {
        Ok(self.identities.lock().clone())
    }

    fn replace_all(&self, identities: &[Identity]) -> Result<(), AppError> {
        *self.identities.lock() = identities.to_vec();
        Ok(())
    }
}

/// Checks if any identities exist in storage
///
/// # Arguments
/// * `identities` - Identities to check
pub fn check_if_identities_exist(identities: &[Identity]) -> Result<(), AppError> {
    if identities.is_empty() {
        return Err(AppError::Validation("no identities found".to_string()));
    }
    Ok(())
}
