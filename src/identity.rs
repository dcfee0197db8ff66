use serde::{Deserialize, Serialize};

/// Represents a Git identity stored in the settings file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Unique user-facing label
    pub name: String,
    /// Git username (user.name)
    pub username: String,
    /// Git email address (user.email)
    pub email: String,
    /// Creation timestamp in milliseconds, stable for the identity's lifetime
    pub id: i64,
}

impl Identity {
    pub fn new(name: &str, username: &str, email: &str) -> Self {
        Self {
            name: name.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            id: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Whether the Git author fields equal this identity's
    pub fn matches(&self, username: &str, email: &str) -> bool {
        self.username == username && self.email == email
    }
}
