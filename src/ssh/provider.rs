use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::AppError, ssh::probe::PhraseMatcher};

/// Remote Git hosting provider targeted by the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Github,
    Gitlab,
    Bitbucket,
    Other,
}

/// Human-readable steps for registering a public key with a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInstructions {
    pub title: String,
    pub settings_url: Option<&'static str>,
    pub steps: Vec<String>,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Github,
        Provider::Gitlab,
        Provider::Bitbucket,
        Provider::Other,
    ];

    /// Identifier used in host aliases and on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Github => "github",
            Provider::Gitlab => "gitlab",
            Provider::Bitbucket => "bitbucket",
            Provider::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Provider::Github => "GitHub",
            Provider::Gitlab => "GitLab",
            Provider::Bitbucket => "Bitbucket",
            Provider::Other => "Other",
        }
    }

    /// Real host name behind the alias; `Other` has none and needs one from the user
    pub fn default_host(self) -> Option<&'static str> {
        match self {
            Provider::Github => Some("github.com"),
            Provider::Gitlab => Some("gitlab.com"),
            Provider::Bitbucket => Some("bitbucket.org"),
            Provider::Other => None,
        }
    }

    /// Page where the provider accepts new SSH public keys
    pub fn settings_url(self) -> Option<&'static str> {
        match self {
            Provider::Github => Some("https://github.com/settings/keys"),
            Provider::Gitlab => Some("https://gitlab.com/-/user_settings/ssh_keys"),
            Provider::Bitbucket => Some("https://bitbucket.org/account/settings/ssh-keys/"),
            Provider::Other => None,
        }
    }

    pub fn instructions(self) -> ProviderInstructions {
        let steps: Vec<&str> = match self {
            Provider::Github => vec![
                "Open https://github.com/settings/keys",
                "Click \"New SSH key\"",
                "Give the key a title and keep the type \"Authentication Key\"",
                "Paste the public key and click \"Add SSH key\"",
            ],
            Provider::Gitlab => vec![
                "Open https://gitlab.com/-/user_settings/ssh_keys",
                "Click \"Add new key\"",
                "Paste the public key and give it a title",
                "Optionally set an expiration date, then click \"Add key\"",
            ],
            Provider::Bitbucket => vec![
                "Open https://bitbucket.org/account/settings/ssh-keys/",
                "Click \"Add key\"",
                "Give the key a label and paste the public key",
                "Click \"Add key\"",
            ],
            Provider::Other => vec![
                "Open the SSH key settings of your Git hosting service",
                "Add a new SSH key",
                "Paste the public key and save",
            ],
        };

        ProviderInstructions {
            title: format!("Add your public key to {}", self.label()),
            settings_url: self.settings_url(),
            steps: steps.into_iter().map(str::to_string).collect(),
        }
    }

    /// Output matcher recognising a successful authentication for this provider
    pub fn matcher(self) -> PhraseMatcher {
        PhraseMatcher::for_provider(self)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Provider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|provider| provider.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::Validation(format!("unknown provider '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("GitHub".parse::<Provider>().unwrap(), Provider::Github);
        assert!("sourceforge".parse::<Provider>().is_err());
    }

    #[test]
    fn other_provider_has_generic_instructions() {
        let instructions = Provider::Other.instructions();
        assert!(instructions.settings_url.is_none());
        assert!(Provider::Other.default_host().is_none());
        assert!(!instructions.steps.is_empty());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Provider::Bitbucket).unwrap(), "\"bitbucket\"");
    }
}
