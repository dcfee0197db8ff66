//! Interpretation of SSH probe output.
//!
//! Git hosting services refuse shell access and exit non-zero even after a
//! successful authentication, so the exit code says nothing. Success is read
//! from the greeting text instead.

use serde::Serialize;

use crate::ssh::provider::Provider;

/// Greeting fragment printed by GitHub after key authentication
pub const AUTH_SUCCESS_PHRASE: &str = "successfully authenticated";

/// Greeting fragment printed by GitLab after key authentication
const GITLAB_WELCOME_PHRASE: &str = "welcome to gitlab";

/// Greeting fragment printed by Bitbucket after key authentication
const BITBUCKET_AUTH_PHRASE: &str = "authenticated via ssh key";

/// Decides from probe output whether authentication succeeded
pub trait AuthSuccessMatcher: Send + Sync {
    fn is_authenticated(&self, output: &str) -> bool;
}

/// Case-insensitive match on any of a list of phrases
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    phrases: Vec<String>,
}

impl PhraseMatcher {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|phrase| phrase.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn for_provider(provider: Provider) -> Self {
        match provider {
            Provider::Gitlab => Self::new([AUTH_SUCCESS_PHRASE, GITLAB_WELCOME_PHRASE]),
            Provider::Bitbucket => Self::new([AUTH_SUCCESS_PHRASE, BITBUCKET_AUTH_PHRASE]),
            _ => Self::default(),
        }
    }
}

impl Default for PhraseMatcher {
    fn default() -> Self {
        Self::new([AUTH_SUCCESS_PHRASE])
    }
}

impl AuthSuccessMatcher for PhraseMatcher {
    fn is_authenticated(&self, output: &str) -> bool {
        let output = output.to_lowercase();
        self.phrases.iter().any(|phrase| output.contains(phrase.as_str()))
    }
}

/// Outcome of a connection test; failure here is a result, not an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionReport {
    pub success: bool,
    pub output: String,
}

impl ConnectionReport {
    pub fn evaluate(output: &str, matcher: &dyn AuthSuccessMatcher) -> Self {
        Self {
            success: matcher.is_authenticated(output),
            output: output.to_string(),
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}
