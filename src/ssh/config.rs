//! Host-alias blocks for the SSH client configuration.
//!
//! The configuration file is only ever appended to. Content that already
//! contains `Host <alias>` anywhere is treated as configured and left alone.

use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::info;

use crate::{error::AppError, ssh::provider::Provider};

/// Remote user for every Git hosting provider
const GIT_USER: &str = "git";

/// Lower-cases `name` and joins its words with `separator`.
///
/// Anything other than ASCII letters, digits, `.`, `-` and `_` splits words,
/// so the result is safe in file names and host aliases.
pub fn slugify(name: &str, separator: char) -> String {
    name.split(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(&separator.to_string())
}

/// Key file name for an identity: `id_rsa_<slug>`
pub fn key_file_name(identity_name: &str) -> String {
    format!("id_rsa_{}", slugify(identity_name, '_'))
}

/// Host alias for an identity: `<provider>-<slug>`
pub fn host_alias(provider: Provider, identity_name: &str) -> String {
    format!("{}-{}", provider.as_str(), slugify(identity_name, '-'))
}

pub fn clone_example(host_alias: &str) -> String {
    format!("git clone git@{host_alias}:username/repo.git")
}

/// Whether `config` already carries the `Host <alias>` marker.
///
/// Plain text match: a commented-out declaration or a longer alias sharing
/// the prefix also counts, so the file is never touched in those cases.
pub fn declares_host(config: &str, alias: &str) -> bool {
    config.contains(&format!("Host {alias}"))
}

/// Text to insert before a new block so it is separated by one blank line
fn separator_for(existing: &str) -> &'static str {
    if existing.is_empty() || existing.ends_with("\n\n") {
        ""
    } else if existing.ends_with('\n') {
        "\n"
    } else {
        "\n\n"
    }
}

/// One `Host` block written by the wizard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    pub identity_name: String,
    pub provider: Provider,
    pub host_alias: String,
    pub host_name: String,
    pub identity_file: String,
}

impl HostEntry {
    pub fn render(&self) -> String {
        format!(
            "# {} ({})\n\
             Host {}\n  \
             HostName {}\n  \
             User {}\n  \
             IdentityFile {}\n  \
             IdentitiesOnly yes\n\n",
            self.identity_name,
            self.provider.label(),
            self.host_alias,
            self.host_name,
            GIT_USER,
            self.identity_file,
        )
    }
}

/// Input for [`SshConfigSynthesizer::upsert_entry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntryRequest {
    pub identity_name: String,
    pub provider: Provider,
    pub key_name: String,
    pub host_name: String,
}

/// Result of a successful upsert
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    pub host_alias: String,
    pub clone_example: String,
    /// `false` when the alias was already configured and nothing was written
    pub written: bool,
}

/// Builds host-alias blocks and appends them to the SSH client configuration
#[derive(Debug, Clone)]
pub struct SshConfigSynthesizer {
    config_path: PathBuf,
    key_dir_display: String,
}

impl SshConfigSynthesizer {
    /// # Arguments
    /// * `config_path` - SSH client configuration file
    /// * `key_dir_display` - Key directory as written in `IdentityFile` lines, e.g. `~/.ssh`
    pub fn new(config_path: impl Into<PathBuf>, key_dir_display: impl Into<String>) -> Self {
        Self {
            config_path: config_path.into(),
            key_dir_display: key_dir_display.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn entry_for(&self, request: &HostEntryRequest) -> HostEntry {
        HostEntry {
            identity_name: request.identity_name.clone(),
            provider: request.provider,
            host_alias: host_alias(request.provider, &request.identity_name),
            host_name: request.host_name.clone(),
            identity_file: format!(
                "{}/{}",
                self.key_dir_display.trim_end_matches('/'),
                request.key_name
            ),
        }
    }

    /// Appends the host block for `request` unless its alias is already declared
    pub fn upsert_entry(&self, request: &HostEntryRequest) -> Result<ConfigUpdate, AppError> {
        for (field, value) in [
            ("identity name", &request.identity_name),
            ("key name", &request.key_name),
            ("host name", &request.host_name),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{field} cannot be empty")));
            }
        }

        let entry = self.entry_for(request);
        let existing = self.read_existing()?;
        let update = ConfigUpdate {
            clone_example: clone_example(&entry.host_alias),
            host_alias: entry.host_alias.clone(),
            written: false,
        };

        if declares_host(&existing, &entry.host_alias) {
            info!(alias = %entry.host_alias, "host alias already configured");
            return Ok(update);
        }

        let block = format!("{}{}", separator_for(&existing), entry.render());
        self.append(&block)?;
        info!(alias = %entry.host_alias, path = %self.config_path.display(), "host alias added");

        Ok(ConfigUpdate {
            written: true,
            ..update
        })
    }

    fn read_existing(&self) -> Result<String, AppError> {
        match fs::read_to_string(&self.config_path) {
            Ok(content) => Ok(content),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(self.write_error(source)),
        }
    }

    fn append(&self, block: &str) -> Result<(), AppError> {
        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            // applies to newly created files only
            options.mode(0o600);
        }

        let mut file = options
            .open(&self.config_path)
            .map_err(|source| self.write_error(source))?;
        file.write_all(block.as_bytes())
            .map_err(|source| self.write_error(source))
    }

    fn write_error(&self, source: std::io::Error) -> AppError {
        AppError::ConfigWrite {
            path: self.config_path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str) -> HostEntryRequest {
        HostEntryRequest {
            identity_name: name.to_string(),
            provider: Provider::Github,
            key_name: key_file_name(name),
            host_name: "github.com".to_string(),
        }
    }

    fn synthesizer(dir: &Path) -> SshConfigSynthesizer {
        SshConfigSynthesizer::new(dir.join("config"), "~/.ssh")
    }

    #[test]
    fn alias_and_key_names_are_slugged() {
        assert_eq!(host_alias(Provider::Github, "Work Account"), "github-work-account");
        assert_eq!(host_alias(Provider::Gitlab, "  Side   Project "), "gitlab-side-project");
        assert_eq!(key_file_name("Work Account"), "id_rsa_work_account");
        assert_eq!(key_file_name("Work"), "id_rsa_work");
    }

    #[test]
    fn slug_drops_path_separators() {
        assert_eq!(slugify("../Home/Dir", '_'), ".._home_dir");
        assert_eq!(slugify("!!!", '-'), "");
    }

    #[test]
    fn writes_block_into_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let synth = synthesizer(dir.path());

        let update = synth.upsert_entry(&request("Work")).unwrap();
        assert_eq!(update.host_alias, "github-work");
        assert_eq!(update.clone_example, "git clone git@github-work:username/repo.git");
        assert!(update.written);

        let written = fs::read_to_string(synth.config_path()).unwrap();
        assert_eq!(
            written,
            "# Work (GitHub)\nHost github-work\n  HostName github.com\n  User git\n  \
             IdentityFile ~/.ssh/id_rsa_work\n  IdentitiesOnly yes\n\n"
        );
    }

    #[test]
    fn text_appended_after_block_stays_separated() {
        let dir = tempfile::tempdir().unwrap();
        let synth = synthesizer(dir.path());
        synth.upsert_entry(&request("Work")).unwrap();
        synth.upsert_entry(&request("Home")).unwrap();

        let written = fs::read_to_string(synth.config_path()).unwrap();
        assert!(written.contains("IdentitiesOnly yes\n\n# Home (GitHub)\n"));
        assert!(written.ends_with("IdentitiesOnly yes\n\n"));
    }

    #[test]
    fn repeated_upsert_writes_one_block() {
        let dir = tempfile::tempdir().unwrap();
        let synth = synthesizer(dir.path());

        synth.upsert_entry(&request("Work")).unwrap();
        let second = synth.upsert_entry(&request("Work")).unwrap();
        assert!(!second.written);

        let written = fs::read_to_string(synth.config_path()).unwrap();
        assert_eq!(written.matches("Host github-work\n").count(), 1);
    }

    #[test]
    fn existing_alias_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let synth = synthesizer(dir.path());
        let original = "Host github-work\n    HostName github.com\n    IdentityFile ~/.ssh/other";
        fs::write(synth.config_path(), original).unwrap();

        let update = synth.upsert_entry(&request("Work")).unwrap();
        assert_eq!(update.host_alias, "github-work");
        assert!(!update.written);
        assert_eq!(fs::read(synth.config_path()).unwrap(), original.as_bytes());
    }

    #[test]
    fn marker_anywhere_in_the_file_counts_as_configured() {
        assert!(declares_host("# Host github-work (disabled)\n", "github-work"));
        assert!(declares_host("Host github-work.corp\n  HostName x\n", "github-work"));
        assert!(!declares_host("Host  github-work\n", "github-work"));
        assert!(!declares_host("Host github-home\n", "github-work"));
    }

    #[test]
    fn commented_marker_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let synth = synthesizer(dir.path());
        let original = "# Host github-work (disabled)\n";
        fs::write(synth.config_path(), original).unwrap();

        let update = synth.upsert_entry(&request("Work")).unwrap();
        assert!(!update.written);
        assert_eq!(update.host_alias, "github-work");
        assert_eq!(fs::read_to_string(synth.config_path()).unwrap(), original);
    }

    #[test]
    fn longer_alias_with_same_prefix_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let synth = synthesizer(dir.path());
        let original = "Host github-work.corp\n  HostName x\n";
        fs::write(synth.config_path(), original).unwrap();

        assert!(!synth.upsert_entry(&request("Work")).unwrap().written);
        assert_eq!(fs::read_to_string(synth.config_path()).unwrap(), original);
    }

    #[test]
    fn new_block_is_separated_from_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let synth = synthesizer(dir.path());
        fs::write(synth.config_path(), "Host personal\n  HostName example.com").unwrap();

        synth.upsert_entry(&request("Work")).unwrap();
        let written = fs::read_to_string(synth.config_path()).unwrap();
        assert!(written.starts_with("Host personal\n  HostName example.com\n\n# Work (GitHub)\n"));
    }

    #[test]
    fn empty_fields_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request("Work");
        req.host_name = " ".to_string();
        assert!(matches!(
            synthesizer(dir.path()).upsert_entry(&req),
            Err(AppError::Validation(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn new_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let synth = synthesizer(dir.path());
        synth.upsert_entry(&request("Work")).unwrap();

        let mode = fs::metadata(synth.config_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn unwritable_location_is_a_config_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let synth = SshConfigSynthesizer::new(dir.path().join("missing").join("config"), "~/.ssh");
        assert!(matches!(
            synth.upsert_entry(&request("Work")),
            Err(AppError::ConfigWrite { .. })
        ));
    }
}
