use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// CLI arguments parser using `clap`
#[derive(Parser, Debug)]
#[command(
    name = "gitid",
    version,
    about = "Switch between Git identities and set up SSH keys for them"
)]
pub struct Cli {
    /// Options shared by all subcommands
    #[command(flatten)]
    pub global: GlobalArgs,
    /// Subcommand chosen to execute; the interactive menu runs without one
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Paths, timeouts and verbosity
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Settings file holding the identity list
    #[arg(long, env = "GITID_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,
    /// Directory for SSH keys and the SSH client config
    #[arg(long, env = "GITID_SSH_DIR", global = true)]
    pub ssh_dir: Option<PathBuf>,
    /// Workspace whose Git identity is read or switched (defaults to the current directory)
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,
    /// Seconds to wait for the SSH connection test
    #[arg(long, env = "GITID_PROBE_TIMEOUT", default_value_t = 10, global = true)]
    pub probe_timeout: u64,
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Switches the workspace Git identity to a stored identity
    Switch {
        /// Name of identity to switch to
        name: String,
    },
    /// Adds a new identity
    Add {
        /// Unique name for the identity
        name: String,
        /// Git username
        username: String,
        /// Git email
        email: String,
    },
    /// Deletes an identity
    Delete {
        /// Name of identity to delete
        name: String,
    },
    /// Displays the workspace Git identity
    Current,
    /// Displays all stored identities
    List,
    /// Generates an SSH key, registers a host alias and tests the connection
    Wizard {
        /// Speak the JSON line protocol on stdin/stdout instead of prompting
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_options_follow_subcommands() {
        let cli = Cli::parse_from(["gitid", "switch", "Work", "--dir", "/tmp/repo", "-vv"]);
        assert_eq!(cli.global.dir, Some(PathBuf::from("/tmp/repo")));
        assert_eq!(cli.global.verbose, 2);
        assert!(matches!(cli.command, Some(Commands::Switch { name }) if name == "Work"));
    }
}
