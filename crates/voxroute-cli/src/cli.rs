//! Command-line interface definition using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Build version string with git hash and build date.
fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const BUILD_DATE: &str = env!("BUILD_DATE");

    // Format: "0.1.0 (abc1234, 2026-10-19)"
    static VERSION_STRING: std::sync::OnceLock<String> = std::sync::OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} ({}, {})", VERSION, GIT_HASH, BUILD_DATE))
}

/// Voxroute - voice command routing console
#[derive(Parser, Debug)]
#[command(name = "voxroute")]
#[command(author, version = version_string(), about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to state directory
    #[arg(short, long, env = "VOXROUTE_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Ignore configured backends and answer with the local echo backend
    #[arg(long)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Type transcripts as if spoken (default)
    Console,

    /// Print the durable audit log
    Replay {
        /// Only events of this type (e.g. routing_decided, blocked)
        #[arg(short = 't', long = "type")]
        event_type: Option<String>,

        /// Only events for this command id
        #[arg(short, long)]
        command: Option<String>,

        /// Only events at or after this RFC 3339 time
        #[arg(long)]
        since: Option<String>,

        /// Only terminal outcomes
        #[arg(long)]
        terminal: bool,

        /// Print raw JSON lines
        #[arg(long)]
        json: bool,
    },

    /// List registered agents
    Agents,
}

impl Cli {
    /// Returns the state directory path, using default if not specified.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(voxroute_core::state_dir)
    }

    /// Audit directory under an explicit state dir, or the configured default.
    pub fn audit_dir(&self) -> PathBuf {
        match &self.state_dir {
            Some(dir) => dir.join("audit"),
            None => voxroute_core::audit_dir(),
        }
    }

    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["voxroute"]);
        assert!(cli.command.is_none());
        assert!(!cli.offline);
    }

    #[test]
    fn test_cli_parse_replay() {
        let cli = Cli::parse_from([
            "voxroute",
            "replay",
            "--type",
            "blocked",
            "--command",
            "cmd-1",
            "--terminal",
        ]);
        assert_eq!(
            cli.command,
            Some(Commands::Replay {
                event_type: Some("blocked".into()),
                command: Some("cmd-1".into()),
                since: None,
                terminal: true,
                json: false,
            })
        );
    }

    #[test]
    fn test_audit_dir_follows_state_dir() {
        let cli = Cli::parse_from(["voxroute", "--state-dir", "/tmp/vox", "agents"]);
        assert_eq!(cli.state_dir(), PathBuf::from("/tmp/vox"));
        assert_eq!(cli.audit_dir(), PathBuf::from("/tmp/vox/audit"));
        assert_eq!(cli.command, Some(Commands::Agents));
    }

    #[test]
    fn test_cli_verbose() {
        let cli = Cli::parse_from(["voxroute", "-vv", "--offline"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.offline);
        assert_eq!(cli.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_cli_help() {
        Cli::command().debug_assert();
    }
}
