//! CLI command definitions.
//!
//! Each subcommand talks to the orchestration backend through `deck_chat`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use deck_chat::{ChatBackend, ClientSettings, HttpBackend, MockBackend};

pub mod chat;
pub mod history;
pub mod probe;
pub mod send;

/// agentdeck - chat with agents on the orchestration backend
#[derive(Parser)]
#[command(name = "deck")]
#[command(version, about = "agentdeck - chat with agents on the orchestration backend")]
#[command(long_about = r#"
agentdeck talks to a local multi-agent orchestration backend: it creates chat
sessions (direct LLM, independent agent or palette agent), sends messages and
loads session history.

COMMANDS:
  chat     → Interactive chat session
  send     → Send one message to an existing session
  history  → Print the history of a session
  probe    → Check whether the backend is reachable

SETTINGS:
  .agentdeck/settings.json in the workspace, then AGENTDECK_BASE_URL,
  AGENTDECK_TIMEOUT_SECS and AGENTDECK_PROBE_INTERVAL_SECS, then flags.

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or configuration
  3 - Backend unreachable
  4 - Backend rejected the request
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct GlobalOpts {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Backend URL (overrides settings file and environment)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Workspace holding .agentdeck/settings.json (defaults to current directory)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Use an in-memory backend instead of HTTP
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session
    Chat(chat::ChatArgs),

    /// Send a single message to an existing session
    Send(send::SendArgs),

    /// Print the message history of a session
    History(history::HistoryArgs),

    /// Check backend reachability
    Probe(probe::ProbeArgs),
}

/// Resolved settings plus the backend they point at
pub struct Connection {
    pub settings: ClientSettings,
    pub backend: Arc<dyn ChatBackend>,
}

impl GlobalOpts {
    /// Resolve settings: workspace file, environment, then flags
    pub fn settings(&self) -> Result<ClientSettings> {
        let workspace = match &self.workspace {
            Some(path) => path.clone(),
            None => std::env::current_dir()?,
        };
        let mut settings = ClientSettings::load(&workspace)?;
        if let Some(url) = &self.base_url {
            settings.base_url = url.clone();
            settings.validate()?;
        }
        Ok(settings)
    }

    pub fn connect(&self) -> Result<Connection> {
        let settings = self.settings()?;
        let backend: Arc<dyn ChatBackend> = if self.offline {
            debug!("Using in-memory backend");
            Arc::new(MockBackend::new())
        } else {
            debug!("Using backend at {}", settings.base_url);
            Arc::new(HttpBackend::new(&settings)?)
        };
        Ok(Connection { settings, backend })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(workspace: PathBuf, base_url: Option<&str>) -> GlobalOpts {
        GlobalOpts {
            verbose: false,
            quiet: false,
            base_url: base_url.map(String::from),
            workspace: Some(workspace),
            offline: false,
        }
    }

    #[test]
    fn test_flag_overrides_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = ClientSettings::settings_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"baseUrl": "http://from-file:8000"}"#).unwrap();

        let settings = opts(dir.path().to_path_buf(), None).settings().unwrap();
        assert_eq!(settings.base_url, "http://from-file:8000");

        let settings = opts(dir.path().to_path_buf(), Some("http://from-flag:9000"))
            .settings()
            .unwrap();
        assert_eq!(settings.base_url, "http://from-flag:9000");
    }

    #[test]
    fn test_invalid_flag_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(opts(dir.path().to_path_buf(), Some("not a url")).settings().is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["deck", "--offline", "history", "s-1"]).unwrap();
        assert!(cli.global.offline);
        assert!(matches!(cli.command, Commands::History(_)));
    }
}
