//! agentdeck CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or configuration
//! - 3: Backend unreachable
//! - 4: Backend rejected the request

use std::process::ExitCode;

use clap::Parser;
use deck_chat::ChatError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod render;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const DISCONNECTED: u8 = 3;
    pub const BACKEND_ERROR: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.global.verbose {
        "deck_cli=debug,deck_chat=debug,warn"
    } else if cli.global.quiet {
        "warn"
    } else {
        "deck_cli=info,deck_chat=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let result = match cli.command {
        Commands::Chat(args) => commands::chat::execute(&cli.global, args).await,
        Commands::Send(args) => commands::send::execute(&cli.global, args).await,
        Commands::History(args) => commands::history::execute(&cli.global, args).await,
        Commands::Probe(args) => commands::probe::execute(&cli.global, args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

/// Map an error to its exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<ChatError>() {
        Some(ChatError::InvalidConfig(_)) | Some(ChatError::EmptyMessage) => ExitCodes::INVALID_ARGS,
        Some(ChatError::Disconnected) | Some(ChatError::Network(_)) => ExitCodes::DISCONNECTED,
        Some(ChatError::InitializationFailed(_))
        | Some(ChatError::SendFailed(_))
        | Some(ChatError::Http { .. }) => ExitCodes::BACKEND_ERROR,
        _ => ExitCodes::GENERAL_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let err = anyhow::Error::new(ChatError::Disconnected);
        assert_eq!(categorize_error(&err), ExitCodes::DISCONNECTED);

        let err = anyhow::Error::new(ChatError::InvalidConfig("bad".to_string()));
        assert_eq!(categorize_error(&err), ExitCodes::INVALID_ARGS);

        let err = anyhow::Error::new(ChatError::SendFailed("nope".to_string()));
        assert_eq!(categorize_error(&err), ExitCodes::BACKEND_ERROR);

        let err = anyhow::anyhow!("something else");
        assert_eq!(categorize_error(&err), ExitCodes::GENERAL_ERROR);
    }
}
