//! `taskbot`: console front end.
//!
//! Reads commands line by line from stdin for a single owner and prints
//! the bot's replies. Configuration via CLI flags, environment variables,
//! or config file (`~/.config/taskbot/config.toml`).
//!
//! ```bash
//! # In-memory list for the current user
//! cargo run --bin taskbot
//!
//! # Durable list with the assistant enabled
//! cargo run --bin taskbot -- --storage sqlite \
//!     --assistant-url https://api.anthropic.com/v1/messages --assistant-key "$KEY"
//! ```

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_appender::non_blocking::WorkerGuard;

use taskbot::config::{CliArgs, ConsoleConfig};
use taskbot_proto::task::OwnerId;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    let config = match ConsoleConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Logs go to a file so they don't interleave with replies on stdout.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    let bot = match config.bot.build_bot() {
        Ok(bot) => bot,
        Err(e) => {
            eprintln!("Error opening task store: {e}");
            return ExitCode::FAILURE;
        }
    };
    let owner = OwnerId::new(config.owner);
    tracing::info!(owner = %owner, "taskbot console starting");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "failed to read stdin");
                break;
            }
        };
        if let Some(reply) = bot.handle(&owner, line.trim()).await {
            let out = format!("{reply}\n\n");
            if let Err(e) = stdout.write_all(out.as_bytes()).await {
                tracing::error!(error = %e, "failed to write reply");
                break;
            }
            let _ = stdout.flush().await;
        }
    }

    tracing::info!("taskbot console exiting");
    ExitCode::SUCCESS
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskbot.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}
