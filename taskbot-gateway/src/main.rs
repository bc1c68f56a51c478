//! taskbot gateway -- HTTP front end and daily reminder service.
//!
//! An axum server that takes chat messages forwarded by a messaging
//! platform, executes `!` commands against each sender's task list, and
//! answers with the reply text. A background loop pushes the daily
//! reminder to every owner.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:8080 with an in-memory store
//! cargo run --bin taskbot-gateway
//!
//! # Durable store on a custom address
//! cargo run --bin taskbot-gateway -- --bind 127.0.0.1:9100 --storage sqlite
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use taskbot::reminder;
use taskbot_gateway::config::{GatewayCliArgs, GatewayConfig};
use taskbot_gateway::server::{self, GatewayState};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = GatewayCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match GatewayConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting taskbot gateway");

    let bot = match config.bot.build_bot() {
        Ok(bot) => Arc::new(bot),
        Err(e) => {
            tracing::error!(error = %e, "failed to open task store");
            return ExitCode::FAILURE;
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let reminders = if config.bot.reminder.enabled {
        Some(tokio::spawn(reminder::run(
            Arc::clone(&bot),
            config.bot.reminder_sink(),
            config.bot.reminder_schedule(),
            shutdown_rx.clone(),
        )))
    } else {
        tracing::info!("daily reminder disabled");
        None
    };

    let mut server_shutdown = shutdown_rx;
    let shutdown = async move {
        let _ = server_shutdown.wait_for(|stop| *stop).await;
    };

    let state = Arc::new(GatewayState::new(bot));
    let handle = match server::start_server_with_state(&config.bind_addr, state, shutdown).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "gateway listening");
            handle
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start gateway");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
    let _ = shutdown_tx.send(true);

    if let Err(e) = handle.await {
        tracing::error!(error = %e, "gateway server task failed");
    }
    if let Some(reminders) = reminders {
        if let Err(e) = reminders.await {
            tracing::error!(error = %e, "reminder task failed");
        }
    }
    ExitCode::SUCCESS
}
