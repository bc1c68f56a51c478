//! Configuration system for the taskbot gateway.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskbot-gateway/config.toml`)
//! 4. Compiled defaults
//!
//! The file holds the bot sections (`[storage]`, `[assistant]`, `[bot]`,
//! `[reminder]`) plus a gateway-only `[server]` section.

use std::path::PathBuf;

use taskbot::config::{BotArgs, BotConfig, BotConfigFile, ConfigError, load_config_file};

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure for the gateway.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct GatewayConfigFile {
    #[serde(flatten)]
    bot: BotConfigFile,
    server: ServerFileConfig,
}

/// `[server]` section of the gateway config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    bind_addr: Option<String>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the gateway.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "taskbot HTTP gateway")]
pub struct GatewayCliArgs {
    /// Address to bind the HTTP server to.
    #[arg(short, long, env = "TASKBOT_BIND")]
    pub bind: Option<String>,

    /// Path to config file (default: `~/.config/taskbot-gateway/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKBOT_LOG")]
    pub log_level: String,

    #[command(flatten)]
    pub bot: BotArgs,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address to bind the server to (e.g., `0.0.0.0:8080`).
    pub bind_addr: String,
    /// Log level filter string.
    pub log_level: String,
    /// Bot settings.
    pub bot: BotConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
            bot: BotConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path is tried and missing file
    /// is treated as empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or if a bot setting is invalid.
    pub fn load(cli: &GatewayCliArgs) -> Result<Self, ConfigError> {
        let file: GatewayConfigFile = load_config_file(cli.config.as_deref(), "taskbot-gateway")?;
        Self::resolve(cli, &file)
    }

    /// Resolve a `GatewayConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    fn resolve(cli: &GatewayCliArgs, file: &GatewayConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            bind_addr: cli
                .bind
                .clone()
                .or_else(|| file.server.bind_addr.clone())
                .unwrap_or(defaults.bind_addr),
            log_level: cli.log_level.clone(),
            bot: BotConfig::resolve(&cli.bot, &file.bot)?,
        })
    }
}
