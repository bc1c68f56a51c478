//! Configuration system for taskbot.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskbot/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.
//!
//! The bot settings ([`BotArgs`], [`BotConfigFile`], [`BotConfig`]) are
//! shared with the gateway, which flattens them into its own CLI and file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveTime;
use serde::de::DeserializeOwned;

use crate::assistant::ConfiguredAssistant;
use crate::bot::{BotSettings, DEFAULT_ASSISTANT_TIMEOUT, TaskBot};
use crate::clock::{Calendar, SystemClock};
use crate::confirm::{ConfirmationRegistry, DEFAULT_CONFIRMATION_WINDOW};
use crate::reminder::ReminderSchedule;
use crate::sink::{ConfiguredSink, LogSink, WebhookSink};
use crate::store::{AnyStore, StorageConfig, StoreError};
use crate::tasks::{DEFAULT_STORE_TIMEOUT, TaskService};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// A value parsed but makes no sense.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Setting name as written in the file.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Which task store to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Volatile in-process store.
    Memory,
    /// SQLite file.
    Sqlite,
}

/// Bot sections of a config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct BotConfigFile {
    /// `[storage]`
    pub storage: StorageFileConfig,
    /// `[assistant]`
    pub assistant: AssistantFileConfig,
    /// `[bot]`
    pub bot: BotFileConfig,
    /// `[reminder]`
    pub reminder: ReminderFileConfig,
}

/// `[storage]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct StorageFileConfig {
    backend: Option<StorageBackend>,
    path: Option<PathBuf>,
}

/// `[assistant]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct AssistantFileConfig {
    api_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

/// `[bot]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct BotFileConfig {
    store_timeout_secs: Option<u64>,
    confirmation_window_secs: Option<u64>,
    utc_offset_minutes: Option<i32>,
}

/// `[reminder]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ReminderFileConfig {
    enabled: Option<bool>,
    time: Option<String>,
    webhook_url: Option<String>,
}

/// Top-level file for the console binary: the bot sections plus `[console]`.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConsoleConfigFile {
    #[serde(flatten)]
    bot: BotConfigFile,
    console: ConsoleFileConfig,
}

/// `[console]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConsoleFileConfig {
    owner: Option<String>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// Bot options shared by every binary.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct BotArgs {
    /// Task store backend.
    #[arg(long, value_enum, env = "TASKBOT_STORAGE")]
    pub storage: Option<StorageBackend>,

    /// SQLite database path (default: `<data dir>/taskbot/tasks.db`).
    #[arg(long, env = "TASKBOT_DB")]
    pub db_path: Option<PathBuf>,

    /// Assistant API endpoint.
    #[arg(long, env = "TASKBOT_ASSISTANT_URL")]
    pub assistant_url: Option<String>,

    /// Assistant API key.
    #[arg(long, env = "TASKBOT_ASSISTANT_KEY", hide_env_values = true)]
    pub assistant_key: Option<String>,

    /// Assistant model name.
    #[arg(long, env = "TASKBOT_ASSISTANT_MODEL")]
    pub assistant_model: Option<String>,

    /// Minutes east of UTC that define "today" (e.g. 540 for UTC+9).
    #[arg(long, env = "TASKBOT_UTC_OFFSET_MINUTES", allow_hyphen_values = true)]
    pub utc_offset_minutes: Option<i32>,
}

/// CLI arguments for the console binary.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Chat-command task list on the terminal")]
pub struct CliArgs {
    /// Path to config file (default: `~/.config/taskbot/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Whose task list to work on.
    #[arg(long, env = "TASKBOT_OWNER")]
    pub owner: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKBOT_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskbot.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(flatten)]
    pub bot: BotArgs,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Resolved `[reminder]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderConfig {
    /// Whether the daily loop runs at all.
    pub enabled: bool,
    /// Local wall time the reminder fires at.
    pub time: NaiveTime,
    /// Where reminders are POSTed; `None` logs them instead.
    pub webhook_url: Option<url::Url>,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            time: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN),
            webhook_url: None,
        }
    }
}

/// Fully resolved bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Which store to open.
    pub storage: StorageConfig,
    /// Assistant endpoint.
    pub assistant_url: Option<String>,
    /// Assistant API key.
    pub assistant_key: Option<String>,
    /// Assistant model name.
    pub assistant_model: String,
    /// Bound on one assistant call.
    pub assistant_timeout: Duration,
    /// Bound on one storage call.
    pub store_timeout: Duration,
    /// How long `reset all` stays confirmable.
    pub confirmation_window: Duration,
    /// Day boundaries.
    pub calendar: Calendar,
    /// Daily reminder.
    pub reminder: ReminderConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::Memory,
            assistant_url: None,
            assistant_key: None,
            assistant_model: DEFAULT_MODEL.to_string(),
            assistant_timeout: DEFAULT_ASSISTANT_TIMEOUT,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            confirmation_window: DEFAULT_CONFIRMATION_WINDOW,
            calendar: Calendar::utc(),
            reminder: ReminderConfig::default(),
        }
    }
}

impl BotConfig {
    /// Resolve a `BotConfig` from CLI args and parsed config file sections.
    ///
    /// Priority: CLI > file > default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an out-of-range UTC offset, a
    /// malformed reminder time or webhook URL, or a zero timeout.
    pub fn resolve(cli: &BotArgs, file: &BotConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let backend = cli
            .storage
            .or(file.storage.backend)
            .unwrap_or(StorageBackend::Memory);
        let storage = match backend {
            StorageBackend::Memory => StorageConfig::Memory,
            StorageBackend::Sqlite => StorageConfig::Sqlite(
                cli.db_path
                    .clone()
                    .or_else(|| file.storage.path.clone())
                    .unwrap_or_else(default_db_path),
            ),
        };

        let calendar = match cli.utc_offset_minutes.or(file.bot.utc_offset_minutes) {
            None => defaults.calendar,
            Some(minutes) => Calendar::from_offset_minutes(minutes).ok_or_else(|| {
                ConfigError::Invalid {
                    field: "utc_offset_minutes",
                    reason: format!("{minutes} is not within ±24 hours"),
                }
            })?,
        };

        let reminder = ReminderConfig {
            enabled: file.reminder.enabled.unwrap_or(defaults.reminder.enabled),
            time: match file.reminder.time.as_deref() {
                None => defaults.reminder.time,
                Some(raw) => parse_time_of_day(raw)?,
            },
            webhook_url: file
                .reminder
                .webhook_url
                .as_deref()
                .map(|raw| {
                    url::Url::parse(raw).map_err(|e| ConfigError::Invalid {
                        field: "reminder.webhook_url",
                        reason: e.to_string(),
                    })
                })
                .transpose()?,
        };

        Ok(Self {
            storage,
            assistant_url: cli
                .assistant_url
                .clone()
                .or_else(|| file.assistant.api_url.clone()),
            assistant_key: cli
                .assistant_key
                .clone()
                .or_else(|| file.assistant.api_key.clone()),
            assistant_model: cli
                .assistant_model
                .clone()
                .or_else(|| file.assistant.model.clone())
                .unwrap_or(defaults.assistant_model),
            assistant_timeout: positive_secs(
                "assistant.timeout_secs",
                file.assistant.timeout_secs,
                defaults.assistant_timeout,
            )?,
            store_timeout: positive_secs(
                "bot.store_timeout_secs",
                file.bot.store_timeout_secs,
                defaults.store_timeout,
            )?,
            confirmation_window: positive_secs(
                "bot.confirmation_window_secs",
                file.bot.confirmation_window_secs,
                defaults.confirmation_window,
            )?,
            calendar,
            reminder,
        })
    }

    /// Tunables for [`TaskBot`].
    #[must_use]
    pub const fn settings(&self) -> BotSettings {
        BotSettings {
            confirmation_window: self.confirmation_window,
            assistant_timeout: self.assistant_timeout,
        }
    }

    /// The assistant these settings describe.
    #[must_use]
    pub fn assistant(&self) -> ConfiguredAssistant {
        ConfiguredAssistant::from_parts(
            self.assistant_url.clone(),
            self.assistant_key.clone(),
            self.assistant_model.clone(),
        )
    }

    /// The daily reminder schedule.
    #[must_use]
    pub const fn reminder_schedule(&self) -> ReminderSchedule {
        ReminderSchedule::daily_at(self.reminder.time, self.calendar)
    }

    /// Where reminders are delivered.
    #[must_use]
    pub fn reminder_sink(&self) -> ConfiguredSink {
        self.reminder.webhook_url.clone().map_or(
            ConfiguredSink::Log(LogSink),
            |url| ConfiguredSink::Webhook(WebhookSink::new(url)),
        )
    }

    /// Opens the store and wires a bot running on the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be opened.
    pub fn build_bot(&self) -> Result<TaskBot<AnyStore, ConfiguredAssistant>, StoreError> {
        let store = AnyStore::open(&self.storage)?;
        let clock = Arc::new(SystemClock);
        let tasks = TaskService::new(store, clock.clone(), self.calendar)
            .with_store_timeout(self.store_timeout);
        Ok(TaskBot::new(
            tasks,
            ConfirmationRegistry::new(clock),
            self.assistant(),
            self.settings(),
        ))
    }
}

/// Fully resolved console configuration.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Whose task list the console edits.
    pub owner: String,
    /// Bot settings.
    pub bot: BotConfig,
}

impl ConsoleConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or a setting is invalid.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file: ConsoleConfigFile = load_config_file(cli.config.as_deref(), "taskbot")?;
        Self::resolve(cli, &file)
    }

    fn resolve(cli: &CliArgs, file: &ConsoleConfigFile) -> Result<Self, ConfigError> {
        Ok(Self {
            owner: cli
                .owner
                .clone()
                .or_else(|| file.console.owner.clone())
                .unwrap_or_else(default_owner),
            bot: BotConfig::resolve(&cli.bot, &file.bot)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, `<config dir>/<app_name>/config.toml` is
/// tried and a missing file is treated as empty config.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed.
pub fn load_config_file<T>(explicit_path: Option<&Path>, app_name: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(T::default());
        };
        config_dir.join(app_name).join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from("taskbot.db"),
        |dir| dir.join("taskbot").join("tasks.db"),
    )
}

fn default_owner() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "me".to_string())
}

fn parse_time_of_day(raw: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|e| ConfigError::Invalid {
            field: "reminder.time",
            reason: format!("{raw:?}: {e}"),
        })
}

fn positive_secs(
    field: &'static str,
    secs: Option<u64>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match secs {
        None => Ok(default),
        Some(0) => Err(ConfigError::Invalid {
            field,
            reason: "must be greater than zero".to_string(),
        }),
        Some(s) => Ok(Duration::from_secs(s)),
    }
}
