//! Configuration for the `RoomChat` console host.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/roomchat/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use roomchat_proto::room::{RoomId, UserId};

use crate::room_view::RoomViewConfig;
use crate::typing::TypingConfig;

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

    /// A typing window of zero would never let a notification through.
    #[error("typing window must be greater than zero")]
    ZeroTypingWindow,
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    typing: TypingFileConfig,
    room: RoomFileConfig,
}

/// `[typing]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct TypingFileConfig {
    window_ms: Option<u64>,
    remote_ttl_ms: Option<u64>,
}

/// `[room]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct RoomFileConfig {
    room_id: Option<String>,
    user_id: Option<String>,
    notice_buffer: Option<usize>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- Room --
    /// Room the console host opens.
    pub room_id: String,
    /// Local user; its server part completes bare invitee names.
    pub user_id: String,
    /// Capacity of the dispatcher's notice channel.
    pub notice_buffer: usize,

    // -- Typing --
    /// Local debounce window.
    pub typing_window: Duration,
    /// TTL advertised with typing-start notifications.
    pub typing_remote_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let typing = TypingConfig::default();
        Self {
            room_id: "!lobby:localhost".to_string(),
            user_id: "@me:localhost".to_string(),
            notice_buffer: 16,
            typing_window: typing.window,
            typing_remote_ttl: typing.remote_ttl,
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// CLI args and env vars are parsed via `clap`. If `--config` is given
    /// and the file does not exist, returns an error. If no `--config` is
    /// given, the default path (`~/.config/roomchat/config.toml`) is tried
    /// and silently ignored if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed,
    /// or if the resolved typing window is zero.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        let config = Self::resolve(cli, &file);
        if config.typing_window.is_zero() {
            return Err(ConfigError::ZeroTypingWindow);
        }
        Ok(config)
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default. The remote TTL follows the resolved
    /// window (twice its length) unless set explicitly.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        let typing_window = cli
            .typing_window_ms
            .or(file.typing.window_ms)
            .map_or(defaults.typing_window, Duration::from_millis);
        let typing_remote_ttl = file.typing.remote_ttl_ms.map_or_else(
            || TypingConfig::with_window(typing_window).remote_ttl,
            Duration::from_millis,
        );

        Self {
            room_id: cli
                .room_id
                .clone()
                .or_else(|| file.room.room_id.clone())
                .unwrap_or(defaults.room_id),
            user_id: cli
                .user_id
                .clone()
                .or_else(|| file.room.user_id.clone())
                .unwrap_or(defaults.user_id),
            notice_buffer: file
                .room
                .notice_buffer
                .unwrap_or(defaults.notice_buffer),
            typing_window,
            typing_remote_ttl,
        }
    }

    /// Typing parameters for the debouncer.
    #[must_use]
    pub const fn typing_config(&self) -> TypingConfig {
        TypingConfig {
            window: self.typing_window,
            remote_ttl: self.typing_remote_ttl,
        }
    }

    /// Settings for a [`RoomView`](crate::room_view::RoomView).
    #[must_use]
    pub fn room_view_config(&self) -> RoomViewConfig {
        RoomViewConfig {
            user_id: UserId::new(&self.user_id),
            typing: self.typing_config(),
            notice_buffer: self.notice_buffer,
        }
    }

    /// The room to open on startup.
    #[must_use]
    pub fn room_id(&self) -> RoomId {
        RoomId::new(&self.room_id)
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Console host for the RoomChat interaction core")]
pub struct CliArgs {
    /// Room to open.
    #[arg(long, env = "ROOMCHAT_ROOM")]
    pub room_id: Option<String>,

    /// Local user identity.
    #[arg(long, env = "ROOMCHAT_USER")]
    pub user_id: Option<String>,

    /// Typing debounce window in milliseconds.
    #[arg(long)]
    pub typing_window_ms: Option<u64>,

    /// Path to config file (default: `~/.config/roomchat/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "ROOMCHAT_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/roomchat.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            // No config dir available, use defaults.
            return Ok(ConfigFile::default());
        };
        config_dir.join("roomchat").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
