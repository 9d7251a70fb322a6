use config::{Config, ConfigError, Environment, File};
use directories_next::ProjectDirs;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_DIALOG_URL: &str =
    "https://alliebfaro.github.io/SmartAlert/sendConfirmDialog.html";

// Where and how large the confirmation surface opens.
// Height and width are percentages of the screen.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DialogConfig {
    pub url: String,
    pub height: u8,
    pub width: u8,
    pub prompt_before_open: bool,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DIALOG_URL.to_string(),
            height: 60,
            width: 45,
            prompt_before_open: false,
        }
    }
}

// Bounded retry for pushing the payload into a freshly opened surface
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HandshakeConfig {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay_ms: 250,
        }
    }
}

impl HandshakeConfig {
    /// Attempts actually made; a zero in the config still means one try.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

// Top-level configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub dialog: DialogConfig,
    pub handshake: HandshakeConfig,
}

impl AppConfig {
    /// Loads configuration from files and environment variables.
    ///
    /// Layers, later ones win:
    /// 1. built-in defaults
    /// 2. `config.toml` in the platform config directory for `send-guard`
    /// 3. `send_guard.toml` in the working directory
    /// 4. Environment variables prefixed with `SEND_GUARD__` (e.g. `SEND_GUARD__HANDSHAKE__MAX_ATTEMPTS`)
    ///
    /// Every file is optional.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(dirs) = ProjectDirs::from("", "", "send-guard") {
            let user_file = dirs.config_dir().join("config.toml");
            builder = builder.add_source(File::from(user_file).required(false));
        }

        let config = builder
            .add_source(File::with_name("send_guard").required(false))
            // `__` separates struct levels: SEND_GUARD__DIALOG__URL
            .add_source(
                Environment::with_prefix("SEND_GUARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Builds configuration from an in-memory TOML document layered over the defaults.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
