use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_CONFIG_FILE: &str = "AppConfig.json";
const APP_DIR_NAME: &str = "backup-desk";

/// Process-level settings, taken from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct DeskConfig {
    pub config_dir: PathBuf,
    /// Optional TOML file with session settings and display strings
    pub session_config: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl DeskConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            config_dir: std::env::var("BACKUP_DESK_CONFIG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_config_dir()),
            session_config: std::env::var("BACKUP_DESK_SESSION_CONFIG")
                .ok()
                .map(PathBuf::from),
            log_level: std::env::var("LOG_LEVEL").ok(),
        }
    }
}

/// Per-user config directory of the platform (`%APPDATA%`, `~/.config`,
/// `~/Library/Application Support`).
fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(APP_DIR_NAME))
}

/// User preferences, stored as `AppConfig.json` in the config directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub language: String,
    pub always_on_top: bool,
    pub restore_previous_state: bool,
    pub tray_mode: bool,
    /// Diff size, relative to its base, above which a new generation starts
    pub auto_base_generation_threshold: f64,
    pub tray_backup_mode: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: "en".into(),
            always_on_top: false,
            restore_previous_state: true,
            tray_mode: false,
            auto_base_generation_threshold: 0.8,
            tray_backup_mode: "diff".into(),
        }
    }
}

impl AppConfig {
    pub fn path(config_dir: &Path) -> PathBuf {
        config_dir.join(APP_CONFIG_FILE)
    }

    /// Read the preferences file, writing the defaults first if there is none.
    pub fn load_or_create(config_dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(config_dir)?;
        let path = Self::path(config_dir);
        if !path.exists() {
            let config = Self::default();
            config.save(config_dir)?;
            return Ok(config);
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, config_dir: &Path) -> anyhow::Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(Self::path(config_dir), data)?;
        Ok(())
    }
}
