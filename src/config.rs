use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::launch::terminal::TerminalSpec;
use crate::utils::path_utils::expand_tilde_path_buf;

pub const DEFAULT_CLIENT_COMMAND: &str = "flatpak run org.vinegarhq.Sober";
pub const DEFAULT_CLIENT_APP_ID: &str = "org.vinegarhq.Sober";
pub const DEFAULT_TERMINALS: &str = "konsole,gnome-terminal,xfce4-terminal,alacritty,xterm";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub log_level: String,
    pub client_command: String,
    pub client_app_id: String,
    pub client_process_name: String,
    pub terminals: Vec<TerminalSpec>,
    pub deep_link_scheme: String,
    pub sweep_interval: Duration,
    pub crash_helper: String,
    pub crash_window_title: String,
    pub audit_log_file: PathBuf,
    pub audit_log_max_size_bytes: u64,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let data_dir = match std::env::var("LAUNCHER_DATA_DIR").ok().filter(|s| !s.is_empty()) {
            Some(dir_str) => expand_tilde_path_buf(&dir_str),
            None => std::env::current_dir().context("Failed to resolve current directory")?,
        };

        let log_level = env_or("LOG_LEVEL", "info");
        let client_command = env_or("CLIENT_COMMAND", DEFAULT_CLIENT_COMMAND);
        let client_app_id = env_or("CLIENT_APP_ID", DEFAULT_CLIENT_APP_ID);
        let client_process_name = env_or("CLIENT_PROCESS_NAME", "sober");
        let terminals = TerminalSpec::parse_list(&env_or("TERMINALS", DEFAULT_TERMINALS));
        let deep_link_scheme = env_or("DEEP_LINK_SCHEME", "roblox");

        let sweep_interval_ms = env_or("SWEEP_INTERVAL_MS", "2000")
            .parse::<u64>()
            .context("Invalid SWEEP_INTERVAL_MS")?;
        if sweep_interval_ms == 0 {
            anyhow::bail!("SWEEP_INTERVAL_MS must be greater than zero");
        }

        let crash_helper = env_or("CRASH_HELPER", "wmctrl");
        let crash_window_title = env_or("CRASH_WINDOW_TITLE", "Sober crashed");

        let audit_log_max_size_bytes = env_or("AUDIT_LOG_MAX_SIZE_MB", "10")
            .parse::<u64>()
            .map(|mb| mb * 1024 * 1024) // Convert MB to Bytes
            .context("Invalid AUDIT_LOG_MAX_SIZE_MB")?;

        Ok(Config {
            audit_log_file: data_dir.join("intents.log"),
            data_dir,
            log_level,
            client_command,
            client_app_id,
            client_process_name,
            terminals,
            deep_link_scheme,
            sweep_interval: Duration::from_millis(sweep_interval_ms),
            crash_helper,
            crash_window_title,
            audit_log_max_size_bytes,
        })
    }

    /// Defaults rooted at `data_dir`, without consulting the environment.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Config {
            audit_log_file: data_dir.join("intents.log"),
            data_dir,
            log_level: "info".to_string(),
            client_command: DEFAULT_CLIENT_COMMAND.to_string(),
            client_app_id: DEFAULT_CLIENT_APP_ID.to_string(),
            client_process_name: "sober".to_string(),
            terminals: TerminalSpec::parse_list(DEFAULT_TERMINALS),
            deep_link_scheme: "roblox".to_string(),
            sweep_interval: Duration::from_millis(2000),
            crash_helper: "wmctrl".to_string(),
            crash_window_title: "Sober crashed".to_string(),
            audit_log_max_size_bytes: 10 * 1024 * 1024,
        }
    }
}
