//! User configuration for conform.
//!
//! Read once at startup from `$XDG_CONFIG_HOME/conform/config.toml`. Every
//! key is optional and config errors are soft failures: a missing file or a
//! parse error falls back to the defaults below. Keys conform does not know
//! are ignored.

use std::path::PathBuf;

use serde::Deserialize;

/// Settings from `config.toml`. Command-line flags override them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Theme name: `"dark"` or `"catppuccin-mocha"`.
    pub theme: String,
    /// SQLite database file.
    pub database: PathBuf,
    /// Id of the user the session runs as.
    pub user: String,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Directory exported reports are written to.
    pub export_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "catppuccin-mocha".to_owned(),
            database: PathBuf::from(".conform/reviews.db"),
            user: "user-1".to_owned(),
            log_level: "info".to_owned(),
            export_dir: PathBuf::from(".conform/exports"),
        }
    }
}

/// Returns the path to the conform config file.
///
/// Prefers `$XDG_CONFIG_HOME/conform/config.toml`; falls back to
/// `~/.config/conform/config.toml` when the env var is absent.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("conform").join("config.toml")
}

/// Parses config text, returning the defaults and a warning on bad input.
pub fn parse(raw: &str) -> (Config, Option<String>) {
    match toml::from_str(raw) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e.to_string())),
    }
}

/// Loads the config file. Never fails.
///
/// The returned warning, if any, is logged once tracing is up; logging is
/// configured from this same file so it cannot be reported here.
pub fn load() -> (Config, Option<String>) {
    let path = config_path();
    match std::fs::read_to_string(&path) {
        Ok(raw) => {
            let (config, err) = parse(&raw);
            (config, err.map(|e| format!("config parse error in {}: {e}", path.display())))
        }
        Err(_) => (Config::default(), None),
    }
}
