use chrono::NaiveTime;
use curfew_core::{
    parse_clock, AppPolicy, CategoryMap, TimeWindow, DEFAULT_ALERT_CAPACITY, DEFAULT_ALERT_MINUTES,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for the curfew daemon
///
/// Only `apps`, `shutdown` and `categories` are needed; the remaining
/// sections fall back to their defaults when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Daily shutdown time as HH:MM; empty disables the shutdown policy
    #[serde(default)]
    pub shutdown: String,

    /// Allowed hours per app or category
    #[serde(default)]
    pub apps: Vec<AppPolicy>,

    /// Category name -> member process names
    #[serde(default)]
    pub categories: CategoryMap,

    #[serde(default)]
    pub alerts: AlertConfig,

    #[serde(default)]
    pub logging: LogConfig,
}

/// Alert delivery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Minutes before shutdown at which to warn (default: 10, 3, 1)
    pub shutdown_minutes: Vec<u32>,

    /// Alert buffer size; alerts beyond it are dropped (default: 64)
    pub channel_capacity: usize,

    /// Show alerts as desktop notifications (default: false)
    /// Needs the `desktop-notify` feature
    pub desktop_notifications: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log directory path (default: ./logs)
    pub log_dir: PathBuf,

    /// Daily-rotated log file name (default: curfew.log)
    pub file_name: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            shutdown_minutes: DEFAULT_ALERT_MINUTES.to_vec(),
            channel_capacity: DEFAULT_ALERT_CAPACITY,
            desktop_notifications: false,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("./logs"),
            file_name: "curfew.log".to_string(),
        }
    }
}

/// On-disk format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Format::Toml,
            _ => Format::Json,
        }
    }
}

impl Config {
    /// Sample configuration written by `generate-config`
    pub fn example() -> Self {
        let mut categories = CategoryMap::new();
        categories.insert(
            "browsers".to_string(),
            vec!["firefox".to_string(), "chromium".to_string()],
        );
        categories.insert("games".to_string(), vec!["steam".to_string()]);

        Self {
            shutdown: "23:30".to_string(),
            apps: vec![
                AppPolicy::new("browsers", "08:00", "22:00"),
                AppPolicy::new("games", "18:00", "21:00"),
            ],
            categories,
            alerts: AlertConfig::default(),
            logging: LogConfig::default(),
        }
    }

    /// Load configuration from a JSON file, or TOML when the extension is `.toml`
    ///
    /// # Example
    /// ```no_run
    /// use curfew_daemon::config::Config;
    ///
    /// let config = Config::load_from_file("./config.json").unwrap();
    /// println!("Policies: {}", config.apps.len());
    /// ```
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = match Format::of(path) {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };
        Ok(config)
    }

    /// Save configuration, pretty-printed in the format matching `path`
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let content = match Format::of(path) {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// Malformed app windows are not errors here; see [`Config::warnings`].
    pub fn validate(&self) -> Result<(), String> {
        if let Some(index) = self.apps.iter().position(|app| app.name.trim().is_empty()) {
            return Err(format!("App #{} has an empty name", index + 1));
        }

        self.shutdown_time()?;

        if self.alerts.channel_capacity == 0 {
            return Err("Alert channel capacity must be > 0".to_string());
        }

        if self.categories.keys().any(|name| name.trim().is_empty()) {
            return Err("Category names must not be empty".to_string());
        }

        Ok(())
    }

    /// Problems that do not stop the daemon
    ///
    /// An app whose window cannot be parsed is never allowed to run.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for app in &self.apps {
            if let Err(e) = TimeWindow::from_policy(app) {
                warnings.push(format!(
                    "App '{}' has an invalid window and will always be killed: {}",
                    app.name, e
                ));
            }
        }

        for (category, members) in &self.categories {
            if members.is_empty() {
                warnings.push(format!("Category '{}' has no processes", category));
            }
        }

        if self.alerts.desktop_notifications && !cfg!(feature = "desktop-notify") {
            warnings.push(
                "Desktop notifications enabled but feature 'desktop-notify' not compiled in"
                    .to_string(),
            );
        }

        if self.alerts.shutdown_minutes.contains(&0) {
            warnings.push("A 0-minute shutdown alert fires at shutdown time".to_string());
        }

        warnings
    }

    /// Parsed shutdown time, `None` when shutdown is disabled
    pub fn shutdown_time(&self) -> Result<Option<NaiveTime>, String> {
        let value = self.shutdown.trim();
        if value.is_empty() {
            return Ok(None);
        }
        parse_clock(value)
            .map(Some)
            .map_err(|e| format!("Invalid shutdown time '{}': {}", value, e))
    }

    /// Get full path to the log file
    pub fn log_path(&self) -> PathBuf {
        self.logging.log_dir.join(&self.logging.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CONTRACT: &str = r#"{
        "apps": [{"name": "firefox", "allowed_from": "09:00", "allowed_to": "17:00"}],
        "shutdown": "23:30",
        "categories": {"browsers": ["firefox", "chromium"]}
    }"#;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.apps.is_empty());
        assert!(config.shutdown.is_empty());
        assert!(config.categories.is_empty());
        assert!(config.validate().is_ok());
        assert_eq!(config.shutdown_time().unwrap(), None);
    }

    #[test]
    fn test_alert_config_default() {
        let alerts = AlertConfig::default();
        assert_eq!(alerts.shutdown_minutes, vec![10, 3, 1]);
        assert_eq!(alerts.channel_capacity, 64);
    }

    #[test]
    fn test_logging_config_default() {
        let config = Config::default();
        assert_eq!(config.log_path(), PathBuf::from("./logs/curfew.log"));
    }

    #[test]
    fn test_example_is_valid() {
        let config = Config::example();
        assert!(config.validate().is_ok());
        assert!(config.warnings().is_empty());
        assert_eq!(
            config.shutdown_time().unwrap(),
            NaiveTime::from_hms_opt(23, 30, 0)
        );
    }

    #[test]
    fn test_config_deserialization() {
        let config: Config = serde_json::from_str(CONTRACT).unwrap();

        assert_eq!(
            config.apps,
            vec![AppPolicy::new("firefox", "09:00", "17:00")]
        );
        assert_eq!(config.shutdown, "23:30");
        assert_eq!(
            config.categories.get("browsers"),
            Some(&vec!["firefox".to_string(), "chromium".to_string()])
        );
        assert_eq!(config.alerts, AlertConfig::default());
        assert_eq!(config.logging, LogConfig::default());
    }

    #[test]
    fn test_config_validation_invalid_shutdown() {
        let mut config = Config::default();
        config.shutdown = "25:00".to_string();

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("25:00"));
    }

    #[test]
    fn test_config_validation_empty_app_name() {
        let mut config = Config::default();
        config.apps.push(AppPolicy::new(" ", "09:00", "17:00"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_capacity() {
        let mut config = Config::default();
        config.alerts.channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_empty_category() {
        let mut config = Config::default();
        config.categories.insert(String::new(), vec!["steam".to_string()]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_window_is_warning_only() {
        let mut config = Config::default();
        config.apps.push(AppPolicy::new("Notepad", "9am", "17:00"));

        assert!(config.validate().is_ok());
        let warnings = config.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Notepad"));
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config::example();
        config.save_to_file(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"allowed_from\""));

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_and_load_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::example();
        config.save_to_file(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("shutdown = \"23:30\""));

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        assert!(Config::load_from_file(dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn test_load_malformed_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(Config::load_from_file(&path).is_err());
    }
}
