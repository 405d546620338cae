//! Configuration management

pub mod commands;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "structrans";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub translation: TranslationConfig,

    #[serde(default)]
    pub services: ServicesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Milliseconds to wait after every successful backend call
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Attempts per backend before moving on to the next one
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff between attempts
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Worker threads for CSV rows
    #[serde(default = "default_csv_max_workers")]
    pub csv_max_workers: usize,

    /// Row count above which CSV columns are translated in parallel
    #[serde(default = "default_multithreading_threshold")]
    pub multithreading_threshold: usize,

    /// Log progress every N items
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,

    /// XML element names whose text is treated as HTML
    #[serde(default = "default_html_container_tags")]
    pub html_container_tags: Vec<String>,

    /// Glossary file (semicolon separated)
    #[serde(default)]
    pub glossary: Option<String>,

    #[serde(default = "default_source")]
    pub default_source: String,

    #[serde(default = "default_target")]
    pub default_target: String,
}

fn default_delay_ms() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    20
}

fn default_csv_max_workers() -> usize {
    6
}

fn default_multithreading_threshold() -> usize {
    2
}

fn default_progress_interval() -> usize {
    10
}

fn default_html_container_tags() -> Vec<String> {
    [
        "Content",
        "Description",
        "Title",
        "Banner",
        "Summary",
        "Body",
        "Teaser",
        "Introduction",
        "Conclusion",
        "Text",
        "HTML",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_source() -> String {
    "en".to_string()
}

fn default_target() -> String {
    "nl".to_string()
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            csv_max_workers: default_csv_max_workers(),
            multithreading_threshold: default_multithreading_threshold(),
            progress_interval: default_progress_interval(),
            html_container_tags: default_html_container_tags(),
            glossary: None,
            default_source: default_source(),
            default_target: default_target(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Backend order (google, deepl, libretranslate)
    #[serde(default = "default_order")]
    pub order: Vec<String>,

    /// Remote LibreTranslate endpoint
    #[serde(default = "default_libretranslate_url")]
    pub libretranslate_url: String,

    #[serde(default)]
    pub libretranslate_api_key: Option<String>,

    /// Probe a local LibreTranslate instance and prefer it when it answers
    #[serde(default = "default_true")]
    pub libretranslate_selfhost_enabled: bool,

    #[serde(default = "default_selfhost_url")]
    pub libretranslate_selfhost_url: String,

    #[serde(default = "default_selfhost_timeout_secs")]
    pub libretranslate_selfhost_timeout_secs: u64,

    /// DeepL API key (free or pro)
    #[serde(default)]
    pub deepl_api_key: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_order() -> Vec<String> {
    vec![
        "google".to_string(),
        "deepl".to_string(),
        "libretranslate".to_string(),
    ]
}

fn default_libretranslate_url() -> String {
    "https://libretranslate.com/translate".to_string()
}

fn default_true() -> bool {
    true
}

fn default_selfhost_url() -> String {
    "http://localhost:5000/translate".to_string()
}

fn default_selfhost_timeout_secs() -> u64 {
    2
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            order: default_order(),
            libretranslate_url: default_libretranslate_url(),
            libretranslate_api_key: None,
            libretranslate_selfhost_enabled: default_true(),
            libretranslate_selfhost_url: default_selfhost_url(),
            libretranslate_selfhost_timeout_secs: default_selfhost_timeout_secs(),
            deepl_api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Immutable knobs handed to the chain and the pipelines.
#[derive(Debug, Clone)]
pub struct Settings {
    pub delay: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub csv_max_workers: usize,
    pub multithreading_threshold: usize,
    pub progress_interval: usize,
    pub html_container_tags: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        TranslationConfig::default().settings()
    }
}

impl Settings {
    /// No delays, single attempt; used by tests and dry runs.
    pub fn immediate() -> Self {
        Self {
            delay: Duration::ZERO,
            max_retries: 1,
            retry_base_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn is_html_container(&self, tag: &str) -> bool {
        self.html_container_tags
            .iter()
            .any(|t| t.eq_ignore_ascii_case(tag))
    }
}

impl TranslationConfig {
    pub fn settings(&self) -> Settings {
        Settings {
            delay: Duration::from_millis(self.delay_ms),
            max_retries: self.max_retries.max(1),
            retry_base_delay: Duration::from_millis(self.retry_base_delay_ms),
            csv_max_workers: self.csv_max_workers.max(1),
            multithreading_threshold: self.multithreading_threshold,
            progress_interval: self.progress_interval.max(1),
            html_container_tags: self.html_container_tags.clone(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_NAME))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join(CONFIG_FILE_NAME))
    }

    /// Explicit path when given, the default location otherwise
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        match explicit {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::config_path().context("Could not determine config path"),
        }
    }

    /// Load config from default location
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    pub fn load_with(explicit: Option<&Path>) -> Result<Self> {
        Self::load_from(&Self::resolve_path(explicit)?)
    }

    /// Load config from an explicit path, falling back to defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!(
            "Loaded configuration: delay={}ms, csv_max_workers={}",
            config.translation.delay_ms,
            config.translation.csv_max_workers
        );

        Ok(config)
    }

    /// Save config to default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path().context("Could not determine config path")?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn settings(&self) -> Settings {
        self.translation.settings()
    }

    pub fn deepl_api_key(&self) -> Option<String> {
        self.services
            .deepl_api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("DEEPL_API_KEY").ok())
    }

    pub fn libretranslate_api_key(&self) -> Option<String> {
        self.services
            .libretranslate_api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("LIBRETRANSLATE_API_KEY").ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[translation]
delay_ms = 50
html_container_tags = ["Content", "Lead"]

[services]
order = ["libretranslate"]
"#,
        )
        .unwrap();

        assert_eq!(config.translation.delay_ms, 50);
        assert_eq!(config.translation.max_retries, 3);
        assert_eq!(config.services.order, vec!["libretranslate"]);
        assert!(config.services.libretranslate_selfhost_enabled);

        let settings = config.settings();
        assert_eq!(settings.delay, Duration::from_millis(50));
        assert!(settings.is_html_container("lead"));
        assert!(!settings.is_html_container("Description"));
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.delay, Duration::from_millis(5));
        assert_eq!(settings.csv_max_workers, 6);
        assert!(settings.is_html_container("content"));
        assert!(settings.is_html_container("BANNER"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.services.order = vec!["deepl".into()];
        config.translation.glossary = Some("terms.csv".into());
        config.save_to(&path).unwrap();

        let loaded = Config::load_with(Some(&path)).unwrap();
        assert_eq!(loaded.services.order, vec!["deepl"]);
        assert_eq!(loaded.translation.glossary.as_deref(), Some("terms.csv"));
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = Config::load_from(Path::new("/nonexistent/structrans.toml")).unwrap();
        assert_eq!(config.translation.default_target, "nl");
    }
}
