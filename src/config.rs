use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::draw::Spread;

/// Status of config file loading
#[derive(Debug, Clone)]
pub enum ConfigLoadStatus {
    /// Config loaded successfully from existing file
    Loaded,
    /// Created default config file (first run)
    Created,
    /// Error occurred during loading, using defaults.
    /// String is used in Debug output for logging.
    #[allow(dead_code)]
    Error(String),
}

/// Text-generation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub model: String,
    /// Base URL of an OpenAI-compatible API, without `/chat/completions`.
    pub base_url: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Name of the environment variable holding the API key.
    /// The key itself is never stored in the config file.
    pub api_key_env: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.95,
            timeout_secs: 60,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// Request shaping limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_calls_per_minute: usize,
    pub window_secs: u64,
    pub cache_ttl_secs: u64,
    pub max_question_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_calls_per_minute: crate::rate_limit::DEFAULT_MAX_CALLS,
            window_secs: crate::rate_limit::DEFAULT_WINDOW.as_secs(),
            cache_ttl_secs: crate::cache::DEFAULT_TTL.as_secs(),
            max_question_chars: crate::session::DEFAULT_MAX_QUESTION_CHARS,
        }
    }
}

/// Reading defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingConfig {
    pub spread: Spread,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub reading: ReadingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Read the API key from the environment variable named in the config.
    /// Blank values count as missing.
    pub fn api_key(&self) -> Option<String> {
        env::var(&self.generator.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

/// Partial generator configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialGeneratorConfig {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub api_key_env: Option<String>,
}

/// Partial limits configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialLimitsConfig {
    pub max_calls_per_minute: Option<usize>,
    pub window_secs: Option<u64>,
    pub cache_ttl_secs: Option<u64>,
    pub max_question_chars: Option<usize>,
}

/// Partial reading configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialReadingConfig {
    pub spread: Option<Spread>,
}

/// Partial logging configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialLoggingConfig {
    pub level: Option<String>,
}

/// Project-specific configuration where every field is optional.
/// Parsed from `.tarot` files. Fields that are `None` inherit from the global config.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialConfig {
    pub generator: PartialGeneratorConfig,
    pub limits: PartialLimitsConfig,
    pub reading: PartialReadingConfig,
    pub logging: PartialLoggingConfig,
}

/// Merge a global config with a project-level partial config.
/// Project values override global values where present.
pub fn merge_config(global: &Config, project: &PartialConfig) -> Config {
    let g = &project.generator;
    let l = &project.limits;
    Config {
        generator: GeneratorConfig {
            model: g
                .model
                .clone()
                .unwrap_or_else(|| global.generator.model.clone()),
            base_url: g
                .base_url
                .clone()
                .unwrap_or_else(|| global.generator.base_url.clone()),
            temperature: g.temperature.unwrap_or(global.generator.temperature),
            timeout_secs: g.timeout_secs.unwrap_or(global.generator.timeout_secs),
            api_key_env: g
                .api_key_env
                .clone()
                .unwrap_or_else(|| global.generator.api_key_env.clone()),
        },
        limits: LimitsConfig {
            max_calls_per_minute: l
                .max_calls_per_minute
                .unwrap_or(global.limits.max_calls_per_minute),
            window_secs: l.window_secs.unwrap_or(global.limits.window_secs),
            cache_ttl_secs: l.cache_ttl_secs.unwrap_or(global.limits.cache_ttl_secs),
            max_question_chars: l
                .max_question_chars
                .unwrap_or(global.limits.max_question_chars),
        },
        reading: ReadingConfig {
            spread: project.reading.spread.unwrap_or(global.reading.spread),
        },
        logging: LoggingConfig {
            level: project
                .logging
                .level
                .clone()
                .unwrap_or_else(|| global.logging.level.clone()),
        },
    }
}

/// Loaded configuration with metadata
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub config_path: PathBuf,
    pub project_config_path: Option<PathBuf>,
    pub status: ConfigLoadStatus,
    /// Why `.tarot` was ignored, if it was.
    pub project_error: Option<String>,
}

/// Get the platform-appropriate config directory
fn get_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("dev", "tarot", "tarot").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the full path to the config file
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.tarot in current working directory).
pub fn get_project_config_path() -> Option<PathBuf> {
    let path = std::env::current_dir().ok()?.join(".tarot");
    if path.exists() { Some(path) } else { None }
}

/// Load a project config (.tarot) from the given path.
fn load_project_config(path: &Path) -> Result<PartialConfig, String> {
    let contents = fs::read_to_string(path).map_err(|e| {
        warn!(path = ?path, error = %e, "project_config_read_failed");
        format!("Failed to read .tarot: {}", e)
    })?;

    toml::from_str::<PartialConfig>(&contents).map_err(|e| {
        warn!(path = ?path, error = %e, "project_config_parse_failed");
        format!("Invalid .tarot: {}", e)
    })
}

/// Load configuration from file, project override, environment, and defaults
pub fn load_config() -> LoadedConfig {
    let config_path = match get_config_path() {
        Some(path) => path,
        None => {
            warn!("Could not determine config directory, using defaults");
            return LoadedConfig {
                config: apply_env_overrides(Config::default()),
                config_path: PathBuf::from("config.toml"),
                project_config_path: None,
                status: ConfigLoadStatus::Error("Could not determine config directory".to_string()),
                project_error: None,
            };
        }
    };

    load_from(config_path, get_project_config_path())
}

/// Load the global config at `config_path`, then layer the optional project file over it.
fn load_from(config_path: PathBuf, project_config_path: Option<PathBuf>) -> LoadedConfig {
    debug!("Config path: {:?}", config_path);

    let (mut config, status) = load_or_create_config(&config_path);

    let mut project_error = None;
    if let Some(ref project_path) = project_config_path {
        match load_project_config(project_path) {
            Ok(partial) => {
                config = merge_config(&config, &partial);
                info!(path = ?project_path, "project_config_loaded");
            }
            Err(e) => {
                warn!(path = ?project_path, error = %e, "project_config_error");
                project_error = Some(e);
            }
        }
    }

    let config = apply_env_overrides(config);

    LoadedConfig {
        config,
        config_path,
        project_config_path,
        status,
        project_error,
    }
}

/// Load config from file, or create default if not exists
fn load_or_create_config(config_path: &Path) -> (Config, ConfigLoadStatus) {
    match fs::read_to_string(config_path) {
        Ok(contents) => match toml::from_str::<Config>(&contents) {
            Ok(config) => {
                info!("Loaded config from {:?}", config_path);
                (config, ConfigLoadStatus::Loaded)
            }
            Err(e) => {
                warn!(
                    "Config file malformed at {:?}: {}. Using defaults.",
                    config_path, e
                );
                (
                    Config::default(),
                    ConfigLoadStatus::Error(format!("Malformed TOML: {}", e)),
                )
            }
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => create_default_config(config_path),
        Err(e) => {
            warn!(
                "Error reading config at {:?}: {}. Using defaults.",
                config_path, e
            );
            (
                Config::default(),
                ConfigLoadStatus::Error(format!("Read error: {}", e)),
            )
        }
    }
}

/// Create the default config file
fn create_default_config(config_path: &Path) -> (Config, ConfigLoadStatus) {
    let config = Config::default();

    if let Some(parent) = config_path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!(
            "Could not create config directory {:?}: {}. Continuing without file.",
            parent, e
        );
        return (
            config,
            ConfigLoadStatus::Error(format!("Could not create config directory: {}", e)),
        );
    }

    let toml_content = match toml::to_string_pretty(&config) {
        Ok(s) => s,
        Err(e) => {
            warn!("Could not serialize default config: {}", e);
            return (
                config,
                ConfigLoadStatus::Error(format!("Serialization error: {}", e)),
            );
        }
    };

    match fs::write(config_path, &toml_content) {
        Ok(()) => {
            info!("Created default config at {:?}", config_path);
            (config, ConfigLoadStatus::Created)
        }
        Err(e) => {
            warn!(
                "Could not write default config to {:?}: {}. Continuing without file.",
                config_path, e
            );
            (
                config,
                ConfigLoadStatus::Error(format!("Write error: {}", e)),
            )
        }
    }
}

/// Apply environment variable overrides to config
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(model) = env::var("TAROT_MODEL") {
        debug!("Overriding generator.model from TAROT_MODEL");
        config.generator.model = model;
    }

    if let Ok(url) = env::var("TAROT_BASE_URL") {
        debug!("Overriding generator.base_url from TAROT_BASE_URL");
        config.generator.base_url = url;
    }

    if let Ok(name) = env::var("TAROT_API_KEY_ENV") {
        debug!("Overriding generator.api_key_env from TAROT_API_KEY_ENV");
        config.generator.api_key_env = name;
    }

    if let Ok(level) = env::var("TAROT_LOG") {
        debug!("Overriding logging.level from TAROT_LOG");
        config.logging.level = level;
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.generator.model, "gpt-4o-mini");
        assert_eq!(config.generator.base_url, "https://api.openai.com/v1");
        assert_eq!(config.generator.timeout_secs, 60);
        assert_eq!(config.generator.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.limits.max_calls_per_minute, 6);
        assert_eq!(config.limits.window_secs, 60);
        assert_eq!(config.limits.cache_ttl_secs, 1800);
        assert_eq!(config.limits.max_question_chars, 220);
        assert_eq!(config.reading.spread, Spread::Three);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
[generator]
model = "local-model"
base_url = "http://localhost:8080/v1"
temperature = 0.7
timeout_secs = 10
api_key_env = "LOCAL_KEY"

[limits]
max_calls_per_minute = 3
window_secs = 30
cache_ttl_secs = 120
max_question_chars = 100

[reading]
spread = "five"

[logging]
level = "debug"
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.generator.model, "local-model");
        assert_eq!(config.generator.base_url, "http://localhost:8080/v1");
        assert_eq!(config.generator.temperature, 0.7);
        assert_eq!(config.generator.timeout_secs, 10);
        assert_eq!(config.generator.api_key_env, "LOCAL_KEY");
        assert_eq!(config.limits.max_calls_per_minute, 3);
        assert_eq!(config.limits.window_secs, 30);
        assert_eq!(config.limits.cache_ttl_secs, 120);
        assert_eq!(config.limits.max_question_chars, 100);
        assert_eq!(config.reading.spread, Spread::Five);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_partial_deserialization() {
        let toml_str = r#"
[generator]
model = "other"
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.generator.model, "other");
        assert_eq!(config.generator.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.limits.max_calls_per_minute, 6);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let toml_str = r#"
[generator]
model = "other"
api_key = "should be ignored"

[unknown_section]
foo = "bar"
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.generator.model, "other");
    }

    #[test]
    fn test_invalid_spread_is_an_error() {
        let toml_str = r#"
[reading]
spread = "seven"
"#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_serialized_config_has_no_key() {
        let toml_content = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(toml_content.contains("api_key_env = \"OPENAI_API_KEY\""));
        assert!(!toml_content.contains("sk-"));
    }

    #[test]
    fn test_api_key_from_named_env_var() {
        let mut config = Config::default();
        config.generator.api_key_env = "TAROT_TEST_KEY_PRESENT".to_string();
        // SAFETY: the variable name is unique to this test.
        unsafe { env::set_var("TAROT_TEST_KEY_PRESENT", "  sk-test \n") };
        assert_eq!(config.api_key(), Some("sk-test".to_string()));

        config.generator.api_key_env = "TAROT_TEST_KEY_MISSING".to_string();
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let mut config = Config::default();
        config.generator.api_key_env = "TAROT_TEST_KEY_BLANK".to_string();
        // SAFETY: the variable name is unique to this test.
        unsafe { env::set_var("TAROT_TEST_KEY_BLANK", "   ") };
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let (config, status) = load_or_create_config(&path);
        assert!(matches!(status, ConfigLoadStatus::Created));
        assert_eq!(config.generator.model, "gpt-4o-mini");
        assert!(path.exists());

        let (reloaded, status) = load_or_create_config(&path);
        assert!(matches!(status, ConfigLoadStatus::Loaded));
        assert_eq!(reloaded.limits.cache_ttl_secs, 1800);
    }

    #[test]
    fn test_load_malformed_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[limits\nmax_calls_per_minute = ").unwrap();

        let (config, status) = load_or_create_config(&path);
        assert!(matches!(status, ConfigLoadStatus::Error(_)));
        assert_eq!(config.limits.max_calls_per_minute, 6);
    }

    #[test]
    fn test_load_project_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".tarot");
        fs::write(&path, "[reading]\nspread = \"five\"\n").unwrap();

        let partial = load_project_config(&path).unwrap();
        assert_eq!(partial.reading.spread, Some(Spread::Five));
        assert!(partial.generator.model.is_none());

        fs::write(&path, "[reading\n").unwrap();
        assert!(load_project_config(&path).is_err());
    }

    #[test]
    fn test_broken_project_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "[reading]\nspread = \"five\"\n").unwrap();
        let project_path = dir.path().join(".tarot");
        fs::write(&project_path, "[reading\n").unwrap();

        let loaded = load_from(config_path, Some(project_path));
        assert!(matches!(loaded.status, ConfigLoadStatus::Loaded));
        assert_eq!(loaded.config.reading.spread, Spread::Five);
        assert!(
            loaded
                .project_error
                .as_deref()
                .is_some_and(|e| e.starts_with("Invalid .tarot"))
        );
    }

    #[test]
    fn test_project_config_overrides_global() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let project_path = dir.path().join(".tarot");
        fs::write(&project_path, "[reading]\nspread = \"five\"\n").unwrap();

        let loaded = load_from(config_path, Some(project_path));
        assert!(matches!(loaded.status, ConfigLoadStatus::Created));
        assert_eq!(loaded.config.reading.spread, Spread::Five);
        assert!(loaded.project_error.is_none());
    }

    #[test]
    fn test_partial_config_empty() {
        let partial: PartialConfig = toml::from_str("").unwrap();
        assert!(partial.generator.model.is_none());
        assert!(partial.generator.temperature.is_none());
        assert!(partial.limits.max_calls_per_minute.is_none());
        assert!(partial.reading.spread.is_none());
        assert!(partial.logging.level.is_none());
    }

    #[test]
    fn test_partial_config_comment_only() {
        let partial: PartialConfig =
            toml::from_str("# Project-specific tarot config\n").unwrap();
        assert!(partial.generator.base_url.is_none());
    }

    #[test]
    fn test_merge_config_no_overrides() {
        let global = Config::default();
        let merged = merge_config(&global, &PartialConfig::default());

        assert_eq!(merged.generator.model, global.generator.model);
        assert_eq!(merged.generator.base_url, global.generator.base_url);
        assert_eq!(merged.generator.temperature, global.generator.temperature);
        assert_eq!(merged.limits.window_secs, global.limits.window_secs);
        assert_eq!(merged.reading.spread, global.reading.spread);
        assert_eq!(merged.logging.level, global.logging.level);
    }

    #[test]
    fn test_merge_config_partial_overrides() {
        let global = Config::default();
        let partial: PartialConfig = toml::from_str(
            r#"
[generator]
model = "project-model"

[limits]
cache_ttl_secs = 5

[reading]
spread = "five"
"#,
        )
        .unwrap();
        let merged = merge_config(&global, &partial);

        assert_eq!(merged.generator.model, "project-model");
        assert_eq!(merged.limits.cache_ttl_secs, 5);
        assert_eq!(merged.reading.spread, Spread::Five);

        assert_eq!(merged.generator.base_url, global.generator.base_url);
        assert_eq!(merged.generator.api_key_env, global.generator.api_key_env);
        assert_eq!(
            merged.limits.max_calls_per_minute,
            global.limits.max_calls_per_minute
        );
        assert_eq!(merged.logging.level, global.logging.level);
    }
}
