use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {source}")]
    IoError { source: std::io::Error },
    #[error("Failed to parse config file: {source}")]
    ParseError { source: serde_json::Error },
    #[error("Failed to parse TOML config: {source}")]
    TomlParseError { source: toml::de::Error },
}

/// Runtime settings for the deck service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Credential for the completion provider. Generation fails without it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub api_base_url: String,
    /// Directory rendered decks are written to.
    pub scratch_dir: PathBuf,
    pub listen_addr: String,
    /// Serve a placeholder deck for unknown ids instead of a not-found error.
    pub demo_fallback: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: slide_chatgpt::DEFAULT_MODEL.to_string(),
            api_base_url: slide_chatgpt::DEFAULT_BASE_URL.to_string(),
            scratch_dir: std::env::temp_dir().join("slide-decks"),
            listen_addr: "0.0.0.0:3001".to_string(),
            demo_fallback: false,
        }
    }
}

const CONFIG_PATHS: [&str; 4] = [
    ".slide/config.toml",
    ".slide/config.json",
    "slide.config.toml",
    "slide.config.json",
];

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load from file (toml or json, chosen by extension).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError { source: e })?;

        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::TomlParseError { source: e })
        } else {
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError { source: e })
        }
    }

    /// First readable config file from the well-known locations, then the
    /// environment on top.
    pub fn load_with_fallback() -> Self {
        let mut config = Self::load_file_with_fallback();
        config.apply_env();
        config
    }

    /// Overlay the environment variables on an already loaded config.
    pub fn with_env(mut self) -> Self {
        self.apply_env();
        self
    }

    fn load_file_with_fallback() -> Self {
        for path in &CONFIG_PATHS {
            if Path::new(path).exists() {
                match Self::load_from_file(path) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from {}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default configuration");
        Self::default()
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }

        if let Ok(model) = std::env::var("SLIDE_MODEL") {
            self.model = model;
        }

        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            self.api_base_url = url;
        }

        if let Ok(dir) = std::env::var("SLIDE_SCRATCH_DIR") {
            self.scratch_dir = PathBuf::from(dir);
        }

        if let Ok(addr) = std::env::var("SLIDE_LISTEN_ADDR") {
            self.listen_addr = addr;
        }

        if let Some(flag) = std::env::var("SLIDE_DEMO_FALLBACK")
            .ok()
            .and_then(|v| parse_bool(&v))
        {
            self.demo_fallback = flag;
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.model, "gpt-4-turbo");
        assert!(config.api_key.is_none());
        assert!(!config.demo_fallback);
        assert!(config.scratch_dir.ends_with("slide-decks"));
    }

    #[test]
    fn toml_file_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slide.config.toml");
        std::fs::write(&path, "model = \"gpt-4o\"\ndemo_fallback = true\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert!(config.demo_fallback);
        assert_eq!(config.listen_addr, "0.0.0.0:3001");
    }

    #[test]
    fn json_file_is_parsed_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slide.config.json");
        std::fs::write(&path, r#"{"scratch_dir": "/tmp/decks"}"#).unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.scratch_dir, PathBuf::from("/tmp/decks"));
    }

    #[test]
    fn bad_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slide.config.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            Config::load_from_file(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn bool_parsing() {
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
