//! Configuration for Kenning.
//!
//! One TOML file with a table per subsystem:
//!
//! ```toml
//! [search]
//! primary = "brave"
//! supplemental = "exa"
//! max_results = 10
//!
//! [personal]
//! scan_limit = 20
//! long_query_threshold = 20
//!
//! [generation]
//! model = "gpt-4o-mini"
//! ```
//!
//! API keys are normally supplied through the environment
//! ([`KenningConfig::apply_env`]) and are never written back to disk.

use std::path::{Path, PathBuf};

use kenning_search::SearchConfig;
use serde::{Deserialize, Serialize};

use crate::error::{KenningError, Result};

/// Environment variable holding the Brave Search key.
pub const BRAVE_API_KEY_ENV: &str = "BRAVE_API_KEY";
/// Environment variable holding the Exa key.
pub const EXA_API_KEY_ENV: &str = "EXA_API_KEY";
/// Environment variable holding the OpenAI-compatible generator key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default Notion API origin.
pub const NOTION_DEFAULT_BASE_URL: &str = "https://api.notion.com";
/// Default OpenAI-compatible API origin.
pub const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KenningConfig {
    /// Web search providers and orchestration limits.
    pub search: SearchConfig,
    /// Personal knowledge corpus scanning.
    pub personal: PersonalConfig,
    /// Text generation for profile analysis, query expansion and answers.
    pub generation: GenerationConfig,
}

/// Personal corpus settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalConfig {
    /// Notion API origin, overridable for tests.
    pub notion_base_url: String,
    /// Maximum documents scanned per request.
    pub scan_limit: usize,
    /// Queries longer than this many characters treat every scanned
    /// document as relevant. `None` disables the shortcut.
    pub long_query_threshold: Option<usize>,
    /// Timeout in seconds for each Notion call.
    pub timeout_secs: u64,
}

impl Default for PersonalConfig {
    fn default() -> Self {
        Self {
            notion_base_url: NOTION_DEFAULT_BASE_URL.to_string(),
            scan_limit: 20,
            long_query_threshold: Some(20),
            timeout_secs: 10,
        }
    }
}

/// Text generator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// OpenAI-compatible API origin.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// API key. Never serialised.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Sampling temperature for answers.
    pub temperature: f32,
    /// Token limit for streamed answers.
    pub max_tokens: u32,
    /// Longest gap in seconds allowed between streamed deltas.
    pub idle_timeout_secs: u64,
    /// Limit in seconds for one non-streaming call (profile analysis,
    /// query expansion), including the response body.
    pub request_timeout_secs: u64,
    /// Token limit for profile analysis.
    pub analysis_max_tokens: u32,
    /// Token limit for query expansion.
    pub expansion_max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: OPENAI_DEFAULT_BASE_URL.to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            temperature: 0.1,
            max_tokens: 1000,
            idle_timeout_secs: 30,
            request_timeout_secs: 10,
            analysis_max_tokens: 800,
            expansion_max_tokens: 400,
        }
    }
}

impl KenningConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`KenningError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| KenningError::Config(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| KenningError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// API keys are not written.
    ///
    /// # Errors
    ///
    /// Returns [`KenningError::Config`] if the file cannot be written or serialised.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| KenningError::Config(format!("cannot create {}: {e}", parent.display())))?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| KenningError::Config(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| KenningError::Config(format!("cannot write {}: {e}", path.display())))
    }

    /// Returns the default config file path: `~/.config/kenning/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("kenning").join("config.toml")
        } else if let Some(home) = dirs::home_dir() {
            home.join(".config").join("kenning").join("config.toml")
        } else {
            PathBuf::from("kenning").join("config.toml")
        }
    }

    /// Overlay API keys from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Overlay API keys from `lookup`. Blank values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = get(BRAVE_API_KEY_ENV) {
            self.search.brave.api_key = Some(key);
        }
        if let Some(key) = get(EXA_API_KEY_ENV) {
            self.search.exa.api_key = Some(key);
        }
        if let Some(key) = get(OPENAI_API_KEY_ENV) {
            self.generation.api_key = Some(key);
        }
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns [`KenningError::Search`] for an invalid `[search]` table and
    /// [`KenningError::Config`] for the rest.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;

        if self.personal.scan_limit == 0 {
            return Err(KenningError::Config(
                "personal.scan_limit must be greater than 0".into(),
            ));
        }
        if self.personal.timeout_secs == 0 {
            return Err(KenningError::Config(
                "personal.timeout_secs must be greater than 0".into(),
            ));
        }
        let generation = &self.generation;
        if generation.model.trim().is_empty() {
            return Err(KenningError::Config("generation.model must not be empty".into()));
        }
        if generation.max_tokens == 0
            || generation.analysis_max_tokens == 0
            || generation.expansion_max_tokens == 0
        {
            return Err(KenningError::Config(
                "generation token limits must be greater than 0".into(),
            ));
        }
        if generation.idle_timeout_secs == 0 || generation.request_timeout_secs == 0 {
            return Err(KenningError::Config(
                "generation timeouts must be greater than 0".into(),
            ));
        }
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(KenningError::Config(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kenning_search::ProviderKind;

    #[test]
    fn defaults_match_documented_values() {
        let config = KenningConfig::default();
        assert_eq!(config.personal.scan_limit, 20);
        assert_eq!(config.personal.long_query_threshold, Some(20));
        assert_eq!(config.generation.model, "gpt-4o-mini");
        assert_eq!(config.generation.max_tokens, 1000);
        assert_eq!(config.generation.idle_timeout_secs, 30);
        assert_eq!(config.generation.request_timeout_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_request_timeout_rejected() {
        let mut config = KenningConfig::default();
        config.generation.request_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.code(), "CONFIG_INVALID");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: KenningConfig = toml::from_str(
            r#"
            [search]
            primary = "exa"
            supplemental = "brave"

            [personal]
            scan_limit = 5
            "#,
        )
        .expect("parse");
        assert_eq!(config.search.primary, ProviderKind::Exa);
        assert_eq!(config.search.max_results, 10);
        assert_eq!(config.personal.scan_limit, 5);
        assert_eq!(config.personal.timeout_secs, 10);
        assert_eq!(config.generation.temperature, 0.1);
    }

    #[test]
    fn save_and_load_round_trip_omits_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut config = KenningConfig::default();
        config.personal.long_query_threshold = Some(42);
        config.generation.api_key = Some("sk-secret".into());
        config.search.brave.api_key = Some("brave-secret".into());
        config.save_to_file(&path).expect("save");

        let text = std::fs::read_to_string(&path).expect("read back");
        assert!(!text.contains("secret"));

        let loaded = KenningConfig::from_file(&path).expect("load");
        assert_eq!(loaded.personal.long_query_threshold, Some(42));
        assert!(loaded.generation.api_key.is_none());
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = KenningConfig::from_file(Path::new("/nonexistent/kenning/config.toml"));
        assert!(matches!(result, Err(KenningError::Config(_))));
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").expect("write");
        assert!(KenningConfig::from_file(&path).is_err());
    }

    #[test]
    fn env_overlay_sets_keys_and_ignores_blanks() {
        let mut config = KenningConfig::default();
        config.apply_env_from(|name| match name {
            BRAVE_API_KEY_ENV => Some("brave-key".into()),
            EXA_API_KEY_ENV => Some("   ".into()),
            OPENAI_API_KEY_ENV => Some("sk-test".into()),
            _ => None,
        });
        assert_eq!(config.search.brave.api_key.as_deref(), Some("brave-key"));
        assert!(config.search.exa.api_key.is_none());
        assert_eq!(config.generation.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn zero_scan_limit_rejected() {
        let mut config = KenningConfig::default();
        config.personal.scan_limit = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("scan_limit"));
    }

    #[test]
    fn invalid_search_section_surfaces_as_search_error() {
        let mut config = KenningConfig::default();
        config.search.request_budget_secs = 1;
        let err = config.validate().unwrap_err();
        assert_eq!(err.code(), "SEARCH_FAILED");
    }

    #[test]
    fn out_of_range_temperature_rejected() {
        let mut config = KenningConfig::default();
        config.generation.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = KenningConfig::default_config_path();
        assert!(path.ends_with("kenning/config.toml"));
    }
}
