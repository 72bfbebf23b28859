use std::path::Path;

use config::{Config, Environment, File};
use minicode::providers::configs::{
    OpenRouterProviderConfig, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, OPENROUTER_HOST,
};
use serde::Deserialize;

use crate::error::{to_env_var, ConfigError};

/// Optional settings file, looked up in the working directory
pub const CONFIG_FILE: &str = "minicode.toml";

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub api_key: String,
    #[serde(default)]
    pub model: Option<String>,
    pub host: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(Path::new(CONFIG_FILE))
    }

    /// Defaults, then `file` if it exists, then `OPENROUTER_*` environment variables
    pub fn load(file: &Path) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("host", OPENROUTER_HOST)?
            .set_default("temperature", DEFAULT_TEMPERATURE as f64)?
            .set_default("max_tokens", DEFAULT_MAX_TOKENS as i64)?
            .add_source(File::from(file).required(false))
            .add_source(
                Environment::with_prefix("OPENROUTER")
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Self = match config.try_deserialize() {
            Ok(settings) => settings,
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                return if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                };
            }
        };

        if settings.api_key.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar {
                env_var: to_env_var("api_key"),
            });
        }
        Ok(settings)
    }

    /// Provider configuration, with `model` taking precedence over the configured default
    pub fn into_provider_config(self, model: Option<String>) -> OpenRouterProviderConfig {
        OpenRouterProviderConfig {
            host: self.host,
            api_key: self.api_key,
            model: model.or(self.model).filter(|m| !m.trim().is_empty()),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("OPENROUTER_") {
                env::remove_var(&key);
            }
        }
    }

    fn no_file(dir: &TempDir) -> std::path::PathBuf {
        dir.path().join(CONFIG_FILE)
    }

    #[test]
    #[serial]
    fn test_default_settings() {
        clean_env();
        let dir = TempDir::new().unwrap();
        env::set_var("OPENROUTER_API_KEY", "test-key");

        let settings = Settings::load(&no_file(&dir)).unwrap();
        assert_eq!(settings.api_key, "test-key");
        assert_eq!(settings.host, "https://openrouter.ai/api");
        assert_eq!(settings.model, None);
        assert_eq!(settings.temperature, 0.7);
        assert_eq!(settings.max_tokens, 4096);

        clean_env();
    }

    #[test]
    #[serial]
    fn test_missing_api_key() {
        clean_env();
        let dir = TempDir::new().unwrap();

        match Settings::load(&no_file(&dir)) {
            Err(ConfigError::MissingEnvVar { env_var }) => {
                assert_eq!(env_var, "OPENROUTER_API_KEY")
            }
            other => panic!("Expected missing env var, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_blank_api_key_is_missing() {
        clean_env();
        let dir = TempDir::new().unwrap();
        env::set_var("OPENROUTER_API_KEY", "  ");

        assert!(matches!(
            Settings::load(&no_file(&dir)),
            Err(ConfigError::MissingEnvVar { .. })
        ));

        clean_env();
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        clean_env();
        let dir = TempDir::new().unwrap();
        env::set_var("OPENROUTER_API_KEY", "test-key");
        env::set_var("OPENROUTER_MODEL", "anthropic/claude-3.5-sonnet");
        env::set_var("OPENROUTER_HOST", "http://localhost:8080");
        env::set_var("OPENROUTER_TEMPERATURE", "0.2");
        env::set_var("OPENROUTER_MAX_TOKENS", "1024");

        let settings = Settings::load(&no_file(&dir)).unwrap();
        assert_eq!(settings.model.as_deref(), Some("anthropic/claude-3.5-sonnet"));
        assert_eq!(settings.host, "http://localhost:8080");
        assert_eq!(settings.temperature, 0.2);
        assert_eq!(settings.max_tokens, 1024);

        clean_env();
    }

    #[test]
    #[serial]
    fn test_file_is_layered_under_environment() {
        clean_env();
        let dir = TempDir::new().unwrap();
        let file = dir.path().join(CONFIG_FILE);
        fs::write(
            &file,
            "api_key = \"file-key\"\nmodel = \"openai/gpt-4o\"\nmax_tokens = 2048\n",
        )
        .unwrap();
        env::set_var("OPENROUTER_MODEL", "qwen/qwen-2.5-coder-32b-instruct");

        let settings = Settings::load(&file).unwrap();
        assert_eq!(settings.api_key, "file-key");
        assert_eq!(settings.max_tokens, 2048);
        assert_eq!(
            settings.model.as_deref(),
            Some("qwen/qwen-2.5-coder-32b-instruct")
        );

        clean_env();
    }

    #[test]
    fn test_flag_model_wins() {
        let settings = Settings {
            api_key: "k".to_string(),
            model: Some("openai/gpt-4o".to_string()),
            host: OPENROUTER_HOST.to_string(),
            temperature: 0.7,
            max_tokens: 4096,
        };
        let config = settings.into_provider_config(Some("openai/gpt-4o-mini".to_string()));
        assert_eq!(config.model.as_deref(), Some("openai/gpt-4o-mini"));
        assert_eq!(config.api_key, "k");
    }
}
