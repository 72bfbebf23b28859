use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },
    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// `api_key` becomes `OPENROUTER_API_KEY`
pub fn to_env_var(field: &str) -> String {
    format!("OPENROUTER_{}", field.to_uppercase())
}
