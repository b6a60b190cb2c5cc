use crate::models::Settings;

pub const DEFAULT_WEBHOOK_URL: &str = "https://n8n-mailing.kart-automation.xyz/webhook";
pub const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("NOCODB_URL is not set")]
    MissingNocoDbUrl,

    #[error("INVOICE_PAGE_SIZE must be a positive integer, got '{0}'")]
    InvalidPageSize(String),
}

impl Settings {
    /// Loads settings from the process environment, reading `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|_| None)
    }

    /// Same as [`Settings::from_env`], with `overrides` consulted before the
    /// environment for every key.
    pub fn from_env_with<F>(overrides: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| overrides(key).or_else(|| std::env::var(key).ok()))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // names prefixed VITE_ are accepted for dashboards sharing the frontend's .env
        let read = |key: &str| {
            lookup(key)
                .or_else(|| lookup(&format!("VITE_{}", key)))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let nocodb_url = read("NOCODB_URL").ok_or(ConfigError::MissingNocoDbUrl)?;
        let nocodb_token = read("NOCODB_TOKEN").unwrap_or_default();
        let webhook_url = read("N8N_WEBHOOK_URL").unwrap_or_else(|| DEFAULT_WEBHOOK_URL.to_string());
        let page_size = match read("INVOICE_PAGE_SIZE") {
            Some(raw) => parse_page_size(&raw)?,
            None => DEFAULT_PAGE_SIZE,
        };

        Ok(Settings {
            nocodb_url: nocodb_url.trim_end_matches('/').to_string(),
            nocodb_token,
            webhook_url: webhook_url.trim_end_matches('/').to_string(),
            page_size,
        })
    }
}

pub fn parse_page_size(raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(ConfigError::InvalidPageSize(raw.to_string())),
    }
}
