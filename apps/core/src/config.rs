use std::env;
use std::time::Duration;
use url::Url;

use crate::error::AppError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_MODEL_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://civic_governance.db";
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 20;

/// Runtime settings, read from the environment.
///
/// Without `GOOGLE_API_KEY` the engine runs in keyword-only mode.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub model_base_url: Url,
    pub database_url: String,
    pub remote_timeout: Duration,
    pub log_json: bool,
}

impl AppConfig {
    /// Loads `.env` (if present) and then reads the environment.
    pub fn load() -> Result<Self, AppError> {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, AppError> {
        let api_key = non_empty_var("GOOGLE_API_KEY");
        let model = non_empty_var("CIVIC_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let base_url = non_empty_var("CIVIC_MODEL_BASE_URL")
            .unwrap_or_else(|| DEFAULT_MODEL_BASE_URL.to_string());
        let model_base_url = Url::parse(&base_url)?;

        let database_url = non_empty_var("CIVIC_DATABASE_URL")
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let remote_timeout_secs = match non_empty_var("CIVIC_REMOTE_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                AppError::Config(format!("CIVIC_REMOTE_TIMEOUT_SECS is not a number: {raw}"))
            })?,
            None => DEFAULT_REMOTE_TIMEOUT_SECS,
        };
        if remote_timeout_secs == 0 {
            return Err(AppError::Config(
                "CIVIC_REMOTE_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        let log_json = match non_empty_var("CIVIC_LOG_JSON") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| AppError::Config(format!("CIVIC_LOG_JSON is not a boolean: {raw}")))?,
            None => false,
        };

        Ok(Self {
            api_key,
            model,
            model_base_url,
            database_url,
            remote_timeout: Duration::from_secs(remote_timeout_secs),
            log_json,
        })
    }

    pub fn has_model(&self) -> bool {
        self.api_key.is_some()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: [&str; 6] = [
        "GOOGLE_API_KEY",
        "CIVIC_MODEL",
        "CIVIC_MODEL_BASE_URL",
        "CIVIC_DATABASE_URL",
        "CIVIC_REMOTE_TIMEOUT_SECS",
        "CIVIC_LOG_JSON",
    ];

    fn with_env<F: FnOnce()>(set: &[(&str, &str)], f: F) {
        let vars: Vec<(&str, Option<&str>)> = ALL_VARS
            .iter()
            .map(|name| {
                let value = set.iter().find(|(k, _)| k == name).map(|(_, v)| *v);
                (*name, value)
            })
            .collect();
        temp_env::with_vars(vars, f);
    }

    #[test]
    fn test_defaults() {
        with_env(&[], || {
            let config = AppConfig::from_env().unwrap();
            assert!(!config.has_model());
            assert_eq!(config.model, DEFAULT_MODEL);
            assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
            assert_eq!(config.remote_timeout, Duration::from_secs(20));
            assert!(!config.log_json);
        });
    }

    #[test]
    fn test_overrides() {
        with_env(
            &[
                ("GOOGLE_API_KEY", "abc"),
                ("CIVIC_MODEL", "gemini-pro"),
                ("CIVIC_MODEL_BASE_URL", "http://localhost:9000"),
                ("CIVIC_REMOTE_TIMEOUT_SECS", "5"),
                ("CIVIC_LOG_JSON", "true"),
            ],
            || {
                let config = AppConfig::from_env().unwrap();
                assert_eq!(config.api_key.as_deref(), Some("abc"));
                assert_eq!(config.model, "gemini-pro");
                assert_eq!(config.model_base_url.as_str(), "http://localhost:9000/");
                assert_eq!(config.remote_timeout, Duration::from_secs(5));
                assert!(config.log_json);
            },
        );
    }

    #[test]
    fn test_blank_key_means_keyword_only() {
        with_env(&[("GOOGLE_API_KEY", "   ")], || {
            assert!(!AppConfig::from_env().unwrap().has_model());
        });
    }

    #[test]
    fn test_invalid_values() {
        with_env(&[("CIVIC_REMOTE_TIMEOUT_SECS", "soon")], || {
            assert!(matches!(AppConfig::from_env(), Err(AppError::Config(_))));
        });
        with_env(&[("CIVIC_MODEL_BASE_URL", "not a url")], || {
            assert!(matches!(AppConfig::from_env(), Err(AppError::Config(_))));
        });
        with_env(&[("CIVIC_LOG_JSON", "maybe")], || {
            assert!(matches!(AppConfig::from_env(), Err(AppError::Config(_))));
        });
    }
}
