use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it from a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let api_base_url = require("CLASSIFIEDS_API_BASE_URL")?;
    if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: "CLASSIFIEDS_API_BASE_URL".to_string(),
            reason: format!("'{api_base_url}' is not an http(s) URL"),
        });
    }

    let env = parse_environment(&or_default("CLASSIFIEDS_ENV", "development"))?;
    let log_level = or_default("CLASSIFIEDS_LOG_LEVEL", "info");
    let categories_path = PathBuf::from(or_default(
        "CLASSIFIEDS_CATEGORIES_PATH",
        "./config/categories.yaml",
    ));
    let storage_path = PathBuf::from(or_default(
        "CLASSIFIEDS_STORAGE_PATH",
        "./.classifieds/storage.json",
    ));
    let auth_token = lookup("CLASSIFIEDS_AUTH_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty());

    let request_timeout_secs = parse_u64("CLASSIFIEDS_REQUEST_TIMEOUT_SECS", "15")?;
    if request_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "CLASSIFIEDS_REQUEST_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let user_agent = or_default(
        "CLASSIFIEDS_USER_AGENT",
        "classifieds/0.1 (marketplace-client)",
    );
    let filter_debounce_ms = parse_u64("CLASSIFIEDS_FILTER_DEBOUNCE_MS", "500")?;
    let scroll_throttle_ms = parse_u64("CLASSIFIEDS_SCROLL_THROTTLE_MS", "100")?;
    let scroll_threshold_px = parse_u32("CLASSIFIEDS_SCROLL_THRESHOLD_PX", "500")?;
    let scroll_guard_ms = parse_u64("CLASSIFIEDS_SCROLL_GUARD_MS", "1000")?;

    Ok(AppConfig {
        api_base_url,
        env,
        log_level,
        categories_path,
        storage_path,
        auth_token,
        request_timeout_secs,
        user_agent,
        filter_debounce_ms,
        scroll_throttle_ms,
        scroll_threshold_px,
        scroll_guard_ms,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CLASSIFIEDS_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
