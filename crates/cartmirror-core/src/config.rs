use crate::app_config::{AppConfig, Environment, RefreshDelays};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Skips `.env` loading; the caller owns the process environment.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable is optional; absent or empty values take their defaults.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default =
        |var: &str, default: &str| -> String { optional(var).unwrap_or_else(|| default.to_string()) };

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

    let env = parse_environment(&or_default("CARTMIRROR_ENV", "development"))?;
    let log_level = or_default("CARTMIRROR_LOG_LEVEL", "info");

    let api_base_url = optional("CARTMIRROR_API_BASE_URL");
    if let Some(url) = &api_base_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidEnvVar {
                var: "CARTMIRROR_API_BASE_URL".to_string(),
                reason: format!("\"{url}\" is not an http(s) URL"),
            });
        }
    }
    let api_token = optional("CARTMIRROR_API_TOKEN");

    let catalog_path = PathBuf::from(or_default("CARTMIRROR_CATALOG_PATH", "./config/products.yaml"));
    let store_path = PathBuf::from(or_default("CARTMIRROR_STORE_PATH", "./.cartmirror/store.json"));

    let request_timeout_secs = parse_u64("CARTMIRROR_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("CARTMIRROR_USER_AGENT", "cartmirror/0.1 (floating-cart)");
    let max_retries = parse_u32("CARTMIRROR_MAX_RETRIES", "0")?;
    let retry_backoff_base_secs = parse_u64("CARTMIRROR_RETRY_BACKOFF_BASE_SECS", "1")?;

    let currency = or_default("CARTMIRROR_CURRENCY", "SAR");
    let currency_label = or_default("CARTMIRROR_CURRENCY_LABEL", "ر.س");
    let summary_placeholder_title = or_default("CARTMIRROR_SUMMARY_TITLE", "عناصر السلة");

    let countdown_reset_hour_utc = parse_u32("CARTMIRROR_COUNTDOWN_RESET_HOUR_UTC", "21")?;
    if countdown_reset_hour_utc > 23 {
        return Err(ConfigError::InvalidEnvVar {
            var: "CARTMIRROR_COUNTDOWN_RESET_HOUR_UTC".to_string(),
            reason: format!("hour {countdown_reset_hour_utc} is outside 0-23"),
        });
    }

    let defaults = RefreshDelays::default();
    let delays = RefreshDelays {
        structural_ms: parse_u64(
            "CARTMIRROR_DELAY_STRUCTURAL_MS",
            &defaults.structural_ms.to_string(),
        )?,
        platform_ms: parse_u64("CARTMIRROR_DELAY_PLATFORM_MS", &defaults.platform_ms.to_string())?,
        add_click_ms: parse_u64("CARTMIRROR_DELAY_ADD_CLICK_MS", &defaults.add_click_ms.to_string())?,
        analytics_ms: parse_u64("CARTMIRROR_DELAY_ANALYTICS_MS", &defaults.analytics_ms.to_string())?,
    };

    Ok(AppConfig {
        env,
        log_level,
        api_base_url,
        api_token,
        catalog_path,
        store_path,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_secs,
        currency,
        currency_label,
        summary_placeholder_title,
        countdown_reset_hour_utc,
        delays,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CARTMIRROR_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
