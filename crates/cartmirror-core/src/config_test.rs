use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_test() {
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "CARTMIRROR_ENV"));
}

#[test]
fn build_app_config_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert!(cfg.api_base_url.is_none());
    assert!(cfg.api_token.is_none());
    assert_eq!(cfg.catalog_path.to_str(), Some("./config/products.yaml"));
    assert_eq!(cfg.store_path.to_str(), Some("./.cartmirror/store.json"));
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.user_agent, "cartmirror/0.1 (floating-cart)");
    assert_eq!(cfg.max_retries, 0);
    assert_eq!(cfg.retry_backoff_base_secs, 1);
    assert_eq!(cfg.currency, "SAR");
    assert_eq!(cfg.currency_label, "ر.س");
    assert_eq!(cfg.countdown_reset_hour_utc, 21);
    assert_eq!(cfg.delays, RefreshDelays::default());
}

#[test]
fn build_app_config_treats_blank_api_url_as_absent() {
    let mut map = HashMap::new();
    map.insert("CARTMIRROR_API_BASE_URL", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.api_base_url.is_none());
}

#[test]
fn build_app_config_accepts_api_url_and_token() {
    let mut map = HashMap::new();
    map.insert("CARTMIRROR_API_BASE_URL", "https://api.example.test/store/v1");
    map.insert("CARTMIRROR_API_TOKEN", "secret-token");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.api_base_url.as_deref(),
        Some("https://api.example.test/store/v1")
    );
    assert_eq!(cfg.api_token.as_deref(), Some("secret-token"));
}

#[test]
fn build_app_config_rejects_non_http_api_url() {
    let mut map = HashMap::new();
    map.insert("CARTMIRROR_API_BASE_URL", "ftp://api.example.test");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CARTMIRROR_API_BASE_URL"),
        "expected InvalidEnvVar(CARTMIRROR_API_BASE_URL), got: {result:?}"
    );
}

#[test]
fn debug_redacts_api_token() {
    let mut map = HashMap::new();
    map.insert("CARTMIRROR_API_TOKEN", "secret-token");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("secret-token"));
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn build_app_config_request_timeout_override() {
    let mut map = HashMap::new();
    map.insert("CARTMIRROR_REQUEST_TIMEOUT_SECS", "5");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.request_timeout_secs, 5);
}

#[test]
fn build_app_config_request_timeout_invalid() {
    let mut map = HashMap::new();
    map.insert("CARTMIRROR_REQUEST_TIMEOUT_SECS", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CARTMIRROR_REQUEST_TIMEOUT_SECS"),
        "expected InvalidEnvVar(CARTMIRROR_REQUEST_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_max_retries_invalid() {
    let mut map = HashMap::new();
    map.insert("CARTMIRROR_MAX_RETRIES", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CARTMIRROR_MAX_RETRIES"),
        "expected InvalidEnvVar(CARTMIRROR_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn build_app_config_countdown_hour_out_of_range() {
    let mut map = HashMap::new();
    map.insert("CARTMIRROR_COUNTDOWN_RESET_HOUR_UTC", "24");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CARTMIRROR_COUNTDOWN_RESET_HOUR_UTC"),
        "expected InvalidEnvVar(CARTMIRROR_COUNTDOWN_RESET_HOUR_UTC), got: {result:?}"
    );
}

#[test]
fn build_app_config_delay_overrides() {
    let mut map = HashMap::new();
    map.insert("CARTMIRROR_DELAY_STRUCTURAL_MS", "150");
    map.insert("CARTMIRROR_DELAY_PLATFORM_MS", "750");
    map.insert("CARTMIRROR_DELAY_ADD_CLICK_MS", "1500");
    map.insert("CARTMIRROR_DELAY_ANALYTICS_MS", "50");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.delays,
        RefreshDelays {
            structural_ms: 150,
            platform_ms: 750,
            add_click_ms: 1500,
            analytics_ms: 50,
        }
    );
}

#[test]
fn build_app_config_delay_invalid() {
    let mut map = HashMap::new();
    map.insert("CARTMIRROR_DELAY_PLATFORM_MS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CARTMIRROR_DELAY_PLATFORM_MS"),
        "expected InvalidEnvVar(CARTMIRROR_DELAY_PLATFORM_MS), got: {result:?}"
    );
}

#[test]
fn build_app_config_currency_overrides() {
    let mut map = HashMap::new();
    map.insert("CARTMIRROR_CURRENCY", "AED");
    map.insert("CARTMIRROR_CURRENCY_LABEL", "د.إ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.currency, "AED");
    assert_eq!(cfg.currency_label, "د.إ");
}
