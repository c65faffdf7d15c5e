use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value fails to parse. Missing credentials are
/// not errors; they leave the corresponding layer unconfigured.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value fails to parse.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup, so the
/// parsing logic can be tested with a plain `HashMap` instead of `set_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
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

    let env = parse_environment(&or_default("HACHIJO_ENV", "development"));
    let bind_addr = parse_addr("HACHIJO_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("HACHIJO_LOG_LEVEL", "info");
    let fetch_timeout_secs = parse_u64("HACHIJO_FETCH_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("HACHIJO_USER_AGENT", "hachijo-status/0.1");

    let odpt_consumer_key = lookup("ODPT_CONSUMER_KEY").ok();
    let google_maps_api_key = lookup("GOOGLE_MAPS_API_KEY").ok();

    // Service-role key outranks the anon key when both are present.
    let store_url = lookup("SUPABASE_URL").ok();
    let store_api_key = lookup("SUPABASE_SERVICE_ROLE_KEY")
        .or_else(|_| lookup("SUPABASE_ANON_KEY"))
        .ok();
    let reports_table = or_default("REPORTS_TABLE", "status_reports");
    let fallback_dir = PathBuf::from(or_default("REPORTS_FALLBACK_DIR", "data/reports"));

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        fetch_timeout_secs,
        user_agent,
        odpt_consumer_key,
        google_maps_api_key,
        store_url,
        store_api_key,
        reports_table,
        fallback_dir,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
mod tests {
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
    fn empty_env_builds_with_defaults() {
        let map: HashMap<&str, &str> = HashMap::new();
        let config = build_app_config(lookup_from_map(&map)).expect("defaults should build");

        assert_eq!(config.env, Environment::Development);
        assert_eq!(config.fetch_timeout_secs, 10);
        assert_eq!(config.reports_table, "status_reports");
        assert!(config.store_url.is_none());
        assert!(config.store_api_key.is_none());
        assert!(config.odpt_consumer_key.is_none());
    }

    #[test]
    fn service_role_key_wins_over_anon_key() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("SUPABASE_SERVICE_ROLE_KEY", "service-key");
        map.insert("SUPABASE_ANON_KEY", "anon-key");
        let config = build_app_config(lookup_from_map(&map)).expect("build");
        assert_eq!(config.store_api_key.as_deref(), Some("service-key"));
    }

    #[test]
    fn anon_key_is_used_when_service_role_key_is_absent() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("SUPABASE_ANON_KEY", "anon-key");
        let config = build_app_config(lookup_from_map(&map)).expect("build");
        assert_eq!(config.store_api_key.as_deref(), Some("anon-key"));
    }

    #[test]
    fn invalid_bind_addr_is_an_error() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("HACHIJO_BIND_ADDR", "not-an-addr");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "HACHIJO_BIND_ADDR"),
            "expected InvalidEnvVar(HACHIJO_BIND_ADDR), got: {result:?}"
        );
    }

    #[test]
    fn parse_environment_unknown_defaults_to_development() {
        assert_eq!(parse_environment("unknown"), Environment::Development);
        assert_eq!(parse_environment("production"), Environment::Production);
        assert_eq!(parse_environment("test"), Environment::Test);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("ODPT_CONSUMER_KEY", "super-secret");
        map.insert("SUPABASE_ANON_KEY", "anon-secret");
        let config = build_app_config(lookup_from_map(&map)).expect("build");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("anon-secret"));
        assert!(debug.contains("[redacted]"));
    }
}
