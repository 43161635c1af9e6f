//! Load settings from the process environment (`.env` is applied by the binary).

use crate::config::types::*;
use crate::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Settings::default();

        let delay_ms: Option<u64> = parse_opt(&get, "DELAY")?;
        let settings = Settings {
            port: parse_opt(&get, "PORT")?.unwrap_or(defaults.port),
            api_base: get("API_BASE").map(|p| normalize_base(&p)).unwrap_or(defaults.api_base),
            mock_base: get("API_URL").map(|p| normalize_base(&p)).unwrap_or(defaults.mock_base),
            delay: delay_ms.filter(|ms| *ms > 0).map(Duration::from_millis),
            schemas_path: get("SCHEMAS_PATH").map(PathBuf::from).unwrap_or(defaults.schemas_path),
            db_path: get("DB_PATH").map(PathBuf::from).unwrap_or(defaults.db_path),
            max_record_count: parse_opt(&get, "MAX_RECORD_COUNT")?.unwrap_or(defaults.max_record_count),
            body_limit: parse_opt(&get, "BODY_LIMIT")?.unwrap_or(defaults.body_limit),
        };
        if settings.max_record_count == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_RECORD_COUNT",
                value: "0".into(),
            });
        }
        Ok(settings)
    }
}

fn parse_opt<T, G>(get: &G, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

/// Leading slash, no trailing slash: `mock/` -> `/mock`. The root collapses to an empty prefix.
pub fn normalize_base(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
