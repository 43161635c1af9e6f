//! Runtime settings for the management API, the mock surface, and storage.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_API_BASE: &str = "/api";
pub const DEFAULT_MOCK_BASE: &str = "/mock";
pub const DEFAULT_SCHEMAS_PATH: &str = "config/schemas.json";
pub const DEFAULT_DB_PATH: &str = "config/db.json";
pub const DEFAULT_MAX_RECORD_COUNT: u32 = 1000;
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Settings {
    pub port: u16,
    /// Base path of the schema management API (e.g. `/api`).
    pub api_base: String,
    /// Base path under which generated resources are served (e.g. `/mock`).
    pub mock_base: String,
    /// Artificial latency added to every mock response.
    pub delay: Option<Duration>,
    pub schemas_path: PathBuf,
    pub db_path: PathBuf,
    /// Upper bound for `count` on both create and update.
    pub max_record_count: u32,
    pub body_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            port: DEFAULT_PORT,
            api_base: DEFAULT_API_BASE.into(),
            mock_base: DEFAULT_MOCK_BASE.into(),
            delay: None,
            schemas_path: PathBuf::from(DEFAULT_SCHEMAS_PATH),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            max_record_count: DEFAULT_MAX_RECORD_COUNT,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl Settings {
    /// Settings with both documents placed in `dir`. Used by tests and embedders.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Settings {
            schemas_path: dir.join("schemas.json"),
            db_path: dir.join("db.json"),
            ..Settings::default()
        }
    }

    /// Public URL path of a resource, e.g. `/mock/users`.
    pub fn endpoint_for(&self, resource_name: &str) -> String {
        format!("{}/{}", self.mock_base, resource_name)
    }
}
