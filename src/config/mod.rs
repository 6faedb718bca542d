//! Configuration handling for the application.
//!
//! Everything here is process-level plumbing: where the data file lives, how
//! patient the fetcher is, how thumbnails get bounded. User-facing state
//! (saved cars, scoring weights, the EV-only mode flag) is persisted in the
//! store instead, so it survives across machines the way the data file does.
//! `Config::from_env` loads with sensible development defaults.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Environment variable names. Keeping them public lets other crates (tests,
/// build scripts) refer to them if needed later.
pub const ENV_DATA_FILE: &str = "EVSCOUT_DATA_FILE";
pub const ENV_SETTLE_MS: &str = "EVSCOUT_SETTLE_MS";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "EVSCOUT_HTTP_TIMEOUT_SECS";
pub const ENV_THUMBNAIL_TIMEOUT_MS: &str = "EVSCOUT_THUMBNAIL_TIMEOUT_MS";

/// Default development values used when environment variables are absent.
const DEFAULT_DATA_FILE: &str = "evscout.json";
const DEFAULT_SETTLE_MS: u64 = 1000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;
const DEFAULT_THUMBNAIL_TIMEOUT_MS: u64 = 5000;

/// Application runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    data_file: String,
    settle_ms: u64,
    http_timeout_secs: u64,
    thumbnail_timeout_ms: u64,
}

impl Config {
    /// Create a new config explicitly.
    pub fn new(
        data_file: impl Into<String>,
        settle_ms: u64,
        http_timeout_secs: u64,
        thumbnail_timeout_ms: u64,
    ) -> Self {
        Self {
            data_file: data_file.into(),
            settle_ms,
            http_timeout_secs,
            thumbnail_timeout_ms,
        }
    }

    /// Load from environment variables, falling back to development defaults.
    ///
    /// String values are taken as-is; numeric values must parse or this
    /// returns a `ConfigError` naming the offending variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_file = env::var(ENV_DATA_FILE).unwrap_or_else(|_| DEFAULT_DATA_FILE.to_string());
        let settle_ms = parse_u64(ENV_SETTLE_MS, DEFAULT_SETTLE_MS)?;
        let http_timeout_secs = parse_u64(ENV_HTTP_TIMEOUT_SECS, DEFAULT_HTTP_TIMEOUT_SECS)?;
        let thumbnail_timeout_ms =
            parse_u64(ENV_THUMBNAIL_TIMEOUT_MS, DEFAULT_THUMBNAIL_TIMEOUT_MS)?;
        if http_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_HTTP_TIMEOUT_SECS,
                reason: "timeout must be at least one second".to_string(),
            });
        }
        Ok(Self {
            data_file,
            settle_ms,
            http_timeout_secs,
            thumbnail_timeout_ms,
        })
    }

    /// Path of the JSON document that backs the store.
    pub fn data_file(&self) -> &str {
        &self.data_file
    }
    /// Pause between recognizing a listing page and extracting from it.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
    /// Overall per-request timeout for page fetches.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
    /// Upper bound on a single photo-to-thumbnail conversion.
    pub fn thumbnail_timeout(&self) -> Duration {
        Duration::from_millis(self.thumbnail_timeout_ms)
    }

}

/// Development defaults, mirroring `from_env` with no overrides set.
impl Default for Config {
    fn default() -> Self {
        Self::new(
            DEFAULT_DATA_FILE,
            DEFAULT_SETTLE_MS,
            DEFAULT_HTTP_TIMEOUT_SECS,
            DEFAULT_THUMBNAIL_TIMEOUT_MS,
        )
    }
}

fn parse_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            field: key,
            reason: format!("expected an integer, got '{raw}'"),
        }),
        Err(_) => Ok(default),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Ensure environment-variable manipulating tests run serially.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            ENV_DATA_FILE,
            ENV_SETTLE_MS,
            ENV_HTTP_TIMEOUT_SECS,
            ENV_THUMBNAIL_TIMEOUT_MS,
        ] {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn defaults_when_env_missing() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.data_file(), super::DEFAULT_DATA_FILE);
        assert_eq!(cfg.settle_delay(), Duration::from_millis(1000));
        assert_eq!(cfg.http_timeout(), Duration::from_secs(20));
        assert_eq!(cfg.thumbnail_timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn overrides_when_env_present() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_DATA_FILE, "/tmp/cars.json");
            env::set_var(ENV_SETTLE_MS, "250");
            env::set_var(ENV_HTTP_TIMEOUT_SECS, "5");
            env::set_var(ENV_THUMBNAIL_TIMEOUT_MS, "800");
        }
        let cfg = Config::from_env().unwrap();
        clear_env();
        assert_eq!(cfg.data_file(), "/tmp/cars.json");
        assert_eq!(cfg.settle_delay(), Duration::from_millis(250));
        assert_eq!(cfg.http_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.thumbnail_timeout(), Duration::from_millis(800));
    }

    #[test]
    fn rejects_unparseable_numbers() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_SETTLE_MS, "soon");
        }
        let err = Config::from_env().unwrap_err();
        clear_env();
        match err {
            ConfigError::InvalidValue { field, .. } => assert_eq!(field, ENV_SETTLE_MS),
        }
    }

    #[test]
    fn rejects_zero_timeout() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_HTTP_TIMEOUT_SECS, "0");
        }
        let err = Config::from_env().unwrap_err();
        clear_env();
        match err {
            ConfigError::InvalidValue { field, .. } => assert_eq!(field, ENV_HTTP_TIMEOUT_SECS),
        }
    }
}
