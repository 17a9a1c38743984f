//! Opt-in diagnostic output.
//!
//! Library code only emits `tracing` events. Nothing is printed unless the
//! application calls [`init`] with `CILANTRO_LOG` set, which installs a global
//! fmt subscriber at `DEBUG` level.

use std::ffi::OsStr;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Environment variable that switches logging on when set to a non-empty value.
pub const LOG_ENV: &str = "CILANTRO_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    pub enabled: bool,
    pub max_level: Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { enabled: false, max_level: Level::DEBUG }
    }
}

impl LogConfig {
    /// Reads [`LOG_ENV`] from the process environment.
    pub fn from_env() -> Self {
        Self::from_value(std::env::var_os(LOG_ENV).as_deref())
    }

    fn from_value(value: Option<&OsStr>) -> Self {
        Self { enabled: value.is_some_and(|value| !value.is_empty()), ..Self::default() }
    }
}

/// Installs the global subscriber when [`LOG_ENV`] is set.
///
/// Returns whether a subscriber was installed by this call.
pub fn init() -> bool {
    init_with(LogConfig::from_env())
}

/// Installs a global fmt subscriber according to `config`.
///
/// Returns `false` when logging is disabled or another global subscriber is
/// already in place.
pub fn init_with(config: LogConfig) -> bool {
    if !config.enabled {
        return false;
    }

    let subscriber = FmtSubscriber::builder().with_max_level(config.max_level).finish();
    let installed = tracing::subscriber::set_global_default(subscriber).is_ok();
    if installed {
        tracing::debug!(max_level = %config.max_level, "logging initialized");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_without_variable() {
        assert_eq!(LogConfig::from_value(None), LogConfig::default());
        assert!(!LogConfig::from_value(Some(OsStr::new(""))).enabled);
    }

    #[test]
    fn enabled_with_any_value() {
        let config = LogConfig::from_value(Some(OsStr::new("1")));

        assert!(config.enabled);
        assert_eq!(config.max_level, Level::DEBUG);
    }

    #[test]
    fn disabled_config_installs_nothing() {
        assert!(!init_with(LogConfig::default()));
    }
}
