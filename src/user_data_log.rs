//! Rate-limited logging of problems found in client-supplied data.
//!
//! A misbehaving client (or an attacker) can send the same broken header on
//! every request. Logging each occurrence at `warn` would flood the logs, so
//! the first occurrence is logged at `warn` and the following ones are
//! demoted to `debug` until the suppression window has elapsed.
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// How problems with client-supplied data are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UserDataLogMode {
    /// Never log.
    None,
    /// Log every occurrence at `debug`.
    DebugAll,
    /// Log every occurrence at `warn`.
    WarnAll,
    /// Log at `warn` once per suppression window, at `debug` otherwise.
    #[default]
    WarnThenDebug,
}

/// Rate limiting of the log messages about malformed client cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UserDataLogConfig {
    /// The logging mode. Defaults to [`UserDataLogMode::WarnThenDebug`].
    pub mode: UserDataLogMode,
    /// Length of the window, in seconds, during which repeated occurrences are
    /// demoted to `debug` in [`UserDataLogMode::WarnThenDebug`] mode.
    ///
    /// A negative value means that only the very first occurrence is ever
    /// logged at `warn`. Defaults to one day.
    pub suppression_secs: i64,
}

impl Default for UserDataLogConfig {
    fn default() -> Self {
        UserDataLogConfig {
            mode: UserDataLogMode::WarnThenDebug,
            suppression_secs: 86_400,
        }
    }
}

/// The level a single occurrence should be logged at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogLevel {
    Debug,
    Warn,
    /// `warn`, noting that further occurrences go to `debug`.
    WarnThenDebug,
}

#[derive(Debug)]
pub(crate) struct UserDataLog {
    mode: UserDataLogMode,
    suppression: Option<Duration>,
    last_warn: Mutex<Option<Instant>>,
}

impl UserDataLog {
    pub(crate) fn new(config: UserDataLogConfig) -> Self {
        let suppression = u64::try_from(config.suppression_secs)
            .ok()
            .map(Duration::from_secs);
        UserDataLog {
            mode: config.mode,
            suppression,
            last_warn: Mutex::new(None),
        }
    }

    /// Decides how the next occurrence should be logged, if at all.
    pub(crate) fn next_level(&self) -> Option<LogLevel> {
        match self.mode {
            UserDataLogMode::None => None,
            UserDataLogMode::DebugAll => {
                log::log_enabled!(log::Level::Debug).then_some(LogLevel::Debug)
            }
            UserDataLogMode::WarnAll => {
                log::log_enabled!(log::Level::Warn).then_some(LogLevel::Warn)
            }
            UserDataLogMode::WarnThenDebug => {
                if self.claim_warn(Instant::now()) {
                    log::log_enabled!(log::Level::Warn).then_some(LogLevel::WarnThenDebug)
                } else {
                    log::log_enabled!(log::Level::Debug).then_some(LogLevel::Debug)
                }
            }
        }
    }

    /// Logs `message` at the level picked by [`UserDataLog::next_level`].
    pub(crate) fn log(&self, message: std::fmt::Arguments<'_>) {
        match self.next_level() {
            None => {}
            Some(LogLevel::Debug) => log::debug!("{message}"),
            Some(LogLevel::Warn) => log::warn!("{message}"),
            Some(LogLevel::WarnThenDebug) => log::warn!(
                "{message} Note: further occurrences of this error will be logged at DEBUG level."
            ),
        }
    }

    fn claim_warn(&self, now: Instant) -> bool {
        let mut last_warn = self.last_warn.lock().unwrap_or_else(PoisonError::into_inner);
        let claimed = match (*last_warn, self.suppression) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(last), Some(window)) => now.saturating_duration_since(last) >= window,
        };
        if claimed {
            *last_warn = Some(now);
        }
        claimed
    }
}
