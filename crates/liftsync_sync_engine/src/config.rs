//! Configuration for the sync engine.

use chrono::FixedOffset;
use std::time::Duration;

/// Default store key for the pending outbox.
pub const OUTBOX_KEY: &str = "outbox.pending";
/// Default store key for dead letters.
pub const DEAD_LETTER_KEY: &str = "outbox.dead_letter";
/// Default store key for the paused-session draft.
pub const DRAFT_KEY: &str = "session.draft";

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Store key holding the pending outbox.
    pub outbox_key: String,
    /// Store key holding dead letters.
    pub dead_letter_key: String,
    /// Store key holding the paused-session draft.
    pub draft_key: String,
    /// Server-error attempts before a job moves to dead letters.
    pub max_attempts: u32,
    /// Server failures are reported to telemetry up to this attempt.
    pub telemetry_attempt_limit: u32,
    /// Backend base URL.
    pub base_url: String,
    /// Request timeout handed to the HTTP client.
    pub timeout: Duration,
    /// Drain the outbox after a successful direct save.
    pub auto_drain: bool,
    /// Offset used to find the local week of a workout. `None` uses the
    /// system time zone.
    pub utc_offset: Option<FixedOffset>,
}

impl SyncConfig {
    /// Creates a configuration for the given backend.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            outbox_key: OUTBOX_KEY.to_string(),
            dead_letter_key: DEAD_LETTER_KEY.to_string(),
            draft_key: DRAFT_KEY.to_string(),
            max_attempts: 5,
            telemetry_attempt_limit: 2,
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            auto_drain: true,
            utc_offset: None,
        }
    }

    /// Sets the outbox and dead-letter keys.
    pub fn with_outbox_keys(mut self, outbox: impl Into<String>, dead_letter: impl Into<String>) -> Self {
        self.outbox_key = outbox.into();
        self.dead_letter_key = dead_letter.into();
        self
    }

    /// Sets the draft key.
    pub fn with_draft_key(mut self, key: impl Into<String>) -> Self {
        self.draft_key = key.into();
        self
    }

    /// Sets the attempt budget for server errors. Clamped to at least 1.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Sets the last attempt that is reported to telemetry.
    pub fn with_telemetry_attempt_limit(mut self, limit: u32) -> Self {
        self.telemetry_attempt_limit = limit;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables the drain after a successful submit.
    pub fn with_auto_drain(mut self, enabled: bool) -> Self {
        self.auto_drain = enabled;
        self
    }

    /// Pins the offset used for week calculation.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = Some(offset);
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.outbox_key, "outbox.pending");
        assert_eq!(config.dead_letter_key, "outbox.dead_letter");
        assert_eq!(config.draft_key, "session.draft");
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.telemetry_attempt_limit, 2);
        assert!(config.auto_drain);
    }

    #[test]
    fn sync_config_builder() {
        let config = SyncConfig::new("https://api.example.com")
            .with_outbox_keys("q", "dlq")
            .with_max_attempts(0)
            .with_timeout(Duration::from_secs(5))
            .with_auto_drain(false);

        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.outbox_key, "q");
        assert_eq!(config.dead_letter_key, "dlq");
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!config.auto_drain);
    }
}
