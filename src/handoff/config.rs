use std::time::Duration;

use super::code::DEFAULT_CODE_LENGTH;

const DEFAULT_CODE_TTL: Duration = Duration::from_secs(10);
const DEFAULT_POLL_WINDOW: Duration = Duration::from_secs(10);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);
const DEFAULT_GRACE: Duration = Duration::from_secs(30);
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_MAX_ISSUE_ATTEMPTS: u32 = 5;

/// Timing and retry policy for the login handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandshakeConfig {
    code_length: usize,
    code_ttl: Duration,
    poll_window: Duration,
    poll_interval: Duration,
    grace: Duration,
    sweep_interval: Duration,
    max_issue_attempts: u32,
}

impl HandshakeConfig {
    /// Defaults: 8 character codes valid for 10s, 10s poll window checked
    /// every 200ms, 30s grace before terminal entries are collected, sweep
    /// every 30s, and up to 5 attempts to find an unused code.
    #[must_use]
    pub fn new() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            code_ttl: DEFAULT_CODE_TTL,
            poll_window: DEFAULT_POLL_WINDOW,
            poll_interval: DEFAULT_POLL_INTERVAL,
            grace: DEFAULT_GRACE,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            max_issue_attempts: DEFAULT_MAX_ISSUE_ATTEMPTS,
        }
    }

    #[must_use]
    pub fn with_code_length(mut self, length: usize) -> Self {
        self.code_length = length;
        self
    }

    #[must_use]
    pub fn with_code_ttl(mut self, ttl: Duration) -> Self {
        self.code_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_poll_window(mut self, window: Duration) -> Self {
        self.poll_window = window;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    #[must_use]
    pub fn with_max_issue_attempts(mut self, attempts: u32) -> Self {
        self.max_issue_attempts = attempts;
        self
    }

    /// Replace zero values that would turn the poll loop into a spin or
    /// disable expiry.
    #[must_use]
    pub fn normalize(self) -> Self {
        let nonzero = |value: Duration, fallback: Duration| {
            if value.is_zero() {
                fallback
            } else {
                value
            }
        };
        Self {
            code_length: self.code_length,
            code_ttl: nonzero(self.code_ttl, Duration::from_secs(1)),
            poll_window: nonzero(self.poll_window, Duration::from_secs(1)),
            poll_interval: nonzero(self.poll_interval, Duration::from_millis(10)),
            grace: self.grace,
            sweep_interval: nonzero(self.sweep_interval, Duration::from_secs(1)),
            max_issue_attempts: self.max_issue_attempts.max(1),
        }
    }

    #[must_use]
    pub fn code_length(&self) -> usize {
        self.code_length
    }

    #[must_use]
    pub fn code_ttl(&self) -> Duration {
        self.code_ttl
    }

    #[must_use]
    pub fn poll_window(&self) -> Duration {
        self.poll_window
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    #[must_use]
    pub fn grace(&self) -> Duration {
        self.grace
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    #[must_use]
    pub fn max_issue_attempts(&self) -> u32 {
        self.max_issue_attempts
    }
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_overrides() {
        let config = HandshakeConfig::new();
        assert_eq!(config.code_length(), DEFAULT_CODE_LENGTH);
        assert_eq!(config.code_ttl(), DEFAULT_CODE_TTL);
        assert_eq!(config.poll_window(), Duration::from_secs(10));
        assert_eq!(config.poll_interval(), DEFAULT_POLL_INTERVAL);
        assert_eq!(config.max_issue_attempts(), DEFAULT_MAX_ISSUE_ATTEMPTS);

        let config = config
            .with_code_length(12)
            .with_code_ttl(Duration::from_secs(120))
            .with_poll_window(Duration::from_secs(20))
            .with_poll_interval(Duration::from_millis(50))
            .with_grace(Duration::from_secs(5))
            .with_sweep_interval(Duration::from_secs(60))
            .with_max_issue_attempts(2);

        assert_eq!(config.code_length(), 12);
        assert_eq!(config.code_ttl(), Duration::from_secs(120));
        assert_eq!(config.poll_window(), Duration::from_secs(20));
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
        assert_eq!(config.grace(), Duration::from_secs(5));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.max_issue_attempts(), 2);
    }

    #[test]
    fn normalize_replaces_zero_values() {
        let config = HandshakeConfig::new()
            .with_code_ttl(Duration::ZERO)
            .with_poll_window(Duration::ZERO)
            .with_poll_interval(Duration::ZERO)
            .with_sweep_interval(Duration::ZERO)
            .with_grace(Duration::ZERO)
            .with_max_issue_attempts(0)
            .normalize();

        assert_eq!(config.code_ttl(), Duration::from_secs(1));
        assert_eq!(config.poll_window(), Duration::from_secs(1));
        assert_eq!(config.poll_interval(), Duration::from_millis(10));
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
        assert_eq!(config.grace(), Duration::ZERO);
        assert_eq!(config.max_issue_attempts(), 1);
    }
}
