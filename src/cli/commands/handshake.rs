//! Timing and sizing of login codes.

use crate::handoff::HandshakeConfig;
use clap::{Arg, ArgMatches, Command};
use std::time::Duration;

pub const ARG_CODE_LENGTH: &str = "code-length";
pub const ARG_CODE_TTL_SECONDS: &str = "code-ttl-seconds";
pub const ARG_POLL_WINDOW_SECONDS: &str = "poll-window-seconds";
pub const ARG_POLL_INTERVAL_MS: &str = "poll-interval-ms";
pub const ARG_GRACE_SECONDS: &str = "grace-seconds";
pub const ARG_SWEEP_INTERVAL_SECONDS: &str = "sweep-interval-seconds";
pub const ARG_MAX_ISSUE_ATTEMPTS: &str = "max-issue-attempts";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub code_length: u8,
    pub code_ttl_seconds: u64,
    pub poll_window_seconds: u64,
    pub poll_interval_ms: u64,
    pub grace_seconds: u64,
    pub sweep_interval_seconds: u64,
    pub max_issue_attempts: u32,
}

impl Options {
    /// Parse handshake arguments from matches.
    ///
    /// # Errors
    /// Returns an error if an argument is missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let get_u64 = |id: &str| {
            matches
                .get_one::<u64>(id)
                .copied()
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        Ok(Self {
            code_length: matches
                .get_one::<u8>(ARG_CODE_LENGTH)
                .copied()
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_CODE_LENGTH}"))?,
            code_ttl_seconds: get_u64(ARG_CODE_TTL_SECONDS)?,
            poll_window_seconds: get_u64(ARG_POLL_WINDOW_SECONDS)?,
            poll_interval_ms: get_u64(ARG_POLL_INTERVAL_MS)?,
            grace_seconds: get_u64(ARG_GRACE_SECONDS)?,
            sweep_interval_seconds: get_u64(ARG_SWEEP_INTERVAL_SECONDS)?,
            max_issue_attempts: matches
                .get_one::<u32>(ARG_MAX_ISSUE_ATTEMPTS)
                .copied()
                .ok_or_else(|| {
                    anyhow::anyhow!("missing required argument: --{ARG_MAX_ISSUE_ATTEMPTS}")
                })?,
        })
    }

    #[must_use]
    pub fn config(&self) -> HandshakeConfig {
        HandshakeConfig::new()
            .with_code_length(usize::from(self.code_length))
            .with_code_ttl(Duration::from_secs(self.code_ttl_seconds))
            .with_poll_window(Duration::from_secs(self.poll_window_seconds))
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_grace(Duration::from_secs(self.grace_seconds))
            .with_sweep_interval(Duration::from_secs(self.sweep_interval_seconds))
            .with_max_issue_attempts(self.max_issue_attempts)
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_CODE_LENGTH)
                .long(ARG_CODE_LENGTH)
                .help("Number of characters in a login code")
                .env("HANDOFF_CODE_LENGTH")
                .default_value("8")
                .value_parser(clap::value_parser!(u8).range(4..=32)),
        )
        .arg(
            Arg::new(ARG_CODE_TTL_SECONDS)
                .long(ARG_CODE_TTL_SECONDS)
                .help("Seconds an unconfirmed code stays valid")
                .env("HANDOFF_CODE_TTL_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_POLL_WINDOW_SECONDS)
                .long(ARG_POLL_WINDOW_SECONDS)
                .help("Seconds a single poll request waits for confirmation")
                .env("HANDOFF_POLL_WINDOW_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_POLL_INTERVAL_MS)
                .long(ARG_POLL_INTERVAL_MS)
                .help("Milliseconds between checks while a poll request waits")
                .env("HANDOFF_POLL_INTERVAL_MS")
                .default_value("200")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_GRACE_SECONDS)
                .long(ARG_GRACE_SECONDS)
                .help("Seconds a finished code is kept so late polls still see the outcome")
                .env("HANDOFF_GRACE_SECONDS")
                .default_value("30")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_SWEEP_INTERVAL_SECONDS)
                .long(ARG_SWEEP_INTERVAL_SECONDS)
                .help("Seconds between sweeps of stale codes")
                .env("HANDOFF_SWEEP_INTERVAL_SECONDS")
                .default_value("30")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_MAX_ISSUE_ATTEMPTS)
                .long(ARG_MAX_ISSUE_ATTEMPTS)
                .help("Attempts to find an unused code before giving up")
                .env("HANDOFF_MAX_ISSUE_ATTEMPTS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
}
