use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use url::Url;

pub const ARG_SESSION_VERIFY_URL: &str = "session-verify-url";
pub const ARG_ALLOWED_ORIGIN: &str = "allowed-origin";

#[derive(Debug, Clone)]
pub struct Options {
    pub verify_url: Url,
    pub allowed_origin: Option<String>,
}

impl Options {
    /// Parse session arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the verify URL is missing or invalid.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let Some(verify_url) = get_non_empty(ARG_SESSION_VERIFY_URL) else {
            anyhow::bail!("missing required argument: --{ARG_SESSION_VERIFY_URL}");
        };
        let verify_url = Url::parse(&verify_url)
            .with_context(|| format!("invalid --{ARG_SESSION_VERIFY_URL}: {verify_url}"))?;
        if !matches!(verify_url.scheme(), "http" | "https") {
            anyhow::bail!("--{ARG_SESSION_VERIFY_URL} must be an http(s) URL: {verify_url}");
        }

        Ok(Self {
            verify_url,
            allowed_origin: get_non_empty(ARG_ALLOWED_ORIGIN),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_VERIFY_URL)
                .long(ARG_SESSION_VERIFY_URL)
                .help("Session service endpoint used to verify the confirming device")
                .long_help(
                    "Session service endpoint used to verify the confirming device.\n\nThe token is POSTed as {\"token\": \"...\"}. Any 2xx answer accepts it and an optional `subject` field names the user.",
                )
                .env("HANDOFF_SESSION_VERIFY_URL"),
        )
        .arg(
            Arg::new(ARG_ALLOWED_ORIGIN)
                .long(ARG_ALLOWED_ORIGIN)
                .help("Browser origin allowed to call the API (enables CORS)")
                .env("HANDOFF_ALLOWED_ORIGIN"),
        )
}
