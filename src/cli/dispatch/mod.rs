//! Maps parsed CLI arguments to the action to run.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_PORT, handshake, session};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);

    let session_opts = session::Options::parse(matches)?;
    let handshake_opts = handshake::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        handshake: handshake_opts.config(),
        session_verify_url: session_opts.verify_url,
        allowed_origin: session_opts.allowed_origin,
    }))
}
