//! # Handoff (cross-device login)
//!
//! `handoff` moves a live session from a device the user is already signed in
//! on (the companion app) to one that is not (a desktop browser) through a
//! short code the user scans or types.
//!
//! ## Handshake
//!
//! 1. The desktop calls `GET /login/code` and shows the code, usually as a QR image.
//! 2. The desktop calls `GET /login/code/{code}/poll`. Each call waits up to the
//!    poll window (10s by default) and answers with the credential, or with
//!    `{"timedOut": true}` so the desktop polls again.
//! 3. The signed-in device calls `GET /login/code/{code}/confirm` with its own
//!    session. The session is verified before it is handed over.
//!
//! Codes live only in memory. Unconfirmed codes expire, and every entry is
//! eventually swept, so abandoned codes do not accumulate.

pub mod api;
pub mod cli;
pub mod handoff;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
