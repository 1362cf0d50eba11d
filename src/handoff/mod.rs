//! Cross-device login handshake.
//!
//! A desktop asks for a code, a device that is already signed in confirms it
//! with its own session, and the desktop polls until that session is handed
//! over or the code expires.

pub mod code;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod poll;
pub mod store;

pub use code::{CodeSource, LoginCode, RandomCodeGenerator};
pub use config::HandshakeConfig;
pub use coordinator::{AuthenticatedSession, AwaitOutcome, HandshakeCoordinator};
pub use error::HandshakeError;
pub use store::{CorrelationEntry, CorrelationStore, EntryState, SessionCredential, spawn_sweeper};
