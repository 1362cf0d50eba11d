use crate::{
    api::{self, Authenticator, RemoteAuthenticator},
    handoff::{HandshakeConfig, HandshakeCoordinator},
};
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub handshake: HandshakeConfig,
    pub session_verify_url: Url,
    pub allowed_origin: Option<String>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the session client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let coordinator = Arc::new(HandshakeCoordinator::with_defaults(args.handshake));
    let authenticator: Arc<dyn Authenticator> =
        Arc::new(RemoteAuthenticator::new(args.session_verify_url)?);

    api::new(
        args.port,
        coordinator,
        authenticator,
        args.allowed_origin.as_deref(),
    )
    .await
}
