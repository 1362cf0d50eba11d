use crate::handoff::{HandshakeCoordinator, spawn_sweeper};
use anyhow::{Context, Result, anyhow};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{
        HeaderName, HeaderValue, Method, Request,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::watch};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, error, info, info_span};
use ulid::Ulid;
use url::Url;
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;
mod openapi;

pub use handlers::{AuthError, Authenticator, RemoteAuthenticator};
pub use openapi::openapi;

/// Routes for the handshake, health and API docs, without CORS.
#[must_use]
pub fn router(
    coordinator: Arc<HandshakeCoordinator>,
    authenticator: Arc<dyn Authenticator>,
) -> Router {
    Router::new()
        .route("/login/code", get(handlers::issue_code))
        .route("/login/code/:code/confirm", get(handlers::confirm_code))
        .route("/login/code/:code/poll", get(handlers::poll_code))
        .route("/health", get(handlers::health).options(handlers::health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(coordinator))
                .layer(Extension(authenticator)),
        )
}

/// Serve the API until SIGINT or SIGTERM.
///
/// The expiry sweeper runs alongside the server and is stopped once the
/// server has drained.
///
/// # Errors
/// Returns an error if the origin is invalid or the listener fails.
pub async fn new(
    port: u16,
    coordinator: Arc<HandshakeCoordinator>,
    authenticator: Arc<dyn Authenticator>,
    allowed_origin: Option<&str>,
) -> Result<()> {
    let cors = allowed_origin.map(cors_layer).transpose()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = spawn_sweeper(
        coordinator.store().clone(),
        coordinator.config().sweep_interval(),
        shutdown_rx,
    );

    let app = router(coordinator, authenticator);
    let app = match cors {
        Some(cors) => app.layer(cors),
        None => app,
    };

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Gracefully shutdown");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    if let Err(err) = sweeper.await {
        error!("Sweeper task failed: {err}");
    }

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn cors_layer(allowed_origin: &str) -> Result<CorsLayer> {
    Ok(CorsLayer::new()
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(handlers::SESSION_HEADER),
        ])
        .allow_methods([Method::GET])
        .allow_origin(AllowOrigin::exact(origin_header(allowed_origin)?))
        .allow_credentials(true))
}

fn origin_header(allowed_origin: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(allowed_origin)
        .with_context(|| format!("Invalid allowed origin: {allowed_origin}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Allowed origin must include a valid host: {allowed_origin}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build allowed origin header")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to register SIGINT handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to register SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
