//! Login code endpoints: issue, confirm and poll.

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, instrument};

use super::session::{AuthError, Authenticator, authenticate};
use super::types::{ConfirmCodeResponse, ErrorResponse, IssueCodeResponse, PollResponse};
use crate::handoff::{AwaitOutcome, HandshakeCoordinator, HandshakeError, LoginCode};

#[utoipa::path(
    get,
    path = "/login/code",
    responses(
        (status = 200, description = "Code issued", body = IssueCodeResponse),
        (status = 503, description = "No unique code could be issued", body = ErrorResponse)
    ),
    tag = "login"
)]
#[instrument(skip_all)]
pub async fn issue_code(coordinator: Extension<Arc<HandshakeCoordinator>>) -> Response {
    match coordinator.issue_code().await {
        Ok(code) => (
            StatusCode::OK,
            Json(IssueCodeResponse {
                code: code.to_string(),
            }),
        )
            .into_response(),
        Err(err) => handshake_error_response(&err).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/login/code/{code}/confirm",
    params(("code" = String, Path, description = "Code shown on the device being signed in")),
    responses(
        (status = 200, description = "Session handed over", body = ConfirmCodeResponse),
        (status = 400, description = "Malformed code", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 404, description = "Unknown code", body = ErrorResponse),
        (status = 409, description = "Code already confirmed", body = ErrorResponse),
        (status = 410, description = "Code expired, scan a new one", body = ErrorResponse),
        (status = 503, description = "Session service unavailable", body = ErrorResponse)
    ),
    security(("session" = [])),
    tag = "login"
)]
#[instrument(skip_all)]
pub async fn confirm_code(
    Path(code): Path<String>,
    headers: HeaderMap,
    coordinator: Extension<Arc<HandshakeCoordinator>>,
    authenticator: Extension<Arc<dyn Authenticator>>,
) -> Response {
    let session = match authenticate(&headers, authenticator.0.as_ref()).await {
        Ok(session) => session,
        Err(err) => return auth_error_response(&err).into_response(),
    };

    let Some(code) = LoginCode::parse(&code) else {
        return invalid_code_response().into_response();
    };

    match coordinator.confirm_code(&code, &session).await {
        Ok(()) => (StatusCode::OK, Json(ConfirmCodeResponse {})).into_response(),
        Err(err) => handshake_error_response(&err).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/login/code/{code}/poll",
    params(("code" = String, Path, description = "Code issued to this device")),
    responses(
        (status = 200, description = "Credential, or `timedOut` when the caller should poll again", body = PollResponse),
        (status = 400, description = "Malformed code", body = ErrorResponse),
        (status = 404, description = "Unknown code", body = ErrorResponse),
        (status = 410, description = "Code expired, request a new one", body = PollResponse)
    ),
    tag = "login"
)]
#[instrument(skip_all)]
pub async fn poll_code(
    Path(code): Path<String>,
    coordinator: Extension<Arc<HandshakeCoordinator>>,
) -> Response {
    let Some(code) = LoginCode::parse(&code) else {
        return invalid_code_response().into_response();
    };

    match coordinator.await_confirmation(&code).await {
        AwaitOutcome::Resolved(credential) => (
            StatusCode::OK,
            Json(PollResponse::Resolved {
                credential: credential.expose().to_string(),
            }),
        )
            .into_response(),
        AwaitOutcome::TimedOut => (
            StatusCode::OK,
            Json(PollResponse::TimedOut { timed_out: true }),
        )
            .into_response(),
        AwaitOutcome::Expired => (
            StatusCode::GONE,
            Json(PollResponse::Expired { expired: true }),
        )
            .into_response(),
        AwaitOutcome::NotFound => {
            handshake_error_response(&HandshakeError::UnknownCode).into_response()
        }
    }
}

pub(super) fn handshake_error_response(err: &HandshakeError) -> (StatusCode, Json<ErrorResponse>) {
    if !err.is_client_error() {
        error!("Login code operation failed: {err}");
    }
    let status = match err {
        HandshakeError::UnknownCode => StatusCode::NOT_FOUND,
        HandshakeError::AlreadyResolved => StatusCode::CONFLICT,
        HandshakeError::CodeExpired => StatusCode::GONE,
        HandshakeError::DuplicateCode
        | HandshakeError::IssueExhausted { .. }
        | HandshakeError::Entropy(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(ErrorResponse::new(err.kind(), err.to_string())))
}

fn auth_error_response(err: &AuthError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        AuthError::Missing | AuthError::Rejected => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("unauthenticated", err.to_string())),
        ),
        AuthError::Unavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("auth_unavailable", err.to_string())),
        ),
    }
}

fn invalid_code_response() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new("invalid_code", "Invalid login code")),
    )
}
