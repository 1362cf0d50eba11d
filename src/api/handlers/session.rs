//! Session verification for the confirming device.
//!
//! The session token is read from `X-Session` or an `Authorization: Bearer`
//! header and checked against the session service before it is handed over.
//! Unverified header values are never passed on.

use async_trait::async_trait;
use axum::http::{HeaderMap, header::AUTHORIZATION};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, instrument};
use url::Url;

use crate::APP_USER_AGENT;
use crate::handoff::{AuthenticatedSession, SessionCredential};

pub const SESSION_HEADER: &str = "x-session";

const VERIFY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing session token")]
    Missing,
    #[error("session rejected")]
    Rejected,
    #[error("session verification unavailable")]
    Unavailable,
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Verify `token`, returning the subject it belongs to when known.
    async fn verify(&self, token: &str) -> Result<Option<String>, AuthError>;
}

/// Verifies sessions by posting them to the session service.
///
/// Any 2xx answer is a valid session; an optional `subject` field in the
/// JSON body names the user.
#[derive(Debug, Clone)]
pub struct RemoteAuthenticator {
    client: Client,
    verify_url: Url,
}

impl RemoteAuthenticator {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(verify_url: Url) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(VERIFY_TIMEOUT)
            .build()?;
        Ok(Self { client, verify_url })
    }

    #[must_use]
    pub fn verify_url(&self) -> &Url {
        &self.verify_url
    }
}

#[async_trait]
impl Authenticator for RemoteAuthenticator {
    #[instrument(skip_all, fields(url = %self.verify_url))]
    async fn verify(&self, token: &str) -> Result<Option<String>, AuthError> {
        let response = self
            .client
            .post(self.verify_url.clone())
            .json(&json!({ "token": token }))
            .send()
            .await
            .map_err(|err| {
                error!("Error verifying session: {err}");
                AuthError::Unavailable
            })?;

        let status = response.status();
        if status.is_server_error() {
            error!("Session service failed: {status}");
            return Err(AuthError::Unavailable);
        }
        if !status.is_success() {
            debug!("Session rejected: {status}");
            return Err(AuthError::Rejected);
        }

        // An empty or non-JSON body still means the session is valid.
        let body: Value = response.json().await.unwrap_or(Value::Null);
        Ok(body["subject"].as_str().map(str::to_string))
    }
}

/// Resolve request headers into a verified session.
///
/// # Errors
/// Returns `AuthError::Missing` without a token, otherwise whatever the
/// authenticator reports.
pub async fn authenticate(
    headers: &HeaderMap,
    authenticator: &dyn Authenticator,
) -> Result<AuthenticatedSession, AuthError> {
    let token = extract_session_token(headers).ok_or(AuthError::Missing)?;
    let subject = authenticator.verify(&token).await?;
    Ok(AuthenticatedSession {
        subject,
        credential: SessionCredential::new(token),
    })
}

fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::{Json, Router, http::HeaderValue, http::StatusCode, routing::post};
    use tokio::net::TcpListener;

    struct FixedAuthenticator;

    #[async_trait]
    impl Authenticator for FixedAuthenticator {
        async fn verify(&self, token: &str) -> Result<Option<String>, AuthError> {
            if token == "sess-42" {
                Ok(Some("user-1".to_string()))
            } else {
                Err(AuthError::Rejected)
            }
        }
    }

    async fn session_service() -> Result<Url> {
        let app = Router::new().route(
            "/verify",
            post(|Json(body): Json<Value>| async move {
                match body["token"].as_str() {
                    Some("good") => (StatusCode::OK, Json(json!({ "subject": "user-1" }))),
                    Some("broken") => (StatusCode::BAD_GATEWAY, Json(json!({}))),
                    _ => (StatusCode::UNAUTHORIZED, Json(json!({}))),
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app.into_make_service()).await;
        });
        Ok(Url::parse(&format!("http://{addr}/verify"))?)
    }

    #[test]
    fn bearer_token_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(SESSION_HEADER, HeaderValue::from_static("def"));
        assert_eq!(extract_session_token(&headers), Some("abc".to_string()));
    }

    #[test]
    fn session_header_is_trimmed() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static("  sess-42 "));
        assert_eq!(extract_session_token(&headers), Some("sess-42".to_string()));
    }

    #[test]
    fn blank_tokens_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        headers.insert(SESSION_HEADER, HeaderValue::from_static(""));
        assert_eq!(extract_session_token(&headers), None);
    }

    #[tokio::test]
    async fn authenticate_hands_over_verified_token() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static("sess-42"));

        let session = authenticate(&headers, &FixedAuthenticator).await.unwrap();
        assert_eq!(session.subject.as_deref(), Some("user-1"));
        assert_eq!(session.credential.expose(), "sess-42");
    }

    #[tokio::test]
    async fn authenticate_requires_token() {
        let result = authenticate(&HeaderMap::new(), &FixedAuthenticator).await;
        assert!(matches!(result, Err(AuthError::Missing)));
    }

    #[tokio::test]
    async fn remote_authenticator_accepts_valid_session() -> Result<()> {
        let authenticator = RemoteAuthenticator::new(session_service().await?)?;
        let subject = authenticator.verify("good").await?;
        assert_eq!(subject.as_deref(), Some("user-1"));
        Ok(())
    }

    #[tokio::test]
    async fn remote_authenticator_rejects_invalid_session() -> Result<()> {
        let authenticator = RemoteAuthenticator::new(session_service().await?)?;
        let result = authenticator.verify("bad").await;
        assert!(matches!(result, Err(AuthError::Rejected)));
        Ok(())
    }

    #[tokio::test]
    async fn remote_authenticator_reports_upstream_failure() -> Result<()> {
        let authenticator = RemoteAuthenticator::new(session_service().await?)?;
        let result = authenticator.verify("broken").await;
        assert!(matches!(result, Err(AuthError::Unavailable)));
        Ok(())
    }
}
