#![allow(clippy::needless_for_each)]

use crate::api::handlers::{SESSION_HEADER, health, login_code, types};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        login_code::issue_code,
        login_code::confirm_code,
        login_code::poll_code
    ),
    components(
        schemas(
            health::Health,
            types::IssueCodeResponse,
            types::ConfirmCodeResponse,
            types::PollResponse,
            types::ErrorResponse
        )
    ),
    modifiers(&SessionSecurity),
    tags(
        (name = "login", description = "Cross-device login codes"),
        (name = "health", description = "Service health"),
    )
)]
struct ApiDoc;

/// Documents the session header required by `confirm`.
struct SessionSecurity;

impl Modify for SessionSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(SESSION_HEADER))),
            );
        }
    }
}

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
