//! Request/response types for login code endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct IssueCodeResponse {
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ConfirmCodeResponse {}

/// Outcome of one poll window.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(untagged)]
pub enum PollResponse {
    Resolved {
        credential: String,
    },
    TimedOut {
        #[serde(rename = "timedOut")]
        timed_out: bool,
    },
    Expired {
        expired: bool,
    },
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
        }
    }
}
