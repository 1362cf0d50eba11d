use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("login code already in use")]
    DuplicateCode,
    #[error("unknown login code")]
    UnknownCode,
    #[error("login code already confirmed")]
    AlreadyResolved,
    #[error("login code expired")]
    CodeExpired,
    #[error("could not issue a unique login code after {attempts} attempts")]
    IssueExhausted { attempts: u32 },
    #[error("entropy source failed: {0}")]
    Entropy(#[from] rand::Error),
}

impl HandshakeError {
    /// Stable identifier used in API error payloads.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateCode => "duplicate_code",
            Self::UnknownCode => "unknown_code",
            Self::AlreadyResolved => "already_resolved",
            Self::CodeExpired => "code_expired",
            Self::IssueExhausted { .. } => "issue_exhausted",
            Self::Entropy(_) => "entropy",
        }
    }

    /// Errors the calling actor caused, as opposed to operational failures.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownCode | Self::AlreadyResolved | Self::CodeExpired
        )
    }
}
