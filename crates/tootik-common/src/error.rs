//! Error types for tootik's frontend core.

use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Gemini-style two-digit response status family.
///
/// Gopher and Finger surfaces map these onto their own conventions; the
/// numbers here are the canonical Gemini codes the dispatcher reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFamily {
    /// `10` — request user input.
    Input,
    /// `20` — success.
    Success,
    /// `30` — redirect.
    Redirect,
    /// `40` — temporary failure, with a human-readable reason.
    TemporaryFailure,
    /// `50` — permanent failure.
    PermanentFailure,
    /// `61` — client certificate required.
    CertificateRequired,
}

impl StatusFamily {
    /// The two-digit numeric code for this family.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Input => 10,
            Self::Success => 20,
            Self::Redirect => 30,
            Self::TemporaryFailure => 40,
            Self::PermanentFailure => 50,
            Self::CertificateRequired => 61,
        }
    }
}

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// No authenticated actor on a route that requires one.
    #[error("authentication required")]
    AuthRequired,

    /// A client certificate has not yet been registered to a local actor.
    #[error("not registered")]
    NotRegistered,

    /// Input failed a regex/parse/range check.
    #[error("{0}")]
    BadInput(String),

    /// A write was rejected by a per-user throttle.
    #[error("Please wait for {0}")]
    Throttled(String),

    /// A per-user quota has been reached.
    #[error("Reached {0}")]
    QuotaReached(String),

    /// A requested entity does not exist or is not visible to the caller.
    #[error("{0} not found")]
    NotFound(String),

    /// The outbound delivery queue rejected a new activity.
    #[error("Please try again later")]
    QueueFull,

    /// Any other failure; detail is logged, not surfaced to the caller.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the Gemini-style status family this error surfaces as.
    #[must_use]
    pub const fn status_family(&self) -> StatusFamily {
        match self {
            Self::AuthRequired => StatusFamily::CertificateRequired,
            Self::NotRegistered => StatusFamily::Redirect,
            Self::BadInput(_) | Self::Throttled(_) | Self::QuotaReached(_) | Self::QueueFull => {
                StatusFamily::TemporaryFailure
            }
            Self::NotFound(_) => StatusFamily::TemporaryFailure,
            Self::Internal(_) => StatusFamily::PermanentFailure,
        }
    }

    /// The message shown to the caller for statuses that carry one
    /// (`40 <reason>` / `50 <reason>`). Internal errors never leak detail.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether this error should be logged at error level rather than debug.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Internal(err.to_string())
    }
}
