//! Error types for the job board client
//!
//! Each component reports its own error enum; [`ClientError`] is the
//! umbrella the view layer stores and renders. All of them are recovered at
//! the operation boundary, none ends the session.

use thiserror::Error;

use crate::view::ScreenState;

/// Categorized failure from the job board API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Unreachable backend, timeout, unexpected status or undecodable body
    #[error("network error: {0}")]
    Network(String),

    /// Missing or invalid token, or credentials refused
    #[error("not authorized: {0}")]
    Auth(String),

    /// Backend refused the payload
    #[error("rejected by server: {0}")]
    Validation(String),
}

/// Failure of a login/register attempt or a token-gated request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("you must be logged in")]
    MissingToken,

    #[error("authentication rejected: {0}")]
    Rejected(String),

    #[error("could not reach the server: {0}")]
    Network(String),

    #[error("could not persist session: {0}")]
    Storage(String),
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(msg) => Self::Network(msg),
            ApiError::Auth(msg) | ApiError::Validation(msg) => Self::Rejected(msg),
        }
    }
}

/// Failure to load or search the job listing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("could not reach the server: {0}")]
    Network(String),

    #[error("listing request rejected: {0}")]
    Rejected(String),
}

impl From<ApiError> for FetchError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(msg) => Self::Network(msg),
            ApiError::Auth(msg) | ApiError::Validation(msg) => Self::Rejected(msg),
        }
    }
}

/// Invalid form input, detected locally or reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field(s): {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error("rejected by server: {0}")]
    Rejected(String),
}

/// Failure of `JobCatalog::create`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateJobError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("could not reach the server: {0}")]
    Network(String),
}

impl From<ApiError> for CreateJobError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(msg) => Self::Network(msg),
            ApiError::Auth(msg) => Self::Auth(AuthError::Rejected(msg)),
            ApiError::Validation(msg) => Self::Validation(ValidationError::Rejected(msg)),
        }
    }
}

/// Illegal screen transition or screen-scoped action
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("'{event}' requires a logged-in user")]
    RequiresLogin { event: &'static str },

    #[error("'{event}' is only available while logged out")]
    RequiresLogout { event: &'static str },

    #[error("'{event}' is not allowed from the {from} screen")]
    InvalidFrom {
        event: &'static str,
        from: ScreenState,
    },
}

/// Failure of the durable token slot
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("token storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// User-visible error surfaced by the view layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),

    #[error(transparent)]
    Auth(AuthError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error(transparent)]
    Fetch(FetchError),
}

impl From<AuthError> for ClientError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Network(msg) => Self::Network(msg),
            other => Self::Auth(other),
        }
    }
}

impl From<FetchError> for ClientError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Network(msg) => Self::Network(msg),
            other => Self::Fetch(other),
        }
    }
}

impl From<CreateJobError> for ClientError {
    fn from(err: CreateJobError) -> Self {
        match err {
            CreateJobError::Auth(e) => e.into(),
            CreateJobError::Validation(e) => Self::Validation(e),
            CreateJobError::Network(msg) => Self::Network(msg),
        }
    }
}

impl From<ApiError> for ClientError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(msg) => Self::Network(msg),
            ApiError::Auth(msg) => Self::Auth(AuthError::Rejected(msg)),
            ApiError::Validation(msg) => Self::Validation(ValidationError::Rejected(msg)),
        }
    }
}

impl ClientError {
    /// True for failures that a plain re-submission might fix
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
