use thiserror::Error;

/// Failures reported by a model backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Request(String),
    #[error("model stream interrupted: {0}")]
    Stream(String),
    #[error("model returned no content")]
    Empty,
    #[error("model rate limited")]
    RateLimited,
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("unexpected response for {context}: {message}")]
    UnexpectedResponse { context: String, message: String },
    #[error("{label} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        label: String,
        attempts: u32,
        last_error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Token exchange failed with status {status}: {body}")]
    Exchange { status: u16, body: String },
    #[error("{0}")]
    InvalidTokenResponse(String),
    #[error("token exchange request failed: {0}")]
    Transport(String),
    #[error("Authentication failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("not authorized")]
    Unauthorized,
    #[error("{0} not found")]
    NotFound(String),
    #[error("code host request failed: {0}")]
    Request(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("no panel registered for view {0}")]
    UnknownView(String),
    #[error("panel module failed to load: {0}")]
    Module(String),
}
