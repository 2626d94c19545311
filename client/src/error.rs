//! Error types for the client.

use crate::config::ConfigError;
use roster_engine::{MutationKind, UserId};

/// Failure talking to the remote user service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The request never reached the service, or no response came back.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("service error: {endpoint} returned {status}")]
    Service { status: u16, endpoint: String },

    /// The service answered 2xx with a body that is not a user record.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Service { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Why a mutation did not go through.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationCause {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("no record with id {0}")]
    UnknownRecord(UserId),

    #[error(transparent)]
    Store(#[from] roster_engine::Error),
}

/// `MutationFailed{op, cause}`: the optimistic change has been rolled back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{op} failed: {cause}")]
pub struct MutationError {
    pub op: MutationKind,
    pub cause: MutationCause,
}

impl MutationError {
    pub fn new(op: MutationKind, cause: impl Into<MutationCause>) -> Self {
        Self {
            op,
            cause: cause.into(),
        }
    }
}

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load users: {0}")]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Engine(#[from] roster_engine::Error),

    #[error("Preferences file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("User {0} not found")]
    NotFound(UserId),
}

/// Result type alias for the client.
pub type Result<T> = std::result::Result<T, AppError>;
