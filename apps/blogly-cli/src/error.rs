//! Command errors and their RFC 7807 rendering.

use blogly_core::DomainError;
use blogly_shared::ErrorResponse;
use thiserror::Error;

/// Failure of a single command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}

impl CliError {
    /// Problem body printed in place of the command output.
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            CliError::Domain(err) => {
                if let DomainError::Internal(detail) = err {
                    tracing::error!("Internal error: {}", detail);
                }
                ErrorResponse::from(err)
            }
            CliError::Render(err) => {
                tracing::error!("Render error: {}", err);
                ErrorResponse::internal_error()
            }
        }
    }
}

/// Result type alias for commands.
pub type CliResult<T> = Result<T, CliError>;
