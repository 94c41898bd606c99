use feedcore::types::events::{ErrorKind, Notice, NoticeKind};
use std::time::Duration;
use thiserror::Error;

/// Failure of a single backend call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(#[from] anyhow::Error),
    #[error("session is missing or expired")]
    Unauthorized,
    #[error("server returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed response: {0}")]
    Malformed(#[source] anyhow::Error),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Timeout(_) | ApiError::Transport(_) => ErrorKind::Transient,
            ApiError::Unauthorized => ErrorKind::Auth,
            ApiError::Malformed(_) => ErrorKind::Malformed,
            ApiError::Status { .. } => ErrorKind::Server,
        }
    }

    pub fn is_auth(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }

    /// Builds the user-facing notice. Auth failures always become
    /// `SessionExpired` so the UI can prompt a new login whatever the action.
    pub fn notice(&self, kind: NoticeKind, summary: impl Into<String>) -> Notice {
        let (kind, message) = if self.is_auth() {
            (NoticeKind::SessionExpired, "session expired, please log in again".to_string())
        } else {
            (kind, summary.into())
        };
        Notice {
            kind,
            error: self.kind(),
            message,
        }
    }
}
