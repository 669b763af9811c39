use crate::config::ConfigError;

/// Cause carried by a `Failure` notification.
///
/// Every variant is terminal for the response it was raised for. None of them are retried by the
/// handler; re-issuing the request is up to the caller.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Zero or more than one `Content-Type` header was found. No body bytes were read.
    #[error("None, or more than one, Content-Type header found (status {status}, found {found})")]
    AmbiguousContentType { status: u16, found: usize },

    /// The `Content-Type` header did not match any allowed pattern. No body bytes were read.
    #[error("Content-Type not allowed: {content_type} (status {status})")]
    ContentTypeNotAllowed { status: u16, content_type: String },

    /// Reading the body failed, or the chunk callback returned an error.
    #[error("Transfer I/O error: {0}")]
    TransferIo(#[from] std::io::Error),

    /// The transfer was canceled by the user between two chunks.
    #[error("User stopped downloading")]
    UserCanceled,
}

impl TransferError {
    /// True when the transfer ended because `cancel()` was called.
    pub fn is_canceled(&self) -> bool {
        matches!(self, TransferError::UserCanceled)
    }

    /// True when the response was rejected by the content type gate.
    pub fn is_content_type_error(&self) -> bool {
        matches!(
            self,
            TransferError::AmbiguousContentType { .. } | TransferError::ContentTypeNotAllowed { .. }
        )
    }

    /// Status code of the rejected response, only known for gate errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransferError::AmbiguousContentType { status, .. } => Some(*status),
            TransferError::ContentTypeNotAllowed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised while building or wiring up a handler. These never travel through the result
/// channel.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Invalid content type pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Net(#[from] reqwest::Error),

    #[error("Result channel closed")]
    ChannelClosed,

    #[error("Transfer worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
