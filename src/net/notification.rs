//! Notifications sent from a transfer worker to the origin thread.
//!
//! Every response processed by the handler gets its own [`TransferId`]. The worker emits zero or
//! more [`Notification::Progress`] messages followed by at most one terminal message
//! ([`Notification::Success`] or [`Notification::Failure`]).
use crate::errors::TransferError;
use std::fmt::Display;
use uuid::Uuid;

/// A unique identifier for a single response being processed.
///
/// **Note:** The use of [`Uuid`] is an implementation detail. Treat `TransferId` as an opaque
/// handle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransferId(Uuid);

impl TransferId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TransferId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Display for TransferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub enum Notification {
    /// Another chunk has been delivered to the chunk sink
    Progress {
        status: u16,
        /// Cumulative number of body bytes read so far
        bytes_read: u64,
        /// Total length as declared by the transport (`None` when unknown)
        total_length: Option<u64>,
    },
    /// The body has been read completely
    Success {
        status: u16,
        /// Collected body, only when body collection is enabled
        body: Option<Vec<u8>>,
    },
    /// The transfer failed or was canceled
    Failure {
        cause: TransferError,
        /// Bytes read before the failure, only when body collection is enabled
        partial_body: Option<Vec<u8>>,
    },
}

impl Notification {
    /// Success and failure end the notification stream of a transfer.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Notification::Progress { .. })
    }
}

/// A notification tagged with the transfer it belongs to.
#[derive(Debug)]
pub struct Envelope {
    pub transfer: TransferId,
    pub notification: Notification,
}
