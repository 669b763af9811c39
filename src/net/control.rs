use tokio_util::sync::CancellationToken;

/// Cancellation flag shared between the origin thread (writer) and the worker (reader).
///
/// Cancellation is cooperative: the worker only looks at the flag in between chunks, so a chunk
/// read that is already in flight always completes. Canceling is idempotent.
#[derive(Debug, Clone, Default)]
pub struct TransferControl {
    token: CancellationToken,
}

impl TransferControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ties the transfer to an existing token, so canceling a parent scope (ie: the request
    /// that spawned several transfers) cancels the transfer as well.
    pub fn from_token(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the transfer has been canceled.
    pub async fn canceled(&self) {
        self.token.cancelled().await
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}
