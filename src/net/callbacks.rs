//! Callback surfaces of a transfer.
//!
//! - [`ResponseCallbacks`] runs on the origin thread, fed by
//!   [`ResultReceiver::dispatch_pending`](crate::net::ResultReceiver::dispatch_pending).
//! - [`ChunkSink`] runs on the worker thread, directly from the read loop. It is not marshaled;
//!   implementations that share state with the origin thread must synchronize themselves.
use crate::errors::TransferError;
use crate::net::Notification;
use std::io;

/// Trait for anything that wants to observe the outcome of a transfer.
///
/// Lifecycle:
/// - `on_progress` is called after every chunk.
/// - `on_success` is called once when the body was read completely.
/// - `on_failure` is called once when the transfer failed or was canceled.
pub trait ResponseCallbacks {
    fn on_progress(&mut self, _status: u16, _bytes_read: u64, _total_length: Option<u64>) {}

    fn on_success(&mut self, _status: u16, _body: Option<Vec<u8>>) {}

    fn on_failure(&mut self, _cause: TransferError, _partial_body: Option<Vec<u8>>) {}

    /// Routes a notification to the matching callback.
    fn on_notification(&mut self, notification: Notification) {
        match notification {
            Notification::Progress { status, bytes_read, total_length } => {
                self.on_progress(status, bytes_read, total_length)
            }
            Notification::Success { status, body } => self.on_success(status, body),
            Notification::Failure { cause, partial_body } => self.on_failure(cause, partial_body),
        }
    }
}

/// Receives body chunks on the worker thread.
///
/// Blocking here (ie: writing to disk) throttles the transfer: progress and cancellation are
/// only handled in between chunks. Returning an error aborts the transfer with
/// [`TransferError::TransferIo`].
pub trait ChunkSink: Send {
    fn on_chunk_received(&mut self, status: u16, chunk: &[u8]) -> io::Result<()>;
}

impl<F> ChunkSink for F
where
    F: FnMut(u16, &[u8]) -> io::Result<()> + Send,
{
    fn on_chunk_received(&mut self, status: u16, chunk: &[u8]) -> io::Result<()> {
        self(status, chunk)
    }
}

/// Sink that discards all chunks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopChunkSink;

impl ChunkSink for NoopChunkSink {
    fn on_chunk_received(&mut self, _status: u16, _chunk: &[u8]) -> io::Result<()> {
        Ok(())
    }
}

/// Sink that writes every chunk to an [`io::Write`] (a file, a socket, a `Vec<u8>`).
#[derive(Debug)]
pub struct WriterSink<W: io::Write + Send>(pub W);

impl<W: io::Write + Send> ChunkSink for WriterSink<W> {
    fn on_chunk_received(&mut self, _status: u16, chunk: &[u8]) -> io::Result<()> {
        self.0.write_all(chunk)
    }
}
