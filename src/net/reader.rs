//! Chunked body reader.
//!
//! Pulls a response body one read at a time into a fixed-size buffer, hands every non-empty read
//! to a [`ChunkSink`] and reports the running byte count after each one. The cancellation flag is
//! looked at before every read.
use crate::errors::TransferError;
use crate::net::{ChunkSink, TransferControl};
use std::io::{self, Read};

pub struct ChunkedBodyReader<R> {
    source: R,
    buffer: Vec<u8>,
    /// Bytes handed to the sink so far
    bytes_read: u64,
    /// Length as declared by the transport
    total_length: Option<u64>,
    finished: bool,
}

impl<R: Read> ChunkedBodyReader<R> {
    pub fn new(source: R, buffer_size: usize, total_length: Option<u64>) -> Self {
        Self {
            source,
            buffer: vec![0; buffer_size.max(1)],
            bytes_read: 0,
            total_length,
            finished: false,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn total_length(&self) -> Option<u64> {
        self.total_length
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// True once the source hit end-of-stream or an error. The reader cannot be restarted.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Performs a single read from the source. A chunk holds whatever that read returned, at
    /// most [`buffer_size`](Self::buffer_size) bytes.
    ///
    /// Returns `Ok(None)` at end-of-stream. The returned bytes are *not* accounted in
    /// [`bytes_read`](Self::bytes_read); see [`consume`](Self::consume).
    pub fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        if self.finished {
            return Ok(None);
        }

        loop {
            match self.source.read(&mut self.buffer) {
                Ok(0) => {
                    self.finished = true;
                    return Ok(None);
                }
                Ok(n) => return Ok(Some(&self.buffer[..n])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            }
        }
    }

    /// Accounts a chunk returned by [`next_chunk`](Self::next_chunk) into the running total.
    pub fn consume(&mut self, len: usize) -> u64 {
        self.bytes_read += len as u64;
        self.bytes_read
    }

    /// Streams the whole body into `sink`.
    ///
    /// `on_progress(bytes_read, total_length)` is called after every chunk. Termination, in
    /// priority order:
    /// 1. cancellation observed: `Err(UserCanceled)`
    /// 2. the source or the sink failed: `Err(TransferIo)`
    /// 3. end-of-stream: `Ok(total bytes read)`
    pub fn stream<S, P>(
        &mut self,
        status: u16,
        sink: &mut S,
        control: &TransferControl,
        mut on_progress: P,
    ) -> Result<u64, TransferError>
    where
        S: ChunkSink + ?Sized,
        P: FnMut(u64, Option<u64>),
    {
        loop {
            if control.is_canceled() {
                return Err(TransferError::UserCanceled);
            }

            let chunk = match self.next_chunk() {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => return Err(io_failure(control, e)),
            };

            let len = chunk.len();
            if let Err(e) = sink.on_chunk_received(status, chunk) {
                self.finished = true;
                return Err(io_failure(control, e));
            }

            let bytes_read = self.consume(len);
            log::trace!("read chunk of {} bytes ({} / {:?})", len, bytes_read, self.total_length);
            on_progress(bytes_read, self.total_length);
        }

        // Canceled while the last read was in flight
        if control.is_canceled() {
            return Err(TransferError::UserCanceled);
        }

        Ok(self.bytes_read)
    }
}

fn io_failure(control: &TransferControl, e: io::Error) -> TransferError {
    if control.is_canceled() {
        TransferError::UserCanceled
    } else {
        TransferError::TransferIo(e)
    }
}
