//! Response orchestration.
//!
//! A [`ResponseHandler`] takes a [`Response`] through its life cycle:
//!
//! ```text
//! Idle -> ContentTypeCheck -> Streaming -> Terminated
//!                 |                            ^
//!                 +-- rejected / no body ------+
//! ```
//!
//! The handler itself is immutable and cheap to clone; all per-response state is owned by the
//! worker that processes the response. How it ended is reported back as an [`Outcome`].
use crate::config::HandlerConfig;
use crate::errors::HandlerError;
use crate::net::{
    result_channel, ChunkSink, ChunkedBodyReader, ContentTypeGate, Notification, Response,
    ResponseCallbacks, ResultReceiver, ResultSender, TransferControl, TransferId, TransferSender,
};
use std::io;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Phase of a single response. `Terminated` is absorbing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum Phase {
    #[default]
    Idle,
    ContentTypeCheck,
    Streaming,
    Terminated,
}

/// How processing of a response ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Body read completely, `Success` was sent
    Succeeded { bytes: u64 },
    /// Content type gate said no, `Failure` was sent
    Rejected,
    /// Read or chunk sink error, `Failure` was sent
    Failed { bytes: u64 },
    /// Canceled between chunks, `Failure` was sent
    Canceled { bytes: u64 },
    /// Response had no body entity. Nothing was sent at all.
    NoBody,
}

/// Bookkeeping for one response, owned by its worker.
#[derive(Debug)]
pub(crate) struct TransferState {
    status: u16,
    bytes_read: u64,
    total_length: Option<u64>,
    phase: Phase,
}

impl TransferState {
    fn new(status: u16) -> Self {
        Self {
            status,
            bytes_read: 0,
            total_length: None,
            phase: Phase::Idle,
        }
    }

    #[cfg(test)]
    fn phase(&self) -> Phase {
        self.phase
    }

    fn advance(&mut self, next: Phase) {
        if self.phase == Phase::Terminated {
            log::warn!("ignoring transition {:?} -> {:?}", self.phase, next);
            return;
        }
        log::debug!("transfer phase {:?} -> {:?} (status {})", self.phase, next, self.status);
        self.phase = next;
    }
}

#[derive(Debug)]
struct HandlerShared {
    config: HandlerConfig,
    gate: ContentTypeGate,
}

/// Handles responses: validates the content type, streams the body in chunks and reports
/// progress and the final result through a result channel.
///
/// Configuration is fixed at construction. Clones share it, so one handler can serve many
/// responses on many workers at the same time.
#[derive(Debug, Clone)]
pub struct ResponseHandler {
    shared: Arc<HandlerShared>,
}

impl ResponseHandler {
    /// Creates a new handler. Fails when the config does not validate or one of the allowed
    /// content type patterns is not a valid regular expression.
    pub fn new(config: HandlerConfig) -> Result<Self, HandlerError> {
        config.validate()?;
        let gate = ContentTypeGate::new(config.allowed_content_types.as_ref())?;

        Ok(Self {
            shared: Arc::new(HandlerShared { config, gate }),
        })
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.shared.config
    }

    pub fn gate(&self) -> &ContentTypeGate {
        &self.shared.gate
    }

    /// Processes a response on the current thread. This is the worker side: it blocks on body
    /// reads and on `sink`.
    ///
    /// At most one terminal notification is pushed into `tx`, and none at all when the
    /// response has no body entity.
    pub fn process<S: ChunkSink + ?Sized>(
        &self,
        response: Response,
        sink: &mut S,
        control: &TransferControl,
        tx: &mut TransferSender,
    ) -> Outcome {
        let Response { status, headers, body } = response;
        let mut state = TransferState::new(status);

        state.advance(Phase::ContentTypeCheck);
        if let Err(cause) = self.shared.gate.check(status, &headers) {
            log::warn!("Transfer[{}]: rejected: {}", tx.transfer(), cause);
            state.advance(Phase::Terminated);
            emit(tx, Notification::Failure { cause, partial_body: None });
            return Outcome::Rejected;
        }

        let Some(body) = body else {
            log::debug!("Transfer[{}]: response has no body entity", tx.transfer());
            state.advance(Phase::Terminated);
            return Outcome::NoBody;
        };

        state.total_length = body.content_length();
        state.advance(Phase::Streaming);

        let mut reader = ChunkedBodyReader::new(
            body.into_reader(),
            self.shared.config.buffer_size,
            state.total_length,
        );
        let mut collected = self.shared.config.collect_body.then(Vec::new);
        let mut collecting = CollectingSink {
            inner: sink,
            collected: collected.as_mut(),
        };

        let result = reader.stream(status, &mut collecting, control, |bytes_read, total_length| {
            emit(tx, Notification::Progress { status, bytes_read, total_length });
        });
        state.bytes_read = reader.bytes_read();
        state.advance(Phase::Terminated);

        match result {
            Ok(bytes) => {
                log::debug!("Transfer[{}]: finished after {} bytes", tx.transfer(), bytes);
                emit(tx, Notification::Success { status, body: collected });
                Outcome::Succeeded { bytes }
            }
            Err(cause) => {
                let outcome = if cause.is_canceled() {
                    log::info!("Transfer[{}]: canceled after {} bytes", tx.transfer(), state.bytes_read);
                    Outcome::Canceled { bytes: state.bytes_read }
                } else {
                    log::warn!("Transfer[{}]: failed after {} bytes: {}", tx.transfer(), state.bytes_read, cause);
                    Outcome::Failed { bytes: state.bytes_read }
                };
                emit(tx, Notification::Failure { cause, partial_body: collected });
                outcome
            }
        }
    }

    /// Spawns a worker on the blocking pool that processes `response` and reports into the
    /// shared `results` channel.
    ///
    /// # Panics
    /// Must be called from within a tokio runtime.
    pub fn spawn<S>(&self, response: Response, mut sink: S, results: &ResultSender, control: TransferControl) -> TransferTask
    where
        S: ChunkSink + 'static,
    {
        let id = TransferId::new();
        let mut tx = results.for_transfer(id);
        let handler = self.clone();
        let worker_control = control.clone();

        let join = tokio::task::spawn_blocking(move || {
            handler.process(response, &mut sink, &worker_control, &mut tx)
        });

        TransferTask { id, control, join }
    }

    /// Spawns a worker with its own result channel and returns the origin side of it.
    ///
    /// # Panics
    /// Must be called from within a tokio runtime.
    pub fn dispatch<S>(&self, response: Response, sink: S) -> Transfer
    where
        S: ChunkSink + 'static,
    {
        let (tx, receiver) = result_channel();
        // The worker holds the only sender, so the receiver closes once it is done
        let task = self.spawn(response, sink, &tx, TransferControl::new());

        Transfer { task, receiver }
    }
}

/// Push a notification, a vanished origin side is not the worker's problem.
fn emit(tx: &mut TransferSender, notification: Notification) {
    if let Err(e) = tx.push(notification) {
        log::debug!("Transfer[{}]: {}", tx.transfer(), e);
    }
}

/// Forwards chunks to the user sink and, if body collection is on, keeps a copy.
struct CollectingSink<'a, S: ?Sized> {
    inner: &'a mut S,
    collected: Option<&'a mut Vec<u8>>,
}

impl<S: ChunkSink + ?Sized> ChunkSink for CollectingSink<'_, S> {
    fn on_chunk_received(&mut self, status: u16, chunk: &[u8]) -> io::Result<()> {
        self.inner.on_chunk_received(status, chunk)?;
        if let Some(buf) = self.collected.as_deref_mut() {
            buf.extend_from_slice(chunk);
        }
        Ok(())
    }
}

/// A worker reporting into a shared result channel.
#[derive(Debug)]
pub struct TransferTask {
    id: TransferId,
    control: TransferControl,
    join: JoinHandle<Outcome>,
}

impl TransferTask {
    pub fn id(&self) -> TransferId {
        self.id
    }

    pub fn control(&self) -> &TransferControl {
        &self.control
    }

    pub fn cancel(&self) {
        self.control.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.control.is_canceled()
    }

    /// Waits for the worker to finish.
    pub async fn join(self) -> Result<Outcome, HandlerError> {
        Ok(self.join.await?)
    }
}

/// A worker together with its private result channel.
#[derive(Debug)]
pub struct Transfer {
    task: TransferTask,
    receiver: ResultReceiver,
}

impl Transfer {
    pub fn id(&self) -> TransferId {
        self.task.id()
    }

    pub fn control(&self) -> &TransferControl {
        self.task.control()
    }

    pub fn cancel(&self) {
        self.task.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.task.is_canceled()
    }

    pub fn receiver(&mut self) -> &mut ResultReceiver {
        &mut self.receiver
    }

    /// Delivers whatever is queued to `callbacks` without waiting.
    pub fn dispatch_pending<C: ResponseCallbacks + ?Sized>(&mut self, callbacks: &mut C) -> usize {
        self.receiver.dispatch_pending(callbacks)
    }

    /// Delivers every notification to `callbacks` as it arrives, then waits for the worker.
    pub async fn run<C: ResponseCallbacks + ?Sized>(mut self, callbacks: &mut C) -> Result<Outcome, HandlerError> {
        while let Some(envelope) = self.receiver.recv().await {
            callbacks.on_notification(envelope.notification);
        }
        self.task.join().await
    }

    /// Waits for the worker without delivering anything. Queued notifications stay available
    /// through the returned receiver.
    pub async fn join(self) -> Result<(Outcome, ResultReceiver), HandlerError> {
        let outcome = self.task.join().await?;
        Ok((outcome, self.receiver))
    }
}
