//! Result channel between transfer workers and the origin thread.
//!
//! Workers push [`Notification`]s, the origin thread drains them from its own loop and hands
//! them to its callbacks. The channel is unbounded: a slow or absent consumer never blocks a
//! worker, and nothing is dropped.
//!
//! Ordering is guaranteed per transfer only. Notifications of unrelated transfers sharing one
//! channel may interleave.
use crate::errors::HandlerError;
use crate::net::{Envelope, Notification, ResponseCallbacks, TransferId};
use tokio::sync::mpsc;

/// Creates a connected sender/receiver pair.
pub fn result_channel() -> (ResultSender, ResultReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ResultSender { tx }, ResultReceiver { rx })
}

/// Worker side of the channel. Cheap to clone, one clone per worker.
#[derive(Debug, Clone)]
pub struct ResultSender {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl ResultSender {
    /// Returns a sender bound to a single transfer.
    pub fn for_transfer(&self, transfer: TransferId) -> TransferSender {
        TransferSender {
            transfer,
            tx: self.tx.clone(),
            terminated: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Sender for the notifications of exactly one transfer.
///
/// Once a terminal notification went out, the transfer is done: anything pushed afterwards is
/// discarded.
#[derive(Debug)]
pub struct TransferSender {
    transfer: TransferId,
    tx: mpsc::UnboundedSender<Envelope>,
    terminated: bool,
}

impl TransferSender {
    pub fn transfer(&self) -> TransferId {
        self.transfer
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Queues a notification. Never blocks.
    ///
    /// Fails only when the origin side dropped its receiver.
    pub fn push(&mut self, notification: Notification) -> Result<(), HandlerError> {
        if self.terminated {
            log::warn!(
                "Transfer[{}]: dropping {:?} pushed after the terminal notification",
                self.transfer,
                notification
            );
            return Ok(());
        }
        self.terminated = notification.is_terminal();

        self.tx
            .send(Envelope {
                transfer: self.transfer,
                notification,
            })
            .map_err(|_| HandlerError::ChannelClosed)
    }
}

/// Origin side of the channel.
#[derive(Debug)]
pub struct ResultReceiver {
    rx: mpsc::UnboundedReceiver<Envelope>,
}

impl ResultReceiver {
    /// Iterates over everything that is queued right now, in emission order. Does not wait.
    pub fn drain(&mut self) -> Drain<'_> {
        Drain { rx: &mut self.rx }
    }

    /// Waits for the next notification. `None` once all senders are gone and the queue is empty.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    /// Blocking variant of [`recv`](Self::recv) for origin threads outside of a runtime.
    pub fn blocking_recv(&mut self) -> Option<Envelope> {
        self.rx.blocking_recv()
    }

    /// Delivers every queued notification to `callbacks` and returns how many were delivered.
    pub fn dispatch_pending<C: ResponseCallbacks + ?Sized>(&mut self, callbacks: &mut C) -> usize {
        let mut delivered = 0;
        for envelope in self.drain() {
            callbacks.on_notification(envelope.notification);
            delivered += 1;
        }
        delivered
    }
}

/// Non-blocking iterator returned by [`ResultReceiver::drain`].
pub struct Drain<'a> {
    rx: &'a mut mpsc::UnboundedReceiver<Envelope>,
}

impl Iterator for Drain<'_> {
    type Item = Envelope;

    fn next(&mut self) -> Option<Self::Item> {
        self.rx.try_recv().ok()
    }
}
