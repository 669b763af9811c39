//! Response handling: content type gate, chunked body reader, result channel and the handler
//! that drives them.
mod callbacks;
mod channel;
mod control;
mod fetch;
mod gate;
mod handler;
mod notification;
mod reader;
mod response;

pub use callbacks::{ChunkSink, NoopChunkSink, ResponseCallbacks, WriterSink};
pub use channel::{result_channel, Drain, ResultReceiver, ResultSender, TransferSender};
pub use control::TransferControl;
pub use fetch::{fetch, DEFAULT_USER_AGENT};
pub use gate::ContentTypeGate;
pub use handler::{Outcome, ResponseHandler, Transfer, TransferTask};
pub use notification::{Envelope, Notification, TransferId};
pub use reader::ChunkedBodyReader;
pub use response::{Body, Response};
