//! Asynchronous response handling for the Gosub network stack.
//!
//! A [`ResponseHandler`](net::ResponseHandler) receives a response on a worker thread, checks
//! its `Content-Type` against an allow-list, streams the body in bounded chunks to a
//! [`ChunkSink`](net::ChunkSink) and reports progress and the final result back to the origin
//! thread through a result channel. Transfers can be canceled in between chunks.
//!
//! ```no_run
//! # use gosub_net::{config::HandlerConfig, net::{self, NoopChunkSink, ResponseCallbacks, ResponseHandler}};
//! # async fn run() -> Result<(), gosub_net::HandlerError> {
//! struct Printer;
//! impl ResponseCallbacks for Printer {
//!     fn on_progress(&mut self, _status: u16, bytes_read: u64, total: Option<u64>) {
//!         println!("{bytes_read} / {total:?}");
//!     }
//! }
//!
//! let config = HandlerConfig::builder().allowed_content_types(["image/.*"]).build()?;
//! let handler = ResponseHandler::new(config)?;
//!
//! let response = net::fetch("https://example.com/logo.png".parse().unwrap()).await?;
//! let transfer = handler.dispatch(response, NoopChunkSink);
//! let outcome = transfer.run(&mut Printer).await?;
//! # Ok(()) }
//! ```
pub mod config;
pub mod errors;
pub mod net;

pub use config::HandlerConfig;
pub use errors::{HandlerError, TransferError};
