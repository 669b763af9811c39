//! Downloads a URL to stdout while reporting progress on stderr.
//!
//! ```text
//! gosub-fetch <url> [allowed-content-type-pattern...]
//! ```
//!
//! Ctrl-C cancels the transfer after the chunk that is currently being read.
use anyhow::{bail, Context};
use gosub_net::config::HandlerConfig;
use gosub_net::net::{self, Outcome, ResponseCallbacks, ResponseHandler, WriterSink};
use gosub_net::TransferError;
use url::Url;

struct ProgressPrinter;

impl ResponseCallbacks for ProgressPrinter {
    fn on_progress(&mut self, status: u16, bytes_read: u64, total_length: Option<u64>) {
        match total_length {
            Some(total) => eprintln!("[{status}] {bytes_read} / {total} bytes"),
            None => eprintln!("[{status}] {bytes_read} bytes"),
        }
    }

    fn on_success(&mut self, status: u16, _body: Option<Vec<u8>>) {
        eprintln!("[{status}] done");
    }

    fn on_failure(&mut self, cause: TransferError, _partial_body: Option<Vec<u8>>) {
        eprintln!("failed: {cause}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(url) = args.next() else {
        bail!("usage: gosub-fetch <url> [allowed-content-type-pattern...]");
    };
    let url = Url::parse(&url).with_context(|| format!("cannot parse URL {url}"))?;
    let patterns: Vec<String> = args.collect();

    let mut builder = HandlerConfig::builder();
    if !patterns.is_empty() {
        builder = builder.allowed_content_types(patterns);
    }
    let handler = ResponseHandler::new(builder.build()?)?;

    let response = net::fetch(url).await?;
    let transfer = handler.dispatch(response, WriterSink(std::io::stdout()));

    let control = transfer.control().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("cancel requested");
            control.cancel();
        }
    });

    match transfer.run(&mut ProgressPrinter).await? {
        Outcome::Succeeded { .. } => Ok(()),
        Outcome::NoBody => {
            eprintln!("response has no body");
            Ok(())
        }
        other => bail!("transfer did not complete: {other:?}"),
    }
}
