use gosub_net::config::{HandlerConfig, DEFAULT_BUFFER_SIZE};
use gosub_net::net::{
    result_channel, Body, Envelope, Notification, Outcome, Response, ResponseCallbacks, ResponseHandler,
    TransferControl, TransferId, WriterSink,
};
use gosub_net::TransferError;
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use std::collections::HashMap;
use std::io::{self, Read};
use std::sync::mpsc;

const MIB: usize = 1024 * 1024;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn response(content_types: &[&str], body: Option<Body>) -> Response {
    let mut headers = HeaderMap::new();
    for ct in content_types {
        headers.append(CONTENT_TYPE, ct.parse().unwrap());
    }
    Response::new(200, headers, body)
}

fn image_handler() -> ResponseHandler {
    let cfg = HandlerConfig::builder().allowed_content_types(["image/.*"]).build().unwrap();
    ResponseHandler::new(cfg).unwrap()
}

/// Hands out one chunk per message. Fails once the sending side is dropped.
struct GatedReader {
    rx: mpsc::Receiver<Vec<u8>>,
}

impl Read for GatedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.rx.recv() {
            Ok(data) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok(n)
            }
            Err(_) => Err(io::Error::new(io::ErrorKind::BrokenPipe, "gate closed")),
        }
    }
}

#[derive(Default)]
struct Recorder {
    progress: Vec<(u16, u64, Option<u64>)>,
    successes: Vec<u16>,
    failures: Vec<TransferError>,
}

impl ResponseCallbacks for Recorder {
    fn on_progress(&mut self, status: u16, bytes_read: u64, total_length: Option<u64>) {
        assert!(self.successes.is_empty() && self.failures.is_empty(), "progress after terminal");
        self.progress.push((status, bytes_read, total_length));
    }
    fn on_success(&mut self, status: u16, _body: Option<Vec<u8>>) {
        self.successes.push(status);
    }
    fn on_failure(&mut self, cause: TransferError, _partial_body: Option<Vec<u8>>) {
        self.failures.push(cause);
    }
}

#[tokio::test]
async fn image_in_one_mib_chunks() {
    init_logging();
    assert_eq!(DEFAULT_BUFFER_SIZE, MIB);

    let handler = image_handler();
    let body = Body::from_bytes(vec![0xABu8; 3 * MIB]);
    let mut recorder = Recorder::default();

    let outcome = handler
        .dispatch(response(&["image/png"], Some(body)), WriterSink(io::sink()))
        .run(&mut recorder)
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Succeeded { bytes: 3 * MIB as u64 });
    let total = Some(3 * MIB as u64);
    assert_eq!(
        recorder.progress,
        vec![(200, 1_048_576, total), (200, 2_097_152, total), (200, 3_145_728, total)]
    );
    assert_eq!(recorder.successes, vec![200]);
    assert!(recorder.failures.is_empty());
}

#[tokio::test]
async fn disallowed_content_type_fails_immediately() {
    init_logging();
    let handler = image_handler();
    let mut recorder = Recorder::default();

    let outcome = handler
        .dispatch(response(&["text/html"], Some(Body::from_bytes(vec![1u8; 16]))), WriterSink(io::sink()))
        .run(&mut recorder)
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Rejected);
    assert!(recorder.progress.is_empty());
    assert!(recorder.successes.is_empty());
    assert_eq!(recorder.failures.len(), 1);
    assert!(matches!(recorder.failures[0], TransferError::ContentTypeNotAllowed { status: 200, .. }));
}

#[tokio::test]
async fn two_content_type_headers_are_ambiguous() {
    init_logging();
    let handler = image_handler();
    let mut recorder = Recorder::default();

    let outcome = handler
        .dispatch(
            response(&["image/png", "image/jpeg"], Some(Body::from_bytes(vec![1u8; 16]))),
            WriterSink(io::sink()),
        )
        .run(&mut recorder)
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Rejected);
    assert!(recorder.progress.is_empty());
    assert_eq!(recorder.failures.len(), 1);
    assert!(matches!(recorder.failures[0], TransferError::AmbiguousContentType { found: 2, .. }));
}

#[tokio::test]
async fn missing_body_produces_nothing() {
    init_logging();
    let handler = image_handler();
    let mut recorder = Recorder::default();

    let outcome = handler
        .dispatch(response(&["image/png"], None), WriterSink(io::sink()))
        .run(&mut recorder)
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::NoBody);
    assert!(recorder.progress.is_empty());
    assert!(recorder.successes.is_empty());
    assert!(recorder.failures.is_empty());
}

#[tokio::test]
async fn cancel_between_chunks_from_the_origin() {
    init_logging();
    let handler = ResponseHandler::new(HandlerConfig::builder().buffer_size(4).build().unwrap()).unwrap();

    let (gate_tx, gate_rx) = mpsc::channel();
    let body = Body::new(GatedReader { rx: gate_rx }, Some(12));
    let mut transfer = handler.dispatch(response(&["application/octet-stream"], Some(body)), WriterSink(io::sink()));

    gate_tx.send(vec![1u8; 4]).unwrap();
    let first = transfer.receiver().recv().await.unwrap();
    assert!(matches!(first.notification, Notification::Progress { bytes_read: 4, total_length: Some(12), .. }));

    transfer.cancel();
    transfer.cancel();
    assert!(transfer.is_canceled());
    // unblock the in-flight read
    drop(gate_tx);

    let mut recorder = Recorder::default();
    let outcome = transfer.run(&mut recorder).await.unwrap();

    assert_eq!(outcome, Outcome::Canceled { bytes: 4 });
    assert!(recorder.progress.is_empty());
    assert!(recorder.successes.is_empty());
    assert_eq!(recorder.failures.len(), 1);
    assert!(recorder.failures[0].is_canceled());
}

#[tokio::test]
async fn read_error_is_not_a_cancellation() {
    init_logging();
    let handler = ResponseHandler::new(HandlerConfig::builder().buffer_size(4).build().unwrap()).unwrap();

    let (gate_tx, gate_rx) = mpsc::channel();
    gate_tx.send(vec![1u8; 4]).unwrap();
    drop(gate_tx);

    let body = Body::new(GatedReader { rx: gate_rx }, None);
    let mut recorder = Recorder::default();
    let outcome = handler
        .dispatch(response(&["application/octet-stream"], Some(body)), WriterSink(io::sink()))
        .run(&mut recorder)
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Failed { bytes: 4 });
    assert_eq!(recorder.progress, vec![(200, 4, None)]);
    assert_eq!(recorder.failures.len(), 1);
    assert!(matches!(recorder.failures[0], TransferError::TransferIo(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_transfers_share_one_channel() {
    init_logging();
    let handler = ResponseHandler::new(HandlerConfig::builder().buffer_size(3).build().unwrap()).unwrap();
    let (tx, mut rx) = result_channel();

    let mut tasks = Vec::new();
    for size in [10usize, 20, 30, 40] {
        let resp = response(&["text/plain"], Some(Body::from_bytes(vec![0u8; size])));
        tasks.push((size, handler.spawn(resp, WriterSink(io::sink()), &tx, TransferControl::new())));
    }
    drop(tx);

    let mut expected: HashMap<TransferId, usize> = HashMap::new();
    for (size, task) in tasks {
        expected.insert(task.id(), size);
        assert_eq!(task.join().await.unwrap(), Outcome::Succeeded { bytes: size as u64 });
    }

    let mut per_transfer: HashMap<TransferId, Vec<Notification>> = HashMap::new();
    while let Some(Envelope { transfer, notification }) = rx.recv().await {
        per_transfer.entry(transfer).or_default().push(notification);
    }

    assert_eq!(per_transfer.len(), 4);
    for (id, notes) in per_transfer {
        let size = expected[&id] as u64;
        let (last, progress) = notes.split_last().unwrap();
        assert!(matches!(last, Notification::Success { .. }));

        let mut previous = 0;
        for n in progress {
            let Notification::Progress { bytes_read, .. } = n else {
                panic!("non-progress notification before the terminal one");
            };
            assert!(*bytes_read > previous);
            previous = *bytes_read;
        }
        assert_eq!(previous, size);
        assert_eq!(progress.len() as u64, size.div_ceil(3));
    }
}

#[test]
fn origin_thread_without_runtime_can_drain() {
    init_logging();
    let handler = ResponseHandler::new(
        HandlerConfig::builder()
            .buffer_size(2)
            .collect_body(true)
            .build()
            .unwrap(),
    )
    .unwrap();
    let (tx, mut rx) = result_channel();

    let worker = std::thread::spawn(move || {
        let mut sender = tx.for_transfer(TransferId::new());
        let mut written = Vec::new();
        let outcome = handler.process(
            response(&["text/plain"], Some(Body::from_bytes(b"hello".to_vec()))),
            &mut WriterSink(&mut written),
            &TransferControl::new(),
            &mut sender,
        );
        (outcome, written)
    });

    let mut notes = Vec::new();
    while let Some(envelope) = rx.blocking_recv() {
        notes.push(envelope.notification);
    }
    let (outcome, written) = worker.join().unwrap();

    assert_eq!(outcome, Outcome::Succeeded { bytes: 5 });
    assert_eq!(written, b"hello");
    assert_eq!(notes.len(), 4);
    match notes.pop() {
        Some(Notification::Success { body: Some(body), .. }) => assert_eq!(body, b"hello"),
        other => panic!("expected success, got {:?}", other),
    }
}
