//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::Redirect;
use axum::routing::get;
use parking_lot::Mutex;
use tokio::net::TcpListener;

use voicewatch::Error;
use voicewatch::reporting::ErrorReporter;
use voicewatch::utils::retry::RetryPolicy;

/// Records every request it sees. `/hook` fails with 500 while
/// `failures_left` is positive.
#[derive(Default)]
pub struct Receiver {
    requests: Mutex<Vec<String>>,
    failures_left: AtomicUsize,
}

impl Receiver {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.split('?').next() == Some(path))
            .count()
    }

    fn record(&self, uri: &Uri) {
        let entry = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());
        self.requests.lock().push(entry);
    }
}

pub struct TestServer {
    pub base: String,
    pub receiver: Arc<Receiver>,
}

/// Start a receiver on an ephemeral port.
pub async fn spawn_receiver(initial_failures: usize) -> TestServer {
    let receiver = Arc::new(Receiver {
        failures_left: AtomicUsize::new(initial_failures),
        ..Default::default()
    });

    let app = Router::new()
        .route("/hook", get(hook))
        .route("/always-500", get(always_500))
        .route("/redirect", get(redirect))
        .fallback(not_found)
        .with_state(receiver.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://{addr}"),
        receiver,
    }
}

/// Address nothing listens on.
pub async fn closed_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn hook(State(receiver): State<Arc<Receiver>>, uri: Uri) -> StatusCode {
    receiver.record(&uri);
    let failing = receiver
        .failures_left
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

async fn always_500(State(receiver): State<Arc<Receiver>>, uri: Uri) -> StatusCode {
    receiver.record(&uri);
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn redirect(State(receiver): State<Arc<Receiver>>, uri: Uri) -> Redirect {
    receiver.record(&uri);
    Redirect::temporary("/hook?from=redirect")
}

async fn not_found(State(receiver): State<Arc<Receiver>>, uri: Uri) -> StatusCode {
    receiver.record(&uri);
    StatusCode::NOT_FOUND
}

/// Three attempts with millisecond backoff.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        min_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    }
}

#[derive(Default)]
pub struct CountingReporter {
    reported: Mutex<Vec<String>>,
}

impl CountingReporter {
    pub fn count(&self) -> usize {
        self.reported.lock().len()
    }
}

impl ErrorReporter for CountingReporter {
    fn report(&self, error: &Error) {
        self.reported.lock().push(error.to_string());
    }
}
