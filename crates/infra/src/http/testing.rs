//! Scripted in-memory transport for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Request;

use super::response::RawResponse;
use super::transport::{TlsMode, Transport, TransportError};

/// What the scripted transport answers for one request.
pub(crate) struct Reply {
    delay: Duration,
    outcome: Result<RawResponse, TransportError>,
}

impl Reply {
    pub(crate) fn status(status: u16, body: &str) -> Self {
        let header_block = format!("HTTP/1.1 {status} Scripted\r\n\r\n");
        Self { delay: Duration::ZERO, outcome: Ok(RawResponse::new(status, header_block, body)) }
    }

    pub(crate) fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::status(status, &body.to_string())
    }

    pub(crate) fn io(reason: &str) -> Self {
        Self { delay: Duration::ZERO, outcome: Err(TransportError::Io(reason.to_string())) }
    }

    pub(crate) fn fatal(reason: &str) -> Self {
        Self { delay: Duration::ZERO, outcome: Err(TransportError::Fatal(reason.to_string())) }
    }

    pub(crate) fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Seen {
    pub url: reqwest::Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub tls: TlsMode,
}

type Script = dyn Fn(&Request) -> Reply + Send + Sync;

/// Records every request and tracks how many were in flight at once.
pub(crate) struct ScriptedTransport {
    script: Box<Script>,
    seen: Mutex<Vec<Seen>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedTransport {
    pub(crate) fn new(script: impl Fn(&Request) -> Reply + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            seen: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    /// Answers every request with `200` and `body`.
    pub(crate) fn ok(body: &'static str) -> Arc<Self> {
        Self::new(move |_| Reply::status(200, body))
    }

    pub(crate) fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub(crate) fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn seen_urls(&self) -> Vec<String> {
        self.seen().into_iter().map(|seen| seen.url.to_string()).collect()
    }

    pub(crate) fn seen_headers(&self, index: usize) -> HeaderMap {
        self.seen()[index].headers.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn round_trip(
        &self,
        request: Request,
        tls: TlsMode,
    ) -> Result<RawResponse, TransportError> {
        let reply = (self.script)(&request);
        self.seen.lock().unwrap().push(Seen {
            url: request.url().clone(),
            headers: request.headers().clone(),
            body: request.body().and_then(reqwest::Body::as_bytes).map(<[u8]>::to_vec),
            tls,
        });

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        reply.outcome
    }
}

/// Path of a recorded URL with its query string, e.g. `/v2/packages?page=2`.
pub(crate) fn path_and_query(url: &reqwest::Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
