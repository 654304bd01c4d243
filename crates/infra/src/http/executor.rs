//! Single-request execution
//!
//! [`HttpExecutor::prepare`] turns a [`RequestSpec`] into a [`Handle`]
//! without touching the network; [`HttpExecutor::execute`] runs it. The
//! multiplexer uses the two halves separately, everything else goes through
//! [`HttpExecutor::send`].

use std::sync::Arc;
use std::time::Duration;

use airalo_domain::constants::{DEFAULT_TIMEOUT_SECS, SDK_HEADER_NAME, SDK_VERSION};
use airalo_domain::{AiraloError, Result, SdkConfig};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, EXPECT};
use reqwest::{Request, Url};
use tracing::{debug, warn};

use super::request::{parse_header_line, RequestBody, RequestSpec};
use super::response::RawResponse;
use super::transport::{TlsMode, Transport, TransportError};

/// A prepared request, ready for a transport.
#[derive(Debug)]
pub struct Handle {
    request: Request,
    tls: TlsMode,
}

impl Handle {
    pub fn method(&self) -> &reqwest::Method {
        self.request.method()
    }

    pub fn url(&self) -> &Url {
        self.request.url()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.request.body().and_then(reqwest::Body::as_bytes)
    }

    pub fn tls(&self) -> TlsMode {
        self.tls
    }
}

/// Prepares and executes requests over a shared [`Transport`].
///
/// Cloning is cheap; clones share the transport.
#[derive(Clone)]
pub struct HttpExecutor {
    transport: Arc<dyn Transport>,
    default_headers: Vec<String>,
    default_timeout: Duration,
}

impl HttpExecutor {
    /// Executor that sends the SDK identification header on every request.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            default_headers: vec![format!("{SDK_HEADER_NAME}: {SDK_VERSION}")],
            default_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Executor carrying the configured extra headers and timeout.
    pub fn from_config(config: &SdkConfig, transport: Arc<dyn Transport>) -> Self {
        Self::new(transport)
            .with_default_headers(config.http_headers.iter().cloned())
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    /// Append header lines sent with every request.
    pub fn with_default_headers<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_headers.extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Validate `spec` and build its handle. No I/O happens here.
    ///
    /// # Errors
    /// Returns `AiraloError::InvalidRequest` for an empty, unparsable or
    /// non-HTTP URL, a malformed header line, or a body that cannot be encoded.
    pub fn prepare(&self, spec: &RequestSpec) -> Result<Handle> {
        let url = spec.url().trim();
        if url.is_empty() {
            return Err(AiraloError::InvalidRequest("request URL is empty".into()));
        }

        let mut url = Url::parse(url)
            .map_err(|err| AiraloError::InvalidRequest(format!("invalid URL `{url}`: {err}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AiraloError::InvalidRequest(format!(
                "unsupported URL scheme `{}` in `{url}`",
                url.scheme()
            )));
        }

        let form_in_query = spec.method().encodes_form_in_query();
        let form_query: &[(String, String)] = match spec.body() {
            RequestBody::Form(pairs) if form_in_query => pairs.as_slice(),
            _ => &[],
        };
        if !spec.query().is_empty() || !form_query.is_empty() {
            url.query_pairs_mut().extend_pairs(form_query).extend_pairs(spec.query());
        }

        let mut request = Request::new(spec.method().to_reqwest(), url);
        *request.headers_mut() = self.header_map(spec.header_lines())?;

        match spec.body() {
            RequestBody::Empty => {}
            RequestBody::Form(_) if form_in_query => {}
            RequestBody::Form(pairs) => {
                let encoded =
                    url::form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish();
                set_default_content_type(&mut request, "application/x-www-form-urlencoded");
                *request.body_mut() = Some(encoded.into());
            }
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(value).map_err(|err| {
                    AiraloError::InvalidRequest(format!("request body is not encodable: {err}"))
                })?;
                set_default_content_type(&mut request, "application/json");
                *request.body_mut() = Some(bytes.into());
            }
            RequestBody::Raw(bytes) => {
                *request.body_mut() = Some(bytes.clone().into());
            }
        }

        let options = spec.transport_options();
        *request.timeout_mut() = Some(options.timeout.unwrap_or(self.default_timeout));
        if let Some(version) = options.http_version {
            *request.version_mut() = version;
        }

        let tls = if options.accept_invalid_certs.unwrap_or(false) {
            TlsMode::AcceptInvalid
        } else {
            TlsMode::Verify
        };

        Ok(Handle { request, tls })
    }

    /// Run a prepared handle.
    ///
    /// A `417 Expectation Failed` answer is retried once without the
    /// `Expect` header. Per-request I/O failures come back as a status-0
    /// [`RawResponse`].
    ///
    /// # Errors
    /// Returns `AiraloError::Transport` when the transport itself faults.
    pub async fn execute(&self, handle: Handle) -> Result<RawResponse> {
        let Handle { request, tls } = handle;
        let retry = request.try_clone();

        let raw = self.dispatch(request, tls).await?;
        if raw.status() != 417 {
            return Ok(raw);
        }

        match retry {
            Some(mut request) => {
                debug!(url = %request.url(), "retrying without Expect header after 417");
                request.headers_mut().remove(EXPECT);
                self.dispatch(request, tls).await
            }
            None => Ok(raw),
        }
    }

    /// Prepare and execute in one step.
    ///
    /// # Errors
    /// Returns the preparation error, or `AiraloError::Transport` on a
    /// transport fault.
    pub async fn send(&self, spec: &RequestSpec) -> Result<RawResponse> {
        let handle = self.prepare(spec)?;
        self.execute(handle).await
    }

    async fn dispatch(&self, request: Request, tls: TlsMode) -> Result<RawResponse> {
        let method = request.method().clone();
        let url = request.url().clone();

        match self.transport.round_trip(request, tls).await {
            Ok(raw) => Ok(raw),
            Err(TransportError::Io(reason)) => {
                warn!(%method, %url, %reason, "request produced no response");
                Ok(RawResponse::unavailable())
            }
            Err(TransportError::Fatal(reason)) => Err(AiraloError::Transport(reason)),
        }
    }

    /// Defaults first, then the request's own lines. A name set by the request
    /// replaces every default value for that name.
    fn header_map(&self, spec_lines: &[String]) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        for line in &self.default_headers {
            if let (name, Some(value)) = parse_header_line(line)? {
                headers.append(name, value);
            }
        }

        let mut overridden = Vec::new();
        for line in spec_lines {
            let (name, value) = parse_header_line(line)?;
            if !overridden.contains(&name) {
                headers.remove(&name);
                overridden.push(name.clone());
            }
            if let Some(value) = value {
                headers.append(name, value);
            }
        }

        Ok(headers)
    }
}

impl std::fmt::Debug for HttpExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpExecutor")
            .field("default_headers", &self.default_headers)
            .field("default_timeout", &self.default_timeout)
            .finish_non_exhaustive()
    }
}

fn set_default_content_type(request: &mut Request, content_type: &'static str) {
    if !request.headers().contains_key(CONTENT_TYPE) {
        request.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http::request::TransportOptions;
    use crate::http::testing::{Reply, ScriptedTransport};

    fn executor(transport: &Arc<ScriptedTransport>) -> HttpExecutor {
        HttpExecutor::new(transport.clone())
    }

    #[test]
    fn get_form_pairs_become_query_string() {
        let transport = ScriptedTransport::ok("{}");
        let spec = RequestSpec::get("https://api.test/v2/packages")
            .form([("filter[type]", "local"), ("limit", "10")])
            .query_param("page", "2");

        let handle = executor(&transport).prepare(&spec).unwrap();
        let query: Vec<(String, String)> = handle.url().query_pairs().into_owned().collect();
        assert_eq!(
            query,
            vec![
                ("filter[type]".to_string(), "local".to_string()),
                ("limit".to_string(), "10".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
        assert!(handle.body_bytes().is_none());
    }

    #[test]
    fn post_form_pairs_are_url_encoded_in_body() {
        let transport = ScriptedTransport::ok("{}");
        let spec = RequestSpec::post("https://api.test/v2/token")
            .form([("client_id", "id"), ("grant_type", "client_credentials")]);

        let handle = executor(&transport).prepare(&spec).unwrap();
        assert_eq!(handle.body_bytes(), Some(&b"client_id=id&grant_type=client_credentials"[..]));
        assert_eq!(handle.headers()[CONTENT_TYPE], "application/x-www-form-urlencoded");
    }

    #[test]
    fn json_body_keeps_explicit_content_type() {
        let transport = ScriptedTransport::ok("{}");
        let spec = RequestSpec::post("https://api.test/v2/orders")
            .header("Content-Type: application/json; charset=utf-8")
            .json(json!({"package_id": "pkg", "quantity": 1}));

        let handle = executor(&transport).prepare(&spec).unwrap();
        assert_eq!(handle.headers()[CONTENT_TYPE], "application/json; charset=utf-8");
        assert_eq!(handle.body_bytes(), Some(&br#"{"package_id":"pkg","quantity":1}"#[..]));
    }

    #[test]
    fn sdk_header_is_sent_and_can_be_replaced() {
        let transport = ScriptedTransport::ok("{}");
        let exec = executor(&transport).with_default_headers(["X-Partner: acme"]);

        let handle = exec.prepare(&RequestSpec::get("https://api.test/")).unwrap();
        assert_eq!(handle.headers()[SDK_HEADER_NAME], SDK_VERSION);
        assert_eq!(handle.headers()["x-partner"], "acme");

        let spec = RequestSpec::get("https://api.test/").header("X-Partner: other");
        let handle = exec.prepare(&spec).unwrap();
        let values: Vec<_> = handle.headers().get_all("x-partner").iter().collect();
        assert_eq!(values, vec!["other"]);
    }

    #[test]
    fn empty_header_value_suppresses_header() {
        let transport = ScriptedTransport::ok("{}");
        let spec = RequestSpec::get("https://api.test/").header(format!("{SDK_HEADER_NAME}:"));
        let handle = executor(&transport).prepare(&spec).unwrap();
        assert!(!handle.headers().contains_key(SDK_HEADER_NAME));
    }

    #[test]
    fn invalid_requests_fail_before_io() {
        let transport = ScriptedTransport::ok("{}");
        let exec = executor(&transport);

        assert!(matches!(exec.prepare(&RequestSpec::get("  ")), Err(AiraloError::InvalidRequest(_))));
        assert!(matches!(
            exec.prepare(&RequestSpec::get("not a url")),
            Err(AiraloError::InvalidRequest(_))
        ));
        assert!(matches!(
            exec.prepare(&RequestSpec::get("https://api.test/").header("broken")),
            Err(AiraloError::InvalidRequest(_))
        ));
        assert!(matches!(
            exec.prepare(&RequestSpec::get("ftp://example.com/file")),
            Err(AiraloError::InvalidRequest(_))
        ));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn options_drive_timeout_and_tls() {
        let transport = ScriptedTransport::ok("{}");
        let exec = executor(&transport).with_timeout(Duration::from_secs(12));

        let handle = exec.prepare(&RequestSpec::get("https://api.test/")).unwrap();
        assert_eq!(handle.request.timeout(), Some(&Duration::from_secs(12)));
        assert_eq!(handle.tls(), TlsMode::Verify);

        let options = TransportOptions {
            timeout: Some(Duration::from_secs(3)),
            accept_invalid_certs: Some(true),
            http_version: None,
        };
        let handle = exec.prepare(&RequestSpec::get("https://api.test/").options(options)).unwrap();
        assert_eq!(handle.request.timeout(), Some(&Duration::from_secs(3)));
        assert_eq!(handle.tls(), TlsMode::AcceptInvalid);
    }

    #[tokio::test]
    async fn expectation_failed_is_retried_without_expect() {
        let transport = ScriptedTransport::new(|request| {
            if request.headers().contains_key(EXPECT) {
                Reply::status(417, "")
            } else {
                Reply::status(200, r#"{"data":{}}"#)
            }
        });

        let spec = RequestSpec::post("https://api.test/v2/orders")
            .header("Expect: 100-continue")
            .header("Authorization: Bearer t")
            .json(json!({"quantity": 1}));
        let raw = executor(&transport).send(&spec).await.unwrap();

        assert_eq!(raw.status(), 200);
        assert_eq!(transport.calls(), 2);
        let retried = transport.seen_headers(1);
        assert!(!retried.contains_key(EXPECT));
        assert_eq!(retried["authorization"], "Bearer t");
    }

    #[tokio::test]
    async fn io_failure_becomes_status_zero() {
        let transport = ScriptedTransport::new(|_| Reply::io("connection reset"));
        let raw = executor(&transport).send(&RequestSpec::get("https://api.test/")).await.unwrap();
        assert!(raw.is_unavailable());
    }

    #[tokio::test]
    async fn fatal_failure_is_an_error() {
        let transport = ScriptedTransport::new(|_| Reply::fatal("client gone"));
        let err = executor(&transport).send(&RequestSpec::get("https://api.test/")).await.unwrap_err();
        assert_eq!(err, AiraloError::Transport("client gone".into()));
    }
}
