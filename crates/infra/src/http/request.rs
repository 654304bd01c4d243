//! Immutable request descriptions
//!
//! A [`RequestSpec`] says what to send; turning it into something a transport
//! can execute is the job of [`HttpExecutor::prepare`](super::HttpExecutor::prepare).

use std::str::FromStr;
use std::time::Duration;

use airalo_domain::AiraloError;
use reqwest::header::{HeaderName, HeaderValue};
use serde_json::Value;

/// Methods the partner API is called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Head,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Head => "HEAD",
        }
    }

    /// Form pairs travel in the query string rather than the body.
    pub fn encodes_form_in_query(self) -> bool {
        matches!(self, Self::Get | Self::Head)
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Head => reqwest::Method::HEAD,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = AiraloError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "HEAD" => Ok(Self::Head),
            other => Err(AiraloError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// Request payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Raw(Vec<u8>),
    /// Url-encoded pairs; query string for GET/HEAD, body for POST.
    Form(Vec<(String, String)>),
    Json(Value),
}

/// Per-request transport settings. Unset fields fall back to the
/// surrounding defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportOptions {
    pub timeout: Option<Duration>,
    pub accept_invalid_certs: Option<bool>,
    pub http_version: Option<reqwest::Version>,
}

impl TransportOptions {
    /// Fields set in `self` win; the rest come from `defaults`.
    pub fn or(&self, defaults: &TransportOptions) -> TransportOptions {
        TransportOptions {
            timeout: self.timeout.or(defaults.timeout),
            accept_invalid_certs: self.accept_invalid_certs.or(defaults.accept_invalid_certs),
            http_version: self.http_version.or(defaults.http_version),
        }
    }
}

/// What to send: method, URL, body, header lines and options.
///
/// Header lines use the wire form `"Name: value"`. A line with an empty value
/// (`"Expect:"`) suppresses that header instead of sending it.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    method: HttpMethod,
    url: String,
    query: Vec<(String, String)>,
    body: RequestBody,
    headers: Vec<String>,
    options: TransportOptions,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            headers: Vec::new(),
            options: TransportOptions::default(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Head, url)
    }

    pub fn form<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    pub fn json(mut self, value: Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    pub fn raw(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.body = RequestBody::Raw(bytes.into());
        self
    }

    /// Append a query parameter regardless of method.
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, line: impl Into<String>) -> Self {
        self.headers.push(line.into());
        self
    }

    pub fn headers<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers.extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn options(mut self, options: TransportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn header_lines(&self) -> &[String] {
        &self.headers
    }

    pub fn transport_options(&self) -> &TransportOptions {
        &self.options
    }

    /// Copy with `leading` header lines placed before this spec's own and
    /// unset options filled from `defaults`.
    pub(crate) fn with_defaults(&self, leading: &[String], defaults: &TransportOptions) -> Self {
        let mut merged = self.clone();
        if !leading.is_empty() {
            merged.headers = leading.iter().cloned().chain(self.headers.iter().cloned()).collect();
        }
        merged.options = self.options.or(defaults);
        merged
    }
}

/// A parsed header line. `None` value means the header is suppressed.
pub(crate) type HeaderEntry = (HeaderName, Option<HeaderValue>);

/// Parse a `"Name: value"` line.
///
/// # Errors
/// Returns `AiraloError::InvalidRequest` when the line has no colon or the
/// name/value are not valid HTTP tokens.
pub(crate) fn parse_header_line(line: &str) -> Result<HeaderEntry, AiraloError> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| AiraloError::InvalidRequest(format!("malformed header line `{line}`")))?;

    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|_| AiraloError::InvalidRequest(format!("invalid header name in `{line}`")))?;

    let value = value.trim();
    if value.is_empty() {
        return Ok((name, None));
    }

    let value = HeaderValue::from_str(value)
        .map_err(|_| AiraloError::InvalidRequest(format!("invalid header value in `{line}`")))?;

    Ok((name, Some(value)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn method_parsing_is_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!(" POST ".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert_eq!("Head".parse::<HttpMethod>().unwrap(), HttpMethod::Head);
    }

    #[test]
    fn unknown_method_is_unsupported() {
        let err = "PUT".parse::<HttpMethod>().unwrap_err();
        assert_eq!(err, AiraloError::UnsupportedMethod("PUT".into()));
    }

    #[test]
    fn header_line_parsing() {
        let (name, value) = parse_header_line("Content-Type: application/json").unwrap();
        assert_eq!(name.as_str(), "content-type");
        assert_eq!(value.unwrap(), "application/json");

        let (name, value) = parse_header_line("Expect:").unwrap();
        assert_eq!(name.as_str(), "expect");
        assert!(value.is_none());

        assert!(matches!(
            parse_header_line("no colon here"),
            Err(AiraloError::InvalidRequest(_))
        ));
        assert!(parse_header_line("bad name: x").is_err());
    }

    #[test]
    fn spec_options_override_defaults() {
        let defaults = TransportOptions {
            timeout: Some(Duration::from_secs(30)),
            accept_invalid_certs: Some(true),
            http_version: None,
        };
        let spec = RequestSpec::get("https://example.com").timeout(Duration::from_secs(5));

        let merged = spec.with_defaults(&["X-Shared: 1".to_string()], &defaults);
        assert_eq!(merged.transport_options().timeout, Some(Duration::from_secs(5)));
        assert_eq!(merged.transport_options().accept_invalid_certs, Some(true));
        assert_eq!(merged.header_lines(), ["X-Shared: 1".to_string()]);
    }

    #[test]
    fn builder_keeps_body_kinds() {
        let spec = RequestSpec::post("https://example.com").json(json!({"a": 1}));
        assert_eq!(spec.body(), &RequestBody::Json(json!({"a": 1})));

        let spec = RequestSpec::get("https://example.com").form([("page", "2")]);
        assert_eq!(spec.body(), &RequestBody::Form(vec![("page".into(), "2".into())]));
    }
}
