//! Transport seam between prepared requests and the network

use std::fmt::Write as _;
use std::time::Duration;

use airalo_domain::{AiraloError, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use reqwest::{Client as ReqwestClient, Request};
use thiserror::Error;
use tracing::debug;

use super::response::RawResponse;
use crate::errors::InfraError;

/// Certificate checking for one round trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsMode {
    #[default]
    Verify,
    AcceptInvalid,
}

/// Failure of a single round trip.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Per-request failure; recorded as a response with status 0.
    #[error("I/O failure: {0}")]
    Io(String),

    /// The transport itself is unusable; aborts a multiplexed run.
    #[error("transport fault: {0}")]
    Fatal(String),
}

// Errors from sending or reading one request only affect that request.
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::Io(AiraloError::from(InfraError::from(err)).to_string())
    }
}

/// Executes one prepared request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn round_trip(
        &self,
        request: Request,
        tls: TlsMode,
    ) -> std::result::Result<RawResponse, TransportError>;
}

/// [`Transport`] backed by reqwest.
///
/// The certificate-ignoring client is only built the first time a request
/// asks for it.
pub struct ReqwestTransport {
    verified: ReqwestClient,
    insecure: OnceCell<ReqwestClient>,
    connect_timeout: Duration,
    user_agent: Option<String>,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    fn client(&self, tls: TlsMode) -> std::result::Result<&ReqwestClient, TransportError> {
        match tls {
            TlsMode::Verify => Ok(&self.verified),
            TlsMode::AcceptInvalid => self.insecure.get_or_try_init(|| {
                build_client(self.connect_timeout, self.user_agent.as_deref(), true)
                    .map_err(|err| TransportError::Fatal(err.to_string()))
            }),
        }
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("connect_timeout", &self.connect_timeout)
            .field("insecure_client_built", &self.insecure.get().is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn round_trip(
        &self,
        request: Request,
        tls: TlsMode,
    ) -> std::result::Result<RawResponse, TransportError> {
        let client = self.client(tls)?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, ?tls, "sending HTTP request");

        let response = client.execute(request).await?;
        let header_block = render_header_block(&response);
        let status = response.status();
        let body = response.bytes().await?;

        debug!(%method, %url, %status, bytes = body.len(), "received HTTP response");
        Ok(RawResponse::from_parts(header_block, body.to_vec()))
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    connect_timeout: Duration,
    user_agent: Option<String>,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self { connect_timeout: Duration::from_secs(30), user_agent: None }
    }
}

impl ReqwestTransportBuilder {
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// # Errors
    /// Returns `AiraloError::TransportUnavailable` if the HTTP client cannot
    /// be initialised.
    pub fn build(self) -> Result<ReqwestTransport> {
        let verified = build_client(self.connect_timeout, self.user_agent.as_deref(), false)
            .map_err(|err| AiraloError::TransportUnavailable(err.to_string()))?;

        Ok(ReqwestTransport {
            verified,
            insecure: OnceCell::new(),
            connect_timeout: self.connect_timeout,
            user_agent: self.user_agent,
        })
    }
}

fn build_client(
    connect_timeout: Duration,
    user_agent: Option<&str>,
    accept_invalid_certs: bool,
) -> std::result::Result<ReqwestClient, reqwest::Error> {
    let mut builder = ReqwestClient::builder().connect_timeout(connect_timeout).no_proxy();

    if let Some(agent) = user_agent {
        builder = builder.user_agent(agent);
    }

    if accept_invalid_certs {
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder.build()
}

/// Wire-style header block: status line, one `name: value` line per header,
/// blank line.
fn render_header_block(response: &reqwest::Response) -> String {
    let status = response.status();
    let mut block = format!(
        "{:?} {} {}\r\n",
        response.version(),
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    );

    for (name, value) in response.headers() {
        let _ = write!(block, "{}: {}\r\n", name, String::from_utf8_lossy(value.as_bytes()));
    }

    block.push_str("\r\n");
    block
}
