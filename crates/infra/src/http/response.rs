//! Raw HTTP results

use airalo_domain::{AiraloError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::errors::InfraError;

static STATUS_LINE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?m)^HTTP/?\S*\s+(\d{3})").ok());

/// Status code, raw header block and body of one completed request.
///
/// A status of `0` means no response was obtained (connect failure, timeout,
/// reset).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    status: u16,
    header_block: String,
    body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, header_block: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self { status, header_block: header_block.into(), body: body.into() }
    }

    /// Build from a header block, reading the status from its status line.
    ///
    /// With redirects or `100 Continue` the block may hold several status
    /// lines; the first one is used.
    pub fn from_parts(header_block: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        let header_block = header_block.into();
        let status = parse_status(&header_block);
        Self { status, header_block, body: body.into() }
    }

    /// Placeholder recorded for a request that produced no response.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_unavailable(&self) -> bool {
        self.status == 0
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header_block(&self) -> &str {
        &self.header_block
    }

    /// First value of `name` in the header block, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_block.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    /// Returns `AiraloError::Serialization` when the body is not valid JSON
    /// for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|err| AiraloError::from(InfraError::from(err)))
    }
}

fn parse_status(header_block: &str) -> u16 {
    let Some(regex) = STATUS_LINE.as_ref() else {
        return 0;
    };

    regex
        .captures(header_block)
        .and_then(|caps| caps.get(1)?.as_str().parse::<u16>().ok())
        .unwrap_or(0)
}
