//! Email delivery of ordered eSIMs
//!
//! An [`EmailSimShare`] is merged into order payloads so the API mails the
//! eSIM to a recipient instead of only returning it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{AiraloError, Result};
use crate::impl_str_enum_conversions;

static EMAIL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok());

/// How the shared eSIM is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharingOption {
    Link,
    Pdf,
}

impl_str_enum_conversions!(SharingOption {
    Link => "link",
    Pdf => "pdf",
});

/// Recipient and delivery options for an email SIM share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailSimShare {
    pub to_email: String,
    pub sharing_option: Vec<SharingOption>,
    #[serde(default)]
    pub copy_address: Vec<String>,
}

impl EmailSimShare {
    pub fn new(to_email: impl Into<String>, sharing_option: Vec<SharingOption>) -> Self {
        Self { to_email: to_email.into(), sharing_option, copy_address: Vec::new() }
    }

    pub fn with_copy_address<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.copy_address = addresses.into_iter().map(Into::into).collect();
        self
    }

    /// Parse sharing options from their wire names, rejecting anything but
    /// `link` and `pdf`.
    ///
    /// # Errors
    /// Returns `AiraloError::Validation` naming the first unknown option.
    pub fn parse_sharing_options<S: AsRef<str>>(options: &[S]) -> Result<Vec<SharingOption>> {
        options
            .iter()
            .map(|option| {
                option.as_ref().parse::<SharingOption>().map_err(|_| {
                    AiraloError::Validation(format!(
                        "The sharing_option may be link or pdf or both, got: {}",
                        option.as_ref()
                    ))
                })
            })
            .collect()
    }

    /// Checks the recipient, the delivery options and every CC address.
    ///
    /// # Errors
    /// Returns `AiraloError::Validation` carrying the offending share.
    pub fn validate(&self) -> Result<()> {
        if !is_email(&self.to_email) {
            return Err(AiraloError::Validation(format!(
                "The to_email is required email address, payload: {}",
                self.to_json()
            )));
        }

        if self.sharing_option.is_empty() {
            return Err(AiraloError::Validation(format!(
                "The sharing_option may be link or pdf or both, payload: {}",
                self.to_json()
            )));
        }

        if let Some(bad) = self.copy_address.iter().find(|address| !is_email(address)) {
            return Err(AiraloError::Validation(format!(
                "The copy_address: {bad} must be valid email address, payload: {}",
                self.to_json()
            )));
        }

        Ok(())
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

fn is_email(candidate: &str) -> bool {
    EMAIL.as_ref().is_some_and(|regex| regex.is_match(candidate))
}
