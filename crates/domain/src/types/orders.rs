//! Order request types
//!
//! Each line of a bulk order becomes one [`OrderPayload`], validated by the
//! same rules a single order uses.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BULK_DESCRIPTION, ORDER_QUANTITY_LIMIT};
use crate::errors::{AiraloError, Result};
use crate::types::sim_share::{EmailSimShare, SharingOption};

/// One `package_id × quantity` line of a (bulk) order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub package_id: String,
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(package_id: impl Into<String>, quantity: u32) -> Self {
        Self { package_id: package_id.into(), quantity }
    }
}

/// JSON body of `POST orders` / `POST orders-async`.
///
/// Field order is part of the signed representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPayload {
    pub package_id: String,
    pub quantity: u32,
    #[serde(rename = "type")]
    pub order_type: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_email: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sharing_option: Vec<SharingOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub copy_address: Vec<String>,
}

impl OrderPayload {
    pub fn sim(line: &OrderLine, description: Option<&str>) -> Self {
        Self {
            package_id: line.package_id.clone(),
            quantity: line.quantity,
            order_type: "sim".to_string(),
            description: description.unwrap_or(DEFAULT_BULK_DESCRIPTION).to_string(),
            webhook_url: None,
            to_email: None,
            sharing_option: Vec::new(),
            copy_address: Vec::new(),
        }
    }

    pub fn with_webhook(mut self, webhook_url: Option<&str>) -> Self {
        self.webhook_url = webhook_url.map(str::to_string);
        self
    }

    /// Deliver the ordered eSIM by email as described by `share`.
    pub fn with_email_share(mut self, share: &EmailSimShare) -> Self {
        self.to_email = Some(share.to_email.clone());
        self.sharing_option = share.sharing_option.clone();
        self.copy_address = share.copy_address.clone();
        self
    }

    /// Per-item rules shared by single and bulk orders.
    ///
    /// # Errors
    /// Returns `AiraloError::Validation` carrying the offending payload.
    pub fn validate(&self) -> Result<()> {
        if self.package_id.trim().is_empty() {
            return Err(AiraloError::Validation(format!(
                "The package_id is required, payload: {}",
                self.to_json()
            )));
        }

        if self.quantity < 1 {
            return Err(AiraloError::Validation(format!(
                "The quantity is required, payload: {}",
                self.to_json()
            )));
        }

        if self.quantity > ORDER_QUANTITY_LIMIT {
            return Err(AiraloError::Validation(format!(
                "The quantity may not be greater than {ORDER_QUANTITY_LIMIT}, payload: {}",
                self.to_json()
            )));
        }

        Ok(())
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_payload_uses_default_description() {
        let payload = OrderPayload::sim(&OrderLine::new("kallur-digital-7days-1gb", 2), None);
        assert_eq!(payload.order_type, "sim");
        assert_eq!(payload.description, DEFAULT_BULK_DESCRIPTION);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn zero_quantity_is_rejected_with_payload() {
        let payload = OrderPayload::sim(&OrderLine::new("pkg-a", 0), None);
        let err = payload.validate().unwrap_err();
        match err {
            AiraloError::Validation(msg) => {
                assert!(msg.contains("quantity"));
                assert!(msg.contains("pkg-a"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn quantity_above_limit_is_rejected() {
        let payload = OrderPayload::sim(&OrderLine::new("pkg-a", ORDER_QUANTITY_LIMIT + 1), None);
        assert!(payload.validate().is_err());
    }

    #[test]
    fn blank_package_id_is_rejected() {
        let payload = OrderPayload::sim(&OrderLine::new(" ", 1), None);
        assert!(payload.validate().unwrap_err().to_string().contains("package_id"));
    }

    #[test]
    fn serializes_in_signed_field_order() {
        let payload = OrderPayload::sim(&OrderLine::new("pkg", 1), Some("test"))
            .with_webhook(Some("https://hooks.example.com"));
        assert_eq!(
            payload.to_json(),
            r#"{"package_id":"pkg","quantity":1,"type":"sim","description":"test","webhook_url":"https://hooks.example.com"}"#
        );
    }

    #[test]
    fn email_share_fields_follow_the_order_fields() {
        let share = EmailSimShare::new("traveller@example.com", vec![SharingOption::Pdf])
            .with_copy_address(["ops@example.com"]);
        let payload = OrderPayload::sim(&OrderLine::new("pkg", 1), Some("test")).with_email_share(&share);
        assert_eq!(
            payload.to_json(),
            r#"{"package_id":"pkg","quantity":1,"type":"sim","description":"test","to_email":"traveller@example.com","sharing_option":["pdf"],"copy_address":["ops@example.com"]}"#
        );
    }
}
