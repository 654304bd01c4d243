//! SIM identifiers

use crate::errors::{AiraloError, Result};

/// ICCIDs end up in the URL path, so only alphanumerics are accepted.
///
/// # Errors
/// Returns `AiraloError::Validation` for an empty or malformed ICCID.
pub fn validate_iccid(iccid: &str) -> Result<()> {
    if iccid.is_empty() {
        return Err(AiraloError::Validation("The parameter \"iccid\" is required.".into()));
    }

    if !iccid.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AiraloError::Validation(format!("The iccid `{iccid}` is not valid.")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_numeric_iccid() {
        assert!(validate_iccid("8944465400000267221").is_ok());
    }

    #[test]
    fn rejects_empty_and_path_like_values() {
        assert!(validate_iccid("").is_err());
        assert!(validate_iccid("89/../usage").is_err());
    }
}
