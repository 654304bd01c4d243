//! Conversions from external infrastructure errors into domain errors.

use airalo_domain::AiraloError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub AiraloError);

impl From<InfraError> for AiraloError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<AiraloError> for InfraError {
    fn from(value: AiraloError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoAiraloError {
    fn into_airalo(self) -> AiraloError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → AiraloError */
/* -------------------------------------------------------------------------- */

impl IntoAiraloError for HttpError {
    fn into_airalo(self) -> AiraloError {
        if self.is_builder() {
            return AiraloError::InvalidRequest(format!("HTTP request could not be built: {self}"));
        }

        if self.is_timeout() {
            return AiraloError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return AiraloError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => AiraloError::Auth(message),
                _ => AiraloError::Api { status: code, body: message },
            };
        }

        AiraloError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_airalo())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → AiraloError */
/* -------------------------------------------------------------------------- */

impl IntoAiraloError for JsonError {
    fn into_airalo(self) -> AiraloError {
        AiraloError::Serialization(format!(
            "invalid JSON at line {} column {}: {}",
            self.line(),
            self.column(),
            self
        ))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_airalo())
    }
}

/* -------------------------------------------------------------------------- */
/* Config sources → AiraloError */
/* -------------------------------------------------------------------------- */

impl IntoAiraloError for std::io::Error {
    fn into_airalo(self) -> AiraloError {
        AiraloError::Config(format!("Failed to read config file: {self}"))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(value.into_airalo())
    }
}

impl IntoAiraloError for toml::de::Error {
    fn into_airalo(self) -> AiraloError {
        AiraloError::Config(format!("Invalid TOML format: {}", self.message()))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(value.into_airalo())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
