//! HTTP core: request model, transport seam, single-request executor and the
//! rolling-window multiplexer.

pub mod executor;
pub mod multiplexer;
mod reactor;
pub mod request;
pub mod response;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use executor::{Handle, HttpExecutor};
pub use multiplexer::{effective_window, RequestMultiplexer, RunOutcome, TagCollisionPolicy};
pub use request::{HttpMethod, RequestBody, RequestSpec, TransportOptions};
pub use response::RawResponse;
pub use transport::{ReqwestTransport, ReqwestTransportBuilder, TlsMode, Transport, TransportError};
