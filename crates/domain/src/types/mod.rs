//! Request and catalog types for the partner API

pub mod orders;
pub mod packages;
pub mod sim_share;
pub mod sims;

pub use orders::{OrderLine, OrderPayload};
pub use packages::{CatalogEntry, FlatOperator, FlatPackage, PackageKind, PackageQuery};
pub use sim_share::{EmailSimShare, SharingOption};
pub use sims::validate_iccid;
