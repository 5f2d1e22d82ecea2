//! Domain types mirrored from the billing backend, plus the pure UI rules
//! (phone normalization, provisioning mode, portal wizard) built on them.

pub mod billing;
pub mod client;
pub mod collections;
pub mod contract;
pub mod landing;
pub mod offer;
pub mod phone;
pub mod provisioning;
pub mod types;
pub mod wizard;
