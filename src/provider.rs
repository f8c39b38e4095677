//! Provider-facing metadata: validated endpoint descriptors and Exact Online regions.
//!
//! `descriptor` exposes [`ProviderDescriptor`], the HTTPS-validated endpoint set plus the
//! client-authentication preference consumed by the token client.
//! `region` maps Exact Online data centers onto their default endpoints.

pub mod descriptor;
pub mod region;

pub use descriptor::*;
pub use region::*;
