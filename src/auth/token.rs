//! Token secrets and the token set produced by code exchanges and refreshes.

pub mod secret;
pub mod set;

pub use secret::*;
pub use set::*;
