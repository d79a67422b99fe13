//! Admin auth: password login for the single shop owner account and
//! verification of the session tokens it issues.

pub mod domain;
pub mod errors;
pub mod service;

pub use service::{AdminAuthConfig, AdminAuthService};
