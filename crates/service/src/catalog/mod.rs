//! Catalog module: domain, pure ordering planner, repository, service.
//!
//! The catalog is the price list of wash services shown to customers. Its
//! display order is kept as a dense `1..=n` position per entry.

pub mod domain;
pub mod errors;
pub mod ordering;
pub mod repository;
pub mod service;
pub mod repo;

pub use domain::{parse_price, CatalogEntry, Direction, ListFilter, Prices, ServiceFields};
pub use errors::CatalogError;
pub use service::CatalogService;
