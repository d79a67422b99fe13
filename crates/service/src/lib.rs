//! Service layer providing the business operations behind the HTTP handlers.
//! - `catalog`: the ordered service catalog (display positions, upsert, reorder, delete).
//! - `auth`: admin login and session token verification.
//! - Persistence goes through repository traits so tests can swap in memory stores.

pub mod catalog;
pub mod auth;
#[cfg(test)]
pub mod test_support;
