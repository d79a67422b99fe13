pub mod errors;
pub mod db;
pub mod catalog_service;

#[cfg(test)]
mod tests;
