//! Migrator for the catalog schema. Run once at deploy/startup time, never
//! from a request handler.
pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_catalog_service;
mod m20240601_000002_seed_default_services;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_catalog_service::Migration),
            // Seed must follow table creation
            Box::new(m20240601_000002_seed_default_services::Migration),
        ]
    }
}
