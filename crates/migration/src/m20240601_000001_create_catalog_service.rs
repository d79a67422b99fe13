//! Create `catalog_service` table.
//!
//! One row per service offered on the price list. `position` is nullable but
//! UNIQUE: it carries the admin-controlled display order.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CatalogService::Table)
                    .if_not_exists()
                    .col(text(CatalogService::Name).primary_key())
                    .col(integer_null(CatalogService::Bike))
                    .col(integer_null(CatalogService::Sedan))
                    .col(integer_null(CatalogService::Suv))
                    .col(integer_null(CatalogService::Position).unique_key())
                    .col(boolean(CatalogService::Visible).default(true))
                    .col(text_null(CatalogService::Description))
                    .col(
                        timestamp_with_time_zone(CatalogService::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CatalogService::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CatalogService {
    Table,
    Name,
    Bike,
    Sedan,
    Suv,
    Position,
    Visible,
    Description,
    UpdatedAt,
}
