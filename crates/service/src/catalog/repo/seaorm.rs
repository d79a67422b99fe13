use async_trait::async_trait;
use chrono::Utc;
use models::catalog_service::{self, ActiveModel, Column, Entity};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use tracing::debug;

use crate::catalog::domain::{CatalogEntry, WriteOp};
use crate::catalog::errors::CatalogError;
use crate::catalog::repository::{CatalogRepository, Planner};

/// Blocks other writers for the rest of the transaction; plain reads still proceed.
const LOCK_CATALOG_SQL: &str = "LOCK TABLE catalog_service IN SHARE ROW EXCLUSIVE MODE";

pub struct SeaOrmCatalogRepository {
    pub db: DatabaseConnection,
}

#[async_trait]
impl CatalogRepository for SeaOrmCatalogRepository {
    async fn list(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let rows = catalog_service::find_all(&self.db).await?;
        Ok(rows.into_iter().map(CatalogEntry::from).collect())
    }

    async fn transact(&self, planner: Planner) -> Result<usize, CatalogError> {
        // txn 在提前返回时 drop，自动回滚
        let txn = self.db.begin().await?;
        if txn.get_database_backend() == DatabaseBackend::Postgres {
            txn.execute_unprepared(LOCK_CATALOG_SQL).await?;
        }

        let snapshot: Vec<CatalogEntry> = catalog_service::find_all(&txn)
            .await?
            .into_iter()
            .map(CatalogEntry::from)
            .collect();
        let ops = planner(&snapshot)?;
        for op in &ops {
            debug!(?op, "apply catalog write");
            apply(&txn, op).await?;
        }
        txn.commit().await?;
        Ok(ops.len())
    }
}

async fn apply(txn: &DatabaseTransaction, op: &WriteOp) -> Result<(), CatalogError> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    match op {
        WriteOp::Insert { name, fields, position } => {
            let am = ActiveModel {
                name: Set(name.clone()),
                bike: Set(fields.prices.bike),
                sedan: Set(fields.prices.sedan),
                suv: Set(fields.prices.suv),
                position: Set(Some(*position)),
                visible: Set(fields.visible.unwrap_or(true)),
                description: Set(fields.description.clone()),
                updated_at: Set(now),
            };
            Entity::insert(am).exec(txn).await?;
        }
        WriteOp::UpdateFields { name, fields } => {
            let mut update = Entity::update_many()
                .col_expr(Column::Bike, Expr::value(fields.prices.bike))
                .col_expr(Column::Sedan, Expr::value(fields.prices.sedan))
                .col_expr(Column::Suv, Expr::value(fields.prices.suv))
                .col_expr(Column::UpdatedAt, Expr::value(now));
            if let Some(description) = &fields.description {
                update = update.col_expr(Column::Description, Expr::value(description.clone()));
            }
            if let Some(visible) = fields.visible {
                update = update.col_expr(Column::Visible, Expr::value(visible));
            }
            update.filter(Column::Name.eq(name.as_str())).exec(txn).await?;
        }
        WriteOp::Rename { from, to } => {
            Entity::update_many()
                .col_expr(Column::Name, Expr::value(to.clone()))
                .col_expr(Column::UpdatedAt, Expr::value(now))
                .filter(Column::Name.eq(from.as_str()))
                .exec(txn)
                .await?;
        }
        WriteOp::SetPosition { name, position } => {
            Entity::update_many()
                .col_expr(Column::Position, Expr::value(*position))
                .filter(Column::Name.eq(name.as_str()))
                .exec(txn)
                .await?;
        }
        WriteOp::Delete { name } => {
            Entity::delete_many().filter(Column::Name.eq(name.as_str())).exec(txn).await?;
        }
    }
    Ok(())
}
