use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr, TransactionTrait};
use uuid::Uuid;

use super::test_db;
use crate::catalog_service::{self, ActiveModel, Entity};

fn row(name: &str, position: Option<i32>) -> ActiveModel {
    ActiveModel {
        name: Set(name.to_string()),
        bike: Set(None),
        sedan: Set(Some(150)),
        suv: Set(Some(200)),
        position: Set(position),
        visible: Set(true),
        description: Set(Some("test row".into())),
        updated_at: Set(Utc::now().into()),
    }
}

/// Insert, read back, update and delete a row that has no position.
#[tokio::test]
async fn test_catalog_row_crud() -> anyhow::Result<()> {
    let Some(db) = test_db().await? else { return Ok(()) };

    let name = format!("crud_{}", Uuid::new_v4());
    let created = row(&name, None).insert(&db).await?;
    assert_eq!(created.name, name);
    assert_eq!(created.position, None);
    assert!(created.visible);

    let all = catalog_service::find_all(&db).await?;
    assert!(all.iter().any(|m| m.name == name));

    let mut am: ActiveModel = created.into();
    am.visible = Set(false);
    am.sedan = Set(None);
    let updated = am.update(&db).await?;
    assert!(!updated.visible);
    assert_eq!(updated.sedan, None);

    let res = Entity::delete_many().filter(catalog_service::Column::Name.eq(name.clone())).exec(&db).await?;
    assert_eq!(res.rows_affected, 1);
    assert!(Entity::find_by_id(name).one(&db).await?.is_none());
    Ok(())
}

/// Two rows on the same position are rejected by the unique index, and the
/// error is classified as a unique constraint violation.
#[tokio::test]
async fn test_position_unique_constraint() -> anyhow::Result<()> {
    let Some(db) = test_db().await? else { return Ok(()) };

    // 使用事务并回滚，不污染共享表
    let txn = db.begin().await?;
    let pos = 1_000_000 + (Uuid::new_v4().as_u128() % 1_000_000) as i32;
    row(&format!("uniq_a_{}", Uuid::new_v4()), Some(pos)).insert(&txn).await?;
    let err = row(&format!("uniq_b_{}", Uuid::new_v4()), Some(pos))
        .insert(&txn)
        .await
        .expect_err("duplicate position must fail");
    assert!(matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))));
    txn.rollback().await?;
    Ok(())
}

/// NULL positions never collide with each other.
#[tokio::test]
async fn test_null_positions_do_not_collide() -> anyhow::Result<()> {
    let Some(db) = test_db().await? else { return Ok(()) };

    let txn = db.begin().await?;
    row(&format!("null_a_{}", Uuid::new_v4()), None).insert(&txn).await?;
    row(&format!("null_b_{}", Uuid::new_v4()), None).insert(&txn).await?;
    txn.rollback().await?;
    Ok(())
}
