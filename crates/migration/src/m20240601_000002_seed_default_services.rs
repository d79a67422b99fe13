//! Seed the default price list.
//!
//! Only runs against an empty table, so a catalog that was already edited by
//! an admin is left alone.
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

const SEED_SQL: &str = r#"
INSERT INTO catalog_service (name, bike, sedan, suv, position, visible, updated_at)
SELECT v.name, v.bike, v.sedan, v.suv, v.position, TRUE, NOW()
FROM (VALUES
    ('Basic', 50, 150, 200, 1),
    ('Premium', NULL::INT, 200, 250, 2),
    ('Detailing', NULL::INT, 1500, 2500, 3)
) AS v(name, bike, sedan, suv, position)
WHERE NOT EXISTS (SELECT 1 FROM catalog_service)
"#;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.get_connection().execute_unprepared(SEED_SQL).await?;
        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // 种子数据可能已被管理员修改，回滚时不删除
        Ok(())
    }
}
