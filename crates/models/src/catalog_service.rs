use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder};
use serde::{Deserialize, Serialize};

use crate::errors;

/// Longest accepted service name, in characters.
pub const MAX_NAME_LEN: usize = 100;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "catalog_service")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    pub bike: Option<i32>,
    pub sedan: Option<i32>,
    pub suv: Option<i32>,
    #[sea_orm(unique)]
    pub position: Option<i32>,
    pub visible: bool,
    pub description: Option<String>,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Trim and check a service name; returns the trimmed name.
pub fn validate_name(name: &str) -> Result<String, errors::ModelError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(errors::ModelError::Validation("Missing service name".into()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(errors::ModelError::Validation(format!(
            "service name longer than {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// All rows, ordered by name. Display ordering is applied by the caller
/// because it has to treat non-positive positions as unset.
pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Model>, errors::ModelError> {
    Entity::find()
        .order_by_asc(Column::Name)
        .all(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}
