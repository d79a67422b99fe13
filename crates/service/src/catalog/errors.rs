use models::errors::ModelError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Business errors for catalog workflows
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// A unique constraint fired inside a write transaction. The transaction
    /// was rolled back, so stored state is unchanged.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("store error: {0}")]
    Store(String),
}

impl CatalogError {
    pub fn not_found(name: &str) -> Self {
        CatalogError::NotFound(format!("Service '{name}' not found"))
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            CatalogError::Validation(_) => 2001,
            CatalogError::NotFound(_) => 2003,
            CatalogError::Conflict(_) => 2005,
            CatalogError::Store(_) => 2100,
        }
    }
}

impl From<ModelError> for CatalogError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => CatalogError::Validation(msg),
            ModelError::Db(msg) => CatalogError::Store(msg),
        }
    }
}

impl From<DbErr> for CatalogError {
    fn from(e: DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => CatalogError::Conflict(msg),
            _ => CatalogError::Store(e.to_string()),
        }
    }
}
