use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::CatalogError;

/// Price per vehicle class; `None` means the service is not offered for it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prices {
    pub bike: Option<i32>,
    pub sedan: Option<i32>,
    pub suv: Option<i32>,
}

/// One service on the price list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub position: Option<i32>,
    pub visible: bool,
    #[serde(flatten)]
    pub prices: Prices,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl CatalogEntry {
    /// Display slot. Non-positive stored positions count as unset.
    pub fn slot(&self) -> Option<i32> {
        self.position.filter(|p| *p > 0)
    }
}

impl From<models::catalog_service::Model> for CatalogEntry {
    fn from(m: models::catalog_service::Model) -> Self {
        Self {
            name: m.name,
            position: m.position,
            visible: m.visible,
            prices: Prices { bike: m.bike, sedan: m.sedan, suv: m.suv },
            description: m.description,
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }
}

/// Payload written by an upsert.
///
/// Prices always replace the stored ones. `description` and `visible` keep
/// the stored value when `None`; a new entry is visible with no description.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceFields {
    pub prices: Prices,
    pub description: Option<String>,
    pub visible: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListFilter {
    All,
    VisibleOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl FromStr for Direction {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(CatalogError::Validation(format!(
                "invalid direction '{other}', expected 'up' or 'down'"
            ))),
        }
    }
}

/// Create-or-update request after name validation.
#[derive(Clone, Debug, PartialEq)]
pub struct UpsertRequest {
    pub name: String,
    pub fields: ServiceFields,
    pub rename_from: Option<String>,
}

/// A single row-level write. Planners emit these; repositories apply them in
/// order inside one transaction.
#[derive(Clone, Debug, PartialEq)]
pub enum WriteOp {
    Insert { name: String, fields: ServiceFields, position: i32 },
    UpdateFields { name: String, fields: ServiceFields },
    Rename { from: String, to: String },
    SetPosition { name: String, position: Option<i32> },
    Delete { name: String },
}

/// Lenient price parsing for admin form input: numbers are taken as-is,
/// strings contribute their first run of digits after dropping `,`.
pub fn parse_price(v: &serde_json::Value) -> Option<i32> {
    match v {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return i32::try_from(i).ok().filter(|p| *p >= 0);
            }
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && *f <= i32::MAX as f64)
                .map(|f| f.trunc() as i32)
        }
        serde_json::Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| *c != ',').collect();
            let digits: String = cleaned
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if digits.is_empty() {
                None
            } else {
                digits.parse::<i32>().ok()
            }
        }
        _ => None,
    }
}
