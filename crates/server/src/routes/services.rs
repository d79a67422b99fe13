use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use service::catalog::{parse_price, CatalogEntry, Direction, ListFilter, Prices, ServiceFields};

use crate::{errors::JsonApiError, routes::auth::AppState};

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ListQuery {
    /// `1` for the customer-facing list (no auth)
    pub public: Option<String>,
}

impl ListQuery {
    pub(crate) fn is_public(&self) -> bool {
        self.public.as_deref() == Some("1")
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpsertServiceInput {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "originalName", alias = "original_name")]
    pub original_name: Option<String>,
    #[serde(default)]
    pub bike: Value,
    #[serde(default)]
    pub sedan: Value,
    #[serde(default)]
    pub suv: Value,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub visible: Option<bool>,
}

impl UpsertServiceInput {
    fn fields(&self) -> ServiceFields {
        ServiceFields {
            prices: Prices {
                bike: parse_price(&self.bike),
                sedan: parse_price(&self.sedan),
                suv: parse_price(&self.suv),
            },
            description: self.description.as_ref().map(|d| d.trim().to_string()),
            visible: self.visible,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReorderInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub direction: String,
    #[serde(default, alias = "position")]
    pub target: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteInput {
    #[serde(default)]
    pub name: String,
}

/// Customer-facing row: only what the price list shows.
#[derive(Debug, Serialize)]
pub struct PublicRow {
    pub name: String,
    pub bike: Option<i32>,
    pub sedan: Option<i32>,
    pub suv: Option<i32>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PriceCell {
    #[serde(rename = "Bike")]
    pub bike: Option<i32>,
    #[serde(rename = "Hatch/Sedan")]
    pub sedan: Option<i32>,
    #[serde(rename = "SUV")]
    pub suv: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct PackagePrices {
    pub bike: Option<i32>,
    pub hatchback: Option<i32>,
    pub sedan: Option<i32>,
    pub suv: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct Package {
    /// Stable across reorders
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub prices: PackagePrices,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PricesOutput {
    pub packages: Vec<Package>,
}

fn rows_response(rows: Vec<CatalogEntry>) -> Json<Value> {
    Json(serde_json::json!({ "ok": true, "rows": rows }))
}

fn public_response(rows: Vec<CatalogEntry>) -> Json<Value> {
    let map: BTreeMap<&str, PriceCell> = rows
        .iter()
        .map(|r| (r.name.as_str(), PriceCell { bike: r.prices.bike, sedan: r.prices.sedan, suv: r.prices.suv }))
        .collect();
    let public: Vec<PublicRow> = rows
        .iter()
        .map(|r| PublicRow {
            name: r.name.clone(),
            bike: r.prices.bike,
            sedan: r.prices.sedan,
            suv: r.prices.suv,
            description: r.description.clone(),
        })
        .collect();
    Json(serde_json::json!({ "ok": true, "rows": public, "map": map }))
}

fn parse_target(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[utoipa::path(
    get, path = "/services", tag = "services",
    params(ListQuery),
    responses(
        (status = 200, description = "Ordered catalog"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, axum::extract::rejection::QueryRejection>,
) -> Result<Json<Value>, JsonApiError> {
    let Query(q) = query?;
    if q.is_public() {
        let rows = state.catalog.list(ListFilter::VisibleOnly).await?;
        return Ok(public_response(rows));
    }
    let rows = state.catalog.list(ListFilter::All).await?;
    info!(count = rows.len(), "list catalog");
    Ok(rows_response(rows))
}

#[utoipa::path(
    post, path = "/services", tag = "services",
    request_body = crate::openapi::UpsertServiceDoc,
    responses(
        (status = 200, description = "Saved"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Original Not Found")
    )
)]
pub async fn upsert(
    State(state): State<AppState>,
    payload: Result<Json<UpsertServiceInput>, JsonRejection>,
) -> Result<Json<Value>, JsonApiError> {
    let Json(input) = payload?;
    info!(name = %input.name, original = ?input.original_name, "catalog_upsert_request");
    let rows = state
        .catalog
        .upsert(&input.name, input.fields(), input.original_name.as_deref())
        .await?;
    Ok(rows_response(rows))
}

#[utoipa::path(
    patch, path = "/services", tag = "services",
    request_body = crate::openapi::ReorderDoc,
    responses(
        (status = 200, description = "Reordered"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn reorder(
    State(state): State<AppState>,
    payload: Result<Json<ReorderInput>, JsonRejection>,
) -> Result<Json<Value>, JsonApiError> {
    let Json(input) = payload?;
    let rows = if input.direction.trim().eq_ignore_ascii_case("set") {
        let target = parse_target(&input.target)
            .ok_or_else(|| JsonApiError::bad_request("Provide a numeric target for direction 'set'"))?;
        state.catalog.move_to_position(&input.name, target).await?
    } else {
        let direction: Direction = input.direction.parse()?;
        state.catalog.move_entry(&input.name, direction).await?
    };
    Ok(rows_response(rows))
}

#[utoipa::path(
    delete, path = "/services", tag = "services",
    request_body = crate::openapi::DeleteServiceDoc,
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    payload: Result<Json<DeleteInput>, JsonRejection>,
) -> Result<Json<Value>, JsonApiError> {
    let Json(input) = payload?;
    let rows = state.catalog.delete(&input.name).await?;
    Ok(rows_response(rows))
}

#[utoipa::path(get, path = "/prices", tag = "services", responses((status = 200, description = "Visible packages")))]
pub async fn prices(State(state): State<AppState>) -> Result<Json<PricesOutput>, JsonApiError> {
    let rows = state.catalog.list(ListFilter::VisibleOnly).await?;
    let packages = rows
        .into_iter()
        .map(|r| Package {
            id: r.name.clone(),
            name: r.name,
            description: r.description,
            prices: PackagePrices {
                bike: r.prices.bike,
                hatchback: r.prices.sedan,
                sedan: r.prices.sedan,
                suv: r.prices.suv,
            },
            updated_at: r.updated_at,
        })
        .collect();
    Ok(Json(PricesOutput { packages }))
}
