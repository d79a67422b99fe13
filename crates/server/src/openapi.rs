use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub user: String, pub pass: String }

/// Prices accept numbers or strings such as `"₹1,500"`; an empty string clears the price.
#[derive(ToSchema, serde::Deserialize)]
pub struct UpsertServiceDoc {
    pub name: String,
    #[serde(rename = "originalName")]
    pub original_name: Option<String>,
    pub bike: Option<String>,
    pub sedan: Option<String>,
    pub suv: Option<String>,
    pub description: Option<String>,
    pub visible: Option<bool>,
}

/// `direction` is `up`, `down` or `set`; `target` is required for `set`.
#[derive(ToSchema)]
pub struct ReorderDoc {
    pub name: String,
    pub direction: String,
    pub target: Option<i64>,
}

#[derive(ToSchema)]
pub struct DeleteServiceDoc { pub name: String }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::services::list,
        crate::routes::services::upsert,
        crate::routes::services::reorder,
        crate::routes::services::delete,
        crate::routes::services::prices,
    ),
    components(
        schemas(
            HealthResponse,
            LoginRequest,
            UpsertServiceDoc,
            ReorderDoc,
            DeleteServiceDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "services")
    )
)]
pub struct ApiDoc;
