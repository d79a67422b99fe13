use axum::{
    extract::{rejection::JsonRejection, Query, Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use service::auth::{domain::LoginInput, AdminAuthService};
use service::catalog::CatalogService;

use crate::errors::JsonApiError;
use crate::routes::services::ListQuery;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub auth: AdminAuthService,
}

#[derive(Debug, Serialize)]
pub struct LoginOutput {
    pub ok: bool,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[utoipa::path(
    post, path = "/admin/login", tag = "auth",
    request_body = crate::openapi::LoginRequest,
    responses(
        (status = 200, description = "Logged In"),
        (status = 400, description = "Missing Credentials"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let Json(input) = payload?;
    let session = state.auth.login(input)?;

    let mut cookie = Cookie::new(AUTH_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);

    Ok((jar, Json(LoginOutput { ok: true, token: session.token, expires_at: session.expires_at })))
}

#[utoipa::path(post, path = "/admin/logout", tag = "auth", responses((status = 204, description = "Logged Out")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    let jar = jar.remove(cookie);
    (jar, StatusCode::NO_CONTENT)
}

/// GET 且查询参数与 `/services` 列表解析结果一致地标记为公开
fn is_public_read(req: &Request) -> bool {
    req.method() == Method::GET
        && Query::<ListQuery>::try_from_uri(req.uri()).is_ok_and(|Query(q)| q.is_public())
}

/// 从 Authorization: Bearer 头读取 token，缺失时回退到 auth_token Cookie
fn extract_token(req: &Request) -> Option<String> {
    if let Some(h) = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return h
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
    }
    CookieJar::from_headers(req.headers())
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// 管理接口中间件：公开读取（GET ?public=1）与 CORS 预检放行，其余请求必须携带有效的 owner token
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS || is_public_read(&req) {
        return next.run(req).await;
    }

    let path = req.uri().path().to_string();
    let Some(token) = extract_token(&req) else {
        warn!(path = %path, "missing bearer token and auth_token cookie");
        return JsonApiError::unauthorized().into_response();
    };

    match state.auth.verify(&token) {
        Ok(claims) => {
            info!(path = %path, sub = %claims.sub, "admin request authorized");
            next.run(req).await
        }
        Err(e) => {
            warn!(path = %path, err = %e, "token validation failed");
            JsonApiError::unauthorized().into_response()
        }
    }
}
