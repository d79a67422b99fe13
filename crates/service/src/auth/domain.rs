use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role carried by every admin token.
pub const OWNER_ROLE: &str = "owner";

/// Login input. Accepts the short `user`/`pass` keys used by the admin page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginInput {
    #[serde(default, alias = "user")]
    pub username: String,
    #[serde(default, alias = "pass")]
    pub password: String,
}

/// JWT claims for an admin session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Login result (session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
