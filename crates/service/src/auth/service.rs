use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use tracing::{info, instrument, warn};

use super::domain::{AdminClaims, AdminSession, LoginInput, OWNER_ROLE};
use super::errors::AuthError;

/// Admin auth configuration
#[derive(Clone)]
pub struct AdminAuthConfig {
    pub username: String,
    /// argon2 PHC string
    pub password_hash: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

impl AdminAuthConfig {
    /// Build from a plaintext password, hashing it once.
    pub fn with_plain_password(
        username: impl Into<String>,
        password: &str,
        jwt_secret: impl Into<String>,
        token_ttl: Duration,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            username: username.into(),
            password_hash: hash_password(password)?,
            jwt_secret: jwt_secret.into(),
            token_ttl,
        })
    }
}

/// Hash a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?
        .to_string())
}

/// Admin login and token verification, independent of web framework
#[derive(Clone)]
pub struct AdminAuthService {
    cfg: AdminAuthConfig,
}

impl AdminAuthService {
    pub fn new(cfg: AdminAuthConfig) -> Result<Self, AuthError> {
        if cfg.jwt_secret.is_empty() {
            return Err(AuthError::Validation("jwt secret must not be empty".into()));
        }
        PasswordHash::new(&cfg.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        Ok(Self { cfg })
    }

    /// Check the owner credentials and issue a signed session token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AdminAuthConfig, AdminAuthService};
    /// use service::auth::domain::LoginInput;
    /// let cfg = AdminAuthConfig::with_plain_password("admin", "hunter22", "secret", chrono::Duration::hours(12)).unwrap();
    /// let svc = AdminAuthService::new(cfg).unwrap();
    /// let session = svc.login(LoginInput { username: "admin".into(), password: "hunter22".into() }).unwrap();
    /// let claims = svc.verify(&session.token).unwrap();
    /// assert_eq!(claims.role, "owner");
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub fn login(&self, input: LoginInput) -> Result<AdminSession, AuthError> {
        if input.username.trim().is_empty() || input.password.is_empty() {
            return Err(AuthError::Validation("username and password are required".into()));
        }

        let parsed = PasswordHash::new(&self.cfg.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        let password_ok = Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_ok();
        if input.username.trim() != self.cfg.username || !password_ok {
            warn!("admin_login_failed");
            return Err(AuthError::Unauthorized);
        }

        let now = Utc::now();
        let expires_at = now + self.cfg.token_ttl;
        let claims = AdminClaims {
            sub: self.cfg.username.clone(),
            role: OWNER_ROLE.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(self.cfg.jwt_secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))?;

        info!(expires_at = %expires_at, "admin_logged_in");
        Ok(AdminSession { token, expires_at })
    }

    /// Validate signature, expiry and role of a session token.
    pub fn verify(&self, token: &str) -> Result<AdminClaims, AuthError> {
        let data = decode::<AdminClaims>(
            token,
            &DecodingKey::from_secret(self.cfg.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| AuthError::Unauthorized)?;
        if data.claims.role != OWNER_ROLE {
            return Err(AuthError::Unauthorized);
        }
        Ok(data.claims)
    }
}
