use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Directory holding the static front end (index.html, assets/, sw.js)
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), worker_threads: Some(4), static_dir: default_static_dir() }
    }
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_static_dir() -> String { "public".into() }

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    /// Apply pending migrations once at startup, before the listener binds
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            run_migrations: true,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_true() -> bool { true }

/// Admin login settings. Either `password` (hashed once at startup) or an
/// argon2 PHC string in `password_hash` must be present.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_user")]
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_hours: i64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_user(),
            password: None,
            password_hash: None,
            jwt_secret: String::new(),
            token_ttl_hours: default_token_ttl(),
        }
    }
}

fn default_admin_user() -> String { "admin".into() }
fn default_token_ttl() -> i64 { 12 }

/// Environment keys tried in order when `database.url` is empty.
pub const DATABASE_URL_KEYS: [&str; 4] = ["DATABASE_URL", "NEON_DATABASE_URL", "POSTGRES_URL", "PG_CONNECTION_STRING"];

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or start from defaults when it is missing), fill
    /// the gaps from the process environment and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.normalize_with(|k| std::env::var(k).ok());
        self.validate()
    }

    /// 用给定的查找函数填充缺省值；测试中传入 HashMap 以避免修改进程环境
    pub fn normalize_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.server.normalize_with(&lookup);
        self.database.normalize_with(&lookup);
        self.admin.normalize_with(&lookup);
    }

    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.database.validate()?;
        self.admin.validate()?;
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl ServerConfig {
    fn normalize_with<F: Fn(&str) -> Option<String>>(&mut self, lookup: &F) {
        if let Some(h) = non_empty(lookup("SERVER_HOST")) {
            self.host = h;
        }
        if let Some(p) = non_empty(lookup("SERVER_PORT")).and_then(|p| p.parse::<u16>().ok()) {
            self.port = p;
        }
        if let Some(w) = non_empty(lookup("TOKIO_WORKER_THREADS")).and_then(|v| v.parse::<usize>().ok()) {
            self.worker_threads = Some(w);
        }
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.static_dir.trim().is_empty() {
            self.static_dir = default_static_dir();
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("server.port 必须在 1..=65535 范围内"));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    /// 若 TOML 中未提供 URL，则依次尝试常见的环境变量，最后用 PG* 分量拼接
    pub fn normalize_with<F: Fn(&str) -> Option<String>>(&mut self, lookup: &F) {
        if !self.url.trim().is_empty() {
            return;
        }
        for key in DATABASE_URL_KEYS {
            if let Some(url) = non_empty(lookup(key)) {
                self.url = url;
                return;
            }
        }
        if let (Some(host), Some(db), Some(user)) = (
            non_empty(lookup("PGHOST")),
            non_empty(lookup("PGDATABASE")),
            non_empty(lookup("PGUSER")),
        ) {
            let port = non_empty(lookup("PGPORT")).unwrap_or_else(|| "5432".into());
            let password = lookup("PGPASSWORD").unwrap_or_default();
            self.url = format!(
                "postgresql://{}:{}@{}:{}/{}?sslmode=require",
                urlencoding::encode(&user),
                urlencoding::encode(&password),
                host,
                port,
                db
            );
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!(
                "database.url 为空；请在 config.toml 或环境变量 {} 中提供",
                DATABASE_URL_KEYS.join("/")
            ));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url 必须以 postgresql:// 或 postgres:// 开头"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections 必须 >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections 必须 >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database 超时配置必须为正整数秒"));
        }
        Ok(())
    }
}

impl AdminConfig {
    fn normalize_with<F: Fn(&str) -> Option<String>>(&mut self, lookup: &F) {
        if let Some(u) = non_empty(lookup("ADMIN_USER")) {
            self.username = u;
        }
        if self.password.is_none() {
            self.password = non_empty(lookup("ADMIN_PASS"));
        }
        if self.password_hash.is_none() {
            self.password_hash = non_empty(lookup("ADMIN_PASSWORD_HASH"));
        }
        if self.jwt_secret.trim().is_empty() {
            if let Some(s) = non_empty(lookup("ADMIN_JWT_SECRET")) {
                self.jwt_secret = s;
            }
        }
        if self.token_ttl_hours <= 0 {
            self.token_ttl_hours = default_token_ttl();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(anyhow!("admin.username 不能为空"));
        }
        if self.password.is_none() && self.password_hash.is_none() {
            return Err(anyhow!("admin.password 或 admin.password_hash 必须至少提供一个（或设置 ADMIN_PASS）"));
        }
        Ok(())
    }
}
