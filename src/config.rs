use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub endpoint: String,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    /// Base URL of this server; activation links point here.
    pub public_url: String,
    /// Front-end URL to redirect to after a successful activation.
    pub service_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "folio".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "folio-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let mail = MailConfig {
            endpoint: std::env::var("MAIL_API_ENDPOINT")?,
            api_key: std::env::var("MAIL_API_KEY")?,
            from: std::env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@folio.local".into()),
        };
        Ok(Self {
            database_url,
            jwt,
            mail,
            public_url: std::env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            service_url: std::env::var("SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
        })
    }
}
