use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    /// Validity window for a plain login, in minutes.
    pub ttl_minutes: i64,
    /// Validity window for a "remember me" login, in minutes.
    pub remember_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub scoring: ScoringConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "healthguard".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "healthguard-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            remember_ttl_minutes: std::env::var("JWT_REMEMBER_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 365),
        };
        let scoring = ScoringConfig {
            base_url: std::env::var("SCORING_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:5000".into()),
            timeout_secs: std::env::var("SCORING_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        };
        Ok(Self {
            database_url,
            jwt,
            scoring,
        })
    }
}
