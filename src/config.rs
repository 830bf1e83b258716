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
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub upload_dir: String,
    pub max_upload_bytes: usize,
    pub events_page_size: i64,
    pub admin_page_size: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "crowdconnect".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "crowdconnect-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        Ok(Self {
            database_url,
            jwt,
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(16 * 1024 * 1024),
            events_page_size: std::env::var("EVENTS_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(10),
            admin_page_size: std::env::var("ADMIN_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(20),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_optional_vars_are_missing() {
        std::env::set_var("DATABASE_URL", "postgres://localhost/crowdconnect");
        std::env::set_var("JWT_SECRET", "test-secret");
        std::env::remove_var("UPLOAD_DIR");
        std::env::remove_var("MAX_UPLOAD_BYTES");
        std::env::remove_var("EVENTS_PAGE_SIZE");
        std::env::remove_var("ADMIN_PAGE_SIZE");

        let config = AppConfig::from_env().expect("config should load");
        assert_eq!(config.upload_dir, "uploads");
        assert_eq!(config.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.events_page_size, 10);
        assert_eq!(config.admin_page_size, 20);
        assert_eq!(config.jwt.ttl_minutes, 60);
    }
}
