use chrono::FixedOffset;
use std::env;
use url::Url;

use crate::constants::{
    DEFAULT_INVITATION_DAILY_REQUEST_LIMIT, DEFAULT_INVITATION_DAILY_RETRY_LIMIT,
    DEFAULT_RATE_LIMIT_UTC_OFFSET,
};
use crate::utils::is_truthy;

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,
    pub run_migrations: bool,

    // Invitation throttling
    pub invitation_daily_request_limit: u32,
    pub invitation_daily_retry_limit: u32,
    pub rate_limit_utc_offset: FixedOffset,

    // Offset-mode "next page" links, disabled unless a base URL is set
    pub legacy_next_page_base_url: Option<Url>,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let offset_raw = env::var("RATE_LIMIT_UTC_OFFSET")
            .unwrap_or_else(|_| DEFAULT_RATE_LIMIT_UTC_OFFSET.to_string());
        let rate_limit_utc_offset = parse_utc_offset(&offset_raw)
            .ok_or_else(|| anyhow::anyhow!("Invalid RATE_LIMIT_UTC_OFFSET: {}", offset_raw))?;

        let legacy_next_page_base_url = match env::var("LEGACY_NEXT_PAGE_BASE_URL") {
            Ok(raw) if !raw.trim().is_empty() => Some(Url::parse(raw.trim())?),
            _ => None,
        };

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,
            run_migrations: env::var("RUN_MIGRATIONS")
                .map(|v| is_truthy(&v))
                .unwrap_or(true),

            invitation_daily_request_limit: env::var("INVITATION_DAILY_REQUEST_LIMIT")
                .unwrap_or_else(|_| DEFAULT_INVITATION_DAILY_REQUEST_LIMIT.to_string())
                .parse()?,
            invitation_daily_retry_limit: env::var("INVITATION_DAILY_RETRY_LIMIT")
                .unwrap_or_else(|_| DEFAULT_INVITATION_DAILY_RETRY_LIMIT.to_string())
                .parse()?,
            rate_limit_utc_offset,

            legacy_next_page_base_url,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }
        if self.database_max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be > 0");
        }

        if self.invitation_daily_request_limit == 0 {
            tracing::warn!("INVITATION_DAILY_REQUEST_LIMIT is 0; only the first request of each day will pass");
        }
        if self.invitation_daily_retry_limit == 0 {
            tracing::warn!("INVITATION_DAILY_RETRY_LIMIT is 0; only the first retry of each day will pass");
        }

        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        if let Some(url) = &self.legacy_next_page_base_url {
            tracing::info!("Legacy next-page links enabled with base {}", url);
        }

        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

/// Parses `+HH:MM`, `-HH:MM`, `+HHMM`, `Z` or `UTC` into a fixed offset.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }
    raw.parse::<FixedOffset>().ok()
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 3000,
        environment: "development".to_string(),
        database_url: "postgres://localhost/church".to_string(),
        database_max_connections: 1,
        run_migrations: false,
        invitation_daily_request_limit: 5,
        invitation_daily_retry_limit: 3,
        rate_limit_utc_offset: FixedOffset::east_opt(0).expect("zero offset"),
        legacy_next_page_base_url: None,
        cors_allowed_origins: "*".to_string(),
    }
}
