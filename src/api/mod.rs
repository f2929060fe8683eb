// src/api/mod.rs

pub mod groups;
pub mod health;
pub mod invitations;
pub mod members;

use std::sync::Arc;

use axum::http::HeaderMap;

use crate::config::Config;
use crate::constants::TENANT_HEADER;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::TenantScope;
use crate::services::{InvitationService, LegacyLinks};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub invitations: Arc<InvitationService>,
}

/// Reads the tenant scope every data endpoint runs under.
pub fn require_tenant(headers: &HeaderMap) -> Result<TenantScope> {
    let raw = headers
        .get(TENANT_HEADER)
        .ok_or_else(|| AppError::MissingTenant("Missing X-Tenant-Id header".to_string()))?;
    let raw = raw
        .to_str()
        .map_err(|_| AppError::MissingTenant("Invalid X-Tenant-Id header".to_string()))?;
    let tenant_id = raw
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::MissingTenant(format!("Invalid tenant id: {}", raw)))?;
    Ok(TenantScope::new(tenant_id))
}

pub fn legacy_links<'a>(config: &'a Config, path: &'a str) -> Option<LegacyLinks<'a>> {
    config
        .legacy_next_page_base_url
        .as_ref()
        .map(|base| LegacyLinks { base, path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_HEADER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn require_tenant_reads_header() {
        let scope = require_tenant(&headers(" 42 ")).unwrap();
        assert_eq!(scope.tenant_id, 42);
    }

    #[test]
    fn require_tenant_rejects_missing_or_bad_values() {
        assert!(matches!(
            require_tenant(&HeaderMap::new()),
            Err(AppError::MissingTenant(_))
        ));
        assert!(require_tenant(&headers("abc")).is_err());
        assert!(require_tenant(&headers("0")).is_err());
    }

    #[test]
    fn legacy_links_follow_config() {
        let mut config = crate::config::test_config();
        config.legacy_next_page_base_url = None;
        assert!(legacy_links(&config, "/api/v1/members").is_none());

        config.legacy_next_page_base_url = Some(url::Url::parse("https://api.example.org").unwrap());
        let links = legacy_links(&config, "/api/v1/members").unwrap();
        assert_eq!(links.path, "/api/v1/members");
        assert_eq!(links.base.as_str(), "https://api.example.org/");
    }
}
