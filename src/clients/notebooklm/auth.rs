use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use super::BackendError;
use crate::config::BackendConfig;

/// Cookie the service will not authenticate without.
const REQUIRED_COOKIE: &str = "SID";

#[derive(Debug, Deserialize)]
struct StorageState {
    #[serde(default)]
    cookies: Vec<StoredCookie>,
}

#[derive(Debug, Deserialize)]
struct StoredCookie {
    name: String,
    value: String,
    #[serde(default)]
    domain: String,
}

/// Session cookies exported from a logged-in browser (Playwright storage
/// state format).
#[derive(Debug, Clone, PartialEq)]
pub struct AuthTokens {
    cookies: BTreeMap<String, String>,
}

fn domain_matches(cookie_domain: &str, host: &str) -> bool {
    let cookie_domain = cookie_domain.trim_start_matches('.');
    if cookie_domain.is_empty() {
        return false;
    }
    host == cookie_domain || host.ends_with(&format!(".{}", cookie_domain))
}

impl AuthTokens {
    /// Keeps the cookies that would be sent to `host`.
    pub fn from_storage_state(json: &str, host: &str) -> Result<Self, BackendError> {
        let state: StorageState = serde_json::from_str(json)
            .map_err(|e| BackendError::Auth(format!("invalid storage state JSON: {}", e)))?;

        let cookies: BTreeMap<String, String> = state
            .cookies
            .into_iter()
            .filter(|c| domain_matches(&c.domain, host))
            .map(|c| (c.name, c.value))
            .collect();

        if !cookies.contains_key(REQUIRED_COOKIE) {
            return Err(BackendError::Auth(format!(
                "storage state has no {} cookie for {}",
                REQUIRED_COOKIE, host
            )));
        }
        debug!("Loaded {} cookies for {}", cookies.len(), host);
        Ok(AuthTokens { cookies })
    }

    /// Inline JSON first, then the storage-state file.
    pub async fn load(config: &BackendConfig, host: &str) -> Result<Self, BackendError> {
        if let Some(json) = &config.auth_json {
            return Self::from_storage_state(json, host);
        }
        let path = &config.storage_state_path;
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            BackendError::Auth(format!(
                "cannot read storage state {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_storage_state(&json, host)
    }

    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
