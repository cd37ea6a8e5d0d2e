use anyhow::{Context, Error};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use url::Url;

use super::auth::AuthTokens;
use super::{Backend, BackendError, BackendSession};
use crate::config::BackendConfig;
use crate::utils::preview;

static CSRF_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""SNlM0e":"([^"]+)""#).expect("csrf pattern must compile"));

const USER_AGENT: &str = concat!("notebooklm2api/", env!("CARGO_PKG_VERSION"));

#[derive(Serialize)]
struct AskRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct AskResponse {
    answer: String,
}

/// Token the web app embeds in its home page for the logged-in user.
pub fn extract_csrf_token(page: &str) -> Option<String> {
    CSRF_TOKEN
        .captures(page)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn ask_url(base_url: &Url, notebook_id: &str) -> Result<Url, BackendError> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| BackendError::Url(base_url.to_string()))?
        .pop_if_empty()
        .extend(["api", "notebooks", notebook_id, "ask"]);
    Ok(url)
}

pub struct NotebookLmBackend {
    base_url: Url,
    host: String,
    config: BackendConfig,
}

impl NotebookLmBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, Error> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("invalid NotebookLM base URL {:?}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::msg(format!(
                "NotebookLM base URL {} cannot carry a path",
                base_url
            )));
        }
        let host = base_url
            .host_str()
            .ok_or_else(|| Error::msg(format!("NotebookLM base URL {} has no host", base_url)))?
            .to_string();
        Ok(NotebookLmBackend {
            base_url,
            host,
            config: config.clone(),
        })
    }
}

pub struct NotebookLmSession {
    client: reqwest::Client,
    base_url: Url,
    csrf_token: String,
}

impl Backend for NotebookLmBackend {
    type Session = NotebookLmSession;

    async fn open(&self) -> Result<NotebookLmSession, BackendError> {
        let tokens = AuthTokens::load(&self.config, &self.host).await?;

        let mut headers = HeaderMap::new();
        let cookie = HeaderValue::from_str(&tokens.cookie_header())
            .map_err(|e| BackendError::Auth(format!("cookie values are not valid header text: {}", e)))?;
        headers.insert(COOKIE, cookie);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .build()?;

        let response = client.get(self.base_url.clone()).send().await?;
        let status = response.status();
        let page = response.text().await?;
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: preview(&page, 200),
            });
        }

        let csrf_token = extract_csrf_token(&page).ok_or_else(|| {
            BackendError::Auth(
                "NotebookLM did not issue a session token, the exported cookies have likely expired"
                    .to_string(),
            )
        })?;
        debug!("Opened NotebookLM session against {}", self.base_url);

        Ok(NotebookLmSession {
            client,
            base_url: self.base_url.clone(),
            csrf_token,
        })
    }
}

impl BackendSession for NotebookLmSession {
    async fn ask(&mut self, notebook_id: &str, query: &str) -> Result<String, BackendError> {
        let url = ask_url(&self.base_url, notebook_id)?;
        debug!("Asking NotebookLM: {}", url);

        let response = self
            .client
            .post(url)
            .header("X-Same-Domain", "1")
            .header("X-Csrf-Token", &self.csrf_token)
            .json(&AskRequest { query })
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;
        if !status.is_success() {
            error!(
                "NotebookLM returned error status {}: {}",
                status, response_text
            );
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: preview(&response_text, 200),
            });
        }

        let parsed: AskResponse = serde_json::from_str(&response_text).map_err(|e| {
            error!(
                "Error parsing NotebookLM answer: {}\nRaw response: {}",
                e, response_text
            );
            BackendError::Decode(e.to_string())
        })?;
        Ok(parsed.answer)
    }

    async fn close(self) {
        drop(self.client);
        debug!("NotebookLM session released");
    }
}
