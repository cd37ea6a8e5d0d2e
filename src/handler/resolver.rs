use crate::config::Config;
use crate::errors::ApiError;
use crate::models::ChatRequest;

/// What the backend is asked, and where.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery {
    pub notebook_id: String,
    pub query: String,
}

/// Accepts `Bearer <key>` or the raw key. Open when no key is configured.
pub fn authorize(config: &Config, authorization: Option<&str>) -> Result<(), ApiError> {
    let Some(expected) = config.api_key.as_deref() else {
        return Ok(());
    };
    let presented = authorization.map(|value| value.strip_prefix("Bearer ").unwrap_or(value));
    match presented {
        Some(token) if token == expected => Ok(()),
        _ => Err(ApiError::invalid_api_key()),
    }
}

pub fn resolve(config: &Config, request: &ChatRequest) -> Result<ResolvedQuery, ApiError> {
    let notebook_id = request
        .notebook_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .or(config.default_notebook_id.as_deref())
        .ok_or_else(ApiError::missing_notebook_id)?;

    let query = request
        .last_user_message()
        .ok_or_else(ApiError::no_user_message)?;

    Ok(ResolvedQuery {
        notebook_id: notebook_id.to_string(),
        query: query.to_string(),
    })
}
