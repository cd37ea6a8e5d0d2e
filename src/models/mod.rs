use serde::{Deserialize, Serialize};

pub mod chat_request;
pub mod chat_response;
pub mod model_list;

pub use chat_request::ChatRequest;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Message {
            role,
            content: content.into(),
        }
    }
}

/// The four error classes an OpenAI-compatible client knows how to handle.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequestError,
    AuthenticationError,
    ServerError,
    ApiError,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub code: String,
}

/// Word counts standing in for token counts; the backend reports none.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Usage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Choice {
    pub index: u64,
    pub message: Message,
    pub finish_reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_total_is_sum() {
        let usage = Usage::new(3, 11);
        assert_eq!(usage.total_tokens, 14);
    }

    #[test]
    fn test_error_detail_serializes_type_field() {
        let response = ErrorResponse {
            error: ErrorDetail {
                message: "nope".to_string(),
                kind: ErrorKind::InvalidRequestError,
                code: "no_user_message".to_string(),
            },
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"]["type"], "invalid_request_error");
        assert_eq!(value["error"]["code"], "no_user_message");
        assert_eq!(value["error"]["message"], "nope");
    }

    #[test]
    fn test_role_rejects_unknown_values() {
        let parsed: Result<Message, _> =
            serde_json::from_str(r#"{"role":"tool","content":"x"}"#);
        assert!(parsed.is_err());
    }
}
