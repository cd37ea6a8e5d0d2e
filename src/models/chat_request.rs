use serde::{Deserialize, Serialize};

use super::{Message, Role};

fn default_model() -> String {
    "notebooklm".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatRequest {
    /// Echoed back in responses; never used for routing.
    #[serde(default = "default_model")]
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub stream: bool,
    // Accepted for client compatibility, ignored by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebook_id: Option<String>,
}

impl ChatRequest {
    #[allow(dead_code)]
    pub fn new(model: String, messages: Vec<Message>) -> Self {
        ChatRequest {
            model,
            messages,
            stream: false,
            temperature: None,
            max_tokens: None,
            notebook_id: None,
        }
    }

    pub fn from_json(json: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(json)
    }

    /// Content of the most recent user message, if any.
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}
