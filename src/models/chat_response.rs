use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Choice, Message, Role, Usage};

/// Identity shared by every object produced for one completion.
#[derive(Debug, Clone)]
pub struct CompletionMeta {
    pub id: String,
    pub created: i64,
    pub model: String,
}

impl CompletionMeta {
    pub fn new(model: String) -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        CompletionMeta {
            id: format!("chatcmpl-{}", &uuid[..8]),
            created: chrono::Utc::now().timestamp(),
            model,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

impl ChatResponse {
    pub fn assistant(meta: CompletionMeta, content: String, usage: Usage) -> Self {
        ChatResponse {
            id: meta.id,
            object: "chat.completion".to_string(),
            created: meta.created,
            model: meta.model,
            choices: vec![Choice {
                index: 0,
                message: Message::new(Role::Assistant, content),
                finish_reason: "stop".to_string(),
            }],
            usage,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Delta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub index: u64,
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

impl ChatChunk {
    fn with_choice(meta: &CompletionMeta, choice: ChunkChoice) -> Self {
        ChatChunk {
            id: meta.id.clone(),
            object: "chat.completion.chunk".to_string(),
            created: meta.created,
            model: meta.model.clone(),
            choices: vec![choice],
        }
    }

    pub fn delta(meta: &CompletionMeta, content: &str) -> Self {
        Self::with_choice(
            meta,
            ChunkChoice {
                index: 0,
                delta: Delta {
                    content: Some(content.to_string()),
                },
                finish_reason: None,
            },
        )
    }

    pub fn finish(meta: &CompletionMeta) -> Self {
        Self::with_choice(
            meta,
            ChunkChoice {
                index: 0,
                delta: Delta::default(),
                finish_reason: Some("stop".to_string()),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> CompletionMeta {
        CompletionMeta {
            id: "chatcmpl-abcd1234".to_string(),
            created: 1_700_000_000,
            model: "notebooklm".to_string(),
        }
    }

    #[test]
    fn test_completion_id_shape() {
        let meta = CompletionMeta::new("notebooklm".to_string());
        assert!(meta.id.starts_with("chatcmpl-"));
        assert_eq!(meta.id.len(), "chatcmpl-".len() + 8);
        assert!(meta.id["chatcmpl-".len()..]
            .chars()
            .all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_assistant_response_shape() {
        let response = ChatResponse::assistant(meta(), "Hello there".to_string(), Usage::new(1, 2));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["object"], "chat.completion");
        assert_eq!(value["choices"][0]["index"], 0);
        assert_eq!(value["choices"][0]["message"]["role"], "assistant");
        assert_eq!(value["choices"][0]["message"]["content"], "Hello there");
        assert_eq!(value["choices"][0]["finish_reason"], "stop");
        assert_eq!(value["usage"]["total_tokens"], 3);
    }

    #[test]
    fn test_delta_chunk_has_null_finish_reason() {
        let value = serde_json::to_value(ChatChunk::delta(&meta(), " world")).unwrap();
        assert_eq!(value["object"], "chat.completion.chunk");
        assert_eq!(value["choices"][0]["delta"]["content"], " world");
        assert!(value["choices"][0]["finish_reason"].is_null());
    }

    #[test]
    fn test_finish_chunk_has_empty_delta() {
        let value = serde_json::to_value(ChatChunk::finish(&meta())).unwrap();
        assert_eq!(value["choices"][0]["delta"], serde_json::json!({}));
        assert_eq!(value["choices"][0]["finish_reason"], "stop");
    }
}
