use serde::{Deserialize, Serialize};

pub const MODEL_ID: &str = "notebooklm";

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelCard {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub owned_by: String,
    pub permission: Vec<serde_json::Value>,
    pub root: String,
    pub parent: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelCard>,
}

impl ModelList {
    /// The single static model this server exposes.
    pub fn notebooklm() -> Self {
        ModelList {
            object: "list".to_string(),
            data: vec![ModelCard {
                id: MODEL_ID.to_string(),
                object: "model".to_string(),
                created: chrono::Utc::now().timestamp(),
                owned_by: MODEL_ID.to_string(),
                permission: Vec::new(),
                root: MODEL_ID.to_string(),
                parent: None,
            }],
        }
    }
}
