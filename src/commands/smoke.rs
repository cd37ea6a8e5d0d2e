use std::time::Duration;

use anyhow::Error;
use reqwest::header;
use serde_json::json;

use crate::args::SmokeSubCommand;
use crate::models::chat_response::ChatResponse;
use crate::utils::preview;

/// Delta contents of an SSE completion body, up to `[DONE]`.
pub fn collect_stream_content(body: &str) -> Result<Vec<String>, Error> {
    let mut chunks = Vec::new();
    for line in body.lines() {
        let Some(data) = line.strip_prefix("data: ") else {
            continue;
        };
        if data == "[DONE]" {
            return Ok(chunks);
        }
        let Ok(event) = serde_json::from_str::<serde_json::Value>(data) else {
            continue;
        };
        if let Some(message) = event["error"]["message"].as_str() {
            return Err(Error::msg(format!("stream reported an error: {}", message)));
        }
        if let Some(content) = event["choices"][0]["delta"]["content"].as_str() {
            chunks.push(content.to_string());
        }
    }
    Err(Error::msg("stream ended without [DONE]"))
}

struct Smoke {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    notebook_id: Option<String>,
}

impl Smoke {
    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(format!("{}{}", self.base_url, path)))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.post(format!("{}{}", self.base_url, path)))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header(header::AUTHORIZATION, format!("Bearer {}", key)),
            None => builder,
        }
    }

    fn chat_body(&self, content: &str, stream: bool) -> serde_json::Value {
        let mut body = json!({
            "model": "notebooklm",
            "messages": [{ "role": "user", "content": content }],
            "stream": stream,
        });
        if let Some(id) = &self.notebook_id {
            body["notebook_id"] = json!(id);
        }
        body
    }

    async fn expect_success(response: reqwest::Response) -> Result<String, Error> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::msg(format!("HTTP {}: {}", status, text)));
        }
        Ok(text)
    }

    async fn health(&self) -> Result<String, Error> {
        let text = Self::expect_success(self.client.get(format!("{}/health", self.base_url)).send().await?).await?;
        Ok(text)
    }

    async fn models(&self) -> Result<String, Error> {
        let text = Self::expect_success(self.get("/v1/models").send().await?).await?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        let ids: Vec<&str> = value["data"]
            .as_array()
            .map(|models| models.iter().filter_map(|m| m["id"].as_str()).collect())
            .unwrap_or_default();
        Ok(format!("models: {}", ids.join(", ")))
    }

    async fn chat(&self) -> Result<String, Error> {
        let response = self
            .post("/v1/chat/completions")
            .json(&self.chat_body("Hello, this is a test message.", false))
            .send()
            .await?;
        let text = Self::expect_success(response).await?;
        let completion = ChatResponse::from_json(&text)?;
        let content = completion
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| Error::msg(format!("response has no choices: {}", text)))?;
        Ok(format!("answer: {}...", preview(content, 200)))
    }

    async fn streaming(&self) -> Result<String, Error> {
        let response = self
            .post("/v1/chat/completions")
            .json(&self.chat_body("Hello, this is a streaming test.", true))
            .send()
            .await?;
        let body = Self::expect_success(response).await?;
        let chunks = collect_stream_content(&body)?;
        if chunks.is_empty() {
            return Err(Error::msg("no streamed content received"));
        }
        Ok(format!(
            "{} chunks, preview: {}...",
            chunks.len(),
            preview(&chunks.concat(), 200)
        ))
    }
}

fn report(name: &str, result: Result<String, Error>) -> bool {
    match result {
        Ok(detail) => {
            println!("PASS  {:<12} {}", name, detail);
            true
        }
        Err(e) => {
            println!("FAIL  {:<12} {}", name, e);
            false
        }
    }
}

/// Exercises a running server. Returns whether every check passed.
pub async fn run(cmd: &SmokeSubCommand) -> Result<bool, Error> {
    let base_url = format!("http://{}:{}", cmd.host, cmd.port);
    let smoke = Smoke {
        client: reqwest::Client::builder()
            .timeout(Duration::from_secs(cmd.timeout_secs))
            .build()?,
        base_url: base_url.clone(),
        api_key: cmd.api_key.clone(),
        notebook_id: cmd.notebook_id.clone(),
    };

    println!("Smoke testing {}", base_url);
    let mut results = vec![
        report("health", smoke.health().await),
        report("models", smoke.models().await),
    ];
    if cmd.skip_chat {
        println!("SKIP  chat checks");
    } else {
        if cmd.notebook_id.is_none() {
            println!("note: no --notebook-id given, chat checks rely on the server default");
        }
        results.push(report("chat", smoke.chat().await));
        results.push(report("streaming", smoke.streaming().await));
    }

    let passed = results.iter().filter(|ok| **ok).count();
    println!("{}/{} checks passed", passed, results.len());
    Ok(passed == results.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_stream_content() {
        let body = concat!(
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hello\"},\"finish_reason\":null}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\" world\"},\"finish_reason\":null}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        );
        assert_eq!(collect_stream_content(body).unwrap(), vec!["Hello", " world"]);
    }

    #[test]
    fn test_collect_stream_content_surfaces_errors() {
        let body = "data: {\"error\":{\"message\":\"boom\",\"type\":\"server_error\",\"code\":\"streaming_failed\"}}\n\n";
        let err = collect_stream_content(body).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_collect_stream_content_requires_done() {
        let body = "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"},\"finish_reason\":null}]}\n\n";
        assert!(collect_stream_content(body).is_err());
    }
}
