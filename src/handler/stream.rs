use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::error;

use crate::errors::ApiError;
use crate::models::chat_response::{ChatChunk, CompletionMeta};
use crate::utils::chunking::chunk_answer;

const DONE: &[u8] = b"data: [DONE]\n\n";

/// One server-sent event of a streamed completion.
#[derive(Debug)]
pub enum StreamEvent {
    Delta(String),
    /// Empty delta carrying `finish_reason: "stop"`.
    Finish,
    Error(ApiError),
    /// The `[DONE]` sentinel. Only ever follows `Finish`.
    Done,
}

fn sse_data<T: Serialize>(value: &T) -> Bytes {
    let json = serde_json::to_string(value).unwrap_or_else(|e| {
        error!("Failed to serialize stream event: {}", e);
        "{}".to_string()
    });
    Bytes::from(format!("data: {}\n\n", json))
}

impl StreamEvent {
    pub fn to_sse(&self, meta: &CompletionMeta) -> Bytes {
        match self {
            StreamEvent::Delta(content) => sse_data(&ChatChunk::delta(meta, content)),
            StreamEvent::Finish => sse_data(&ChatChunk::finish(meta)),
            StreamEvent::Error(err) => sse_data(&err.to_envelope()),
            StreamEvent::Done => Bytes::from_static(DONE),
        }
    }
}

/// Events for a finished answer: one delta per fragment, the finish marker,
/// then `[DONE]`.
pub fn answer_events(answer: &str) -> impl Iterator<Item = StreamEvent> + Send {
    chunk_answer(answer)
        .into_iter()
        .map(StreamEvent::Delta)
        .chain([StreamEvent::Finish, StreamEvent::Done])
}

/// Events for a request that failed before anything was emitted. No `[DONE]`.
pub fn failure_events(err: ApiError) -> impl Iterator<Item = StreamEvent> + Send {
    std::iter::once(StreamEvent::Error(err))
}

#[derive(Debug, Error)]
#[error("client disconnected mid-stream")]
pub struct Disconnected;

/// Sends `events` in order, pausing `delay` after every delta.
pub async fn emit(
    tx: &mpsc::Sender<Bytes>,
    meta: &CompletionMeta,
    events: impl Iterator<Item = StreamEvent> + Send,
    delay: Duration,
) -> Result<(), Disconnected> {
    for event in events {
        let paced = matches!(event, StreamEvent::Delta(_));
        tx.send(event.to_sse(meta)).await.map_err(|_| Disconnected)?;
        if paced && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    Ok(())
}
