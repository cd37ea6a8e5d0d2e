use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::resolver::{self, ResolvedQuery};
use super::stream::{self, answer_events, failure_events};
use super::AppState;
use crate::clients::notebooklm::{ask_once, Backend};
use crate::errors::ApiError;
use crate::models::chat_response::{ChatResponse, CompletionMeta};
use crate::models::ChatRequest;
use crate::utils::{estimate_usage, preview};

/// Frames buffered between the producer task and the response body.
const STREAM_BUFFER: usize = 32;

/// How a chat completion request is answered.
pub enum Completion {
    Full(ChatResponse),
    Stream(mpsc::Receiver<Bytes>),
}

pub async fn handle_chat_completions<B: Backend>(
    state: Arc<AppState<B>>,
    authorization: Option<&str>,
    whole_body: Bytes,
) -> Result<Completion, ApiError> {
    resolver::authorize(&state.config, authorization)?;
    let chat_request = ChatRequest::from_json(&whole_body).map_err(ApiError::invalid_body)?;
    let resolved = resolver::resolve(&state.config, &chat_request)?;
    info!(
        "Processing query for notebook {}: {}...",
        resolved.notebook_id,
        preview(&resolved.query, 100)
    );

    if chat_request.stream {
        Ok(Completion::Stream(spawn_stream(
            state,
            resolved,
            chat_request.model,
        )))
    } else {
        complete(&state, &resolved, chat_request.model)
            .await
            .map(Completion::Full)
    }
}

async fn ask_and_process<B: Backend>(
    state: &AppState<B>,
    resolved: &ResolvedQuery,
) -> Result<String, crate::clients::notebooklm::BackendError> {
    let answer = ask_once(&state.backend, &resolved.notebook_id, &resolved.query).await?;
    Ok(state.config.markdown_mode.process(&answer))
}

pub async fn complete<B: Backend>(
    state: &AppState<B>,
    resolved: &ResolvedQuery,
    model: String,
) -> Result<ChatResponse, ApiError> {
    let content = ask_and_process(state, resolved).await.map_err(|e| {
        error!("Error processing query: {:?}", e);
        ApiError::processing_failed(&e)
    })?;

    let usage = estimate_usage(&resolved.query, &content);
    let response = ChatResponse::assistant(CompletionMeta::new(model), content, usage);
    info!(
        "Successfully processed query for notebook {}",
        resolved.notebook_id
    );
    Ok(response)
}

/// Runs the backend call on its own task and returns the receiving end of
/// the event frames. Dropping the receiver stops the producer at its next send.
pub fn spawn_stream<B: Backend>(
    state: Arc<AppState<B>>,
    resolved: ResolvedQuery,
    model: String,
) -> mpsc::Receiver<Bytes> {
    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
    let meta = CompletionMeta::new(model);

    tokio::spawn(async move {
        let outcome = match ask_and_process(&state, &resolved).await {
            Ok(content) => {
                let sent =
                    stream::emit(&tx, &meta, answer_events(&content), state.config.stream_delay)
                        .await;
                if sent.is_ok() {
                    info!(
                        "Successfully streamed response for notebook {}",
                        resolved.notebook_id
                    );
                }
                sent
            }
            Err(e) => {
                error!("Error streaming response: {:?}", e);
                let err = ApiError::streaming_failed(&e);
                stream::emit(&tx, &meta, failure_events(err), state.config.stream_delay).await
            }
        };
        if let Err(e) = outcome {
            debug!("Stream {} abandoned: {}", meta.id, e);
        }
    });

    rx
}
