use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{self, HeaderValue};
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use crate::clients::notebooklm::Backend;
use crate::config::Config;
use crate::errors::ApiError;
use crate::models::model_list::ModelList;

pub mod completions;
pub mod resolver;
pub mod stream;

use completions::Completion;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, Infallible>;

/// Everything a request handler needs; shared read-only across connections.
pub struct AppState<B> {
    pub config: Config,
    pub backend: B,
}

pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<BoxBody> {
    let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
    let mut response = Response::new(Full::new(Bytes::from(body)).boxed());
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

pub fn error_response(err: &ApiError) -> Response<BoxBody> {
    json_response(err.status(), &err.to_envelope())
}

pub fn sse_response(rx: mpsc::Receiver<Bytes>) -> Response<BoxBody> {
    let frames = ReceiverStream::new(rx).map(|chunk| Ok::<_, Infallible>(Frame::data(chunk)));
    let mut response = Response::new(StreamBody::new(frames).boxed());
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    response
}

fn authorization_header(req: &Request<Incoming>) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn handle<B: Backend>(
    state: Arc<AppState<B>>,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, Infallible> {
    info!("Received request: {} {}", req.method(), req.uri().path());

    match route(state, req).await {
        Ok(response) => Ok(response),
        Err(err) => {
            warn!("Request failed with {}: {}", err.status(), err);
            Ok(error_response(&err))
        }
    }
}

async fn route<B: Backend>(
    state: Arc<AppState<B>>,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, ApiError> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::GET, "/health") => Ok(json_response(
            StatusCode::OK,
            &serde_json::json!({ "status": "healthy" }),
        )),

        (Method::GET, "/v1/models") => {
            resolver::authorize(&state.config, authorization_header(&req).as_deref())?;
            Ok(json_response(StatusCode::OK, &ModelList::notebooklm()))
        }

        (Method::POST, "/v1/chat/completions") => {
            let authorization = authorization_header(&req);
            let whole_body = req
                .into_body()
                .collect()
                .await
                .map_err(ApiError::invalid_body)?
                .to_bytes();
            let completion =
                completions::handle_chat_completions(state, authorization.as_deref(), whole_body)
                    .await?;
            Ok(match completion {
                Completion::Full(response) => json_response(StatusCode::OK, &response),
                Completion::Stream(rx) => sse_response(rx),
            })
        }

        _ => Err(ApiError::not_found()),
    }
}
