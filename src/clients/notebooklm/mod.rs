use std::future::Future;

use thiserror::Error;
use tracing::debug;

pub mod auth;
pub mod client;
#[cfg(test)]
pub mod stub;

pub use client::NotebookLmBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("request to NotebookLM failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("NotebookLM returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response from NotebookLM: {0}")]
    Decode(String),
    #[error("cannot build a NotebookLM URL from {0}")]
    Url(String),
}

/// Hands out authenticated sessions against the question-answering service.
pub trait Backend: Send + Sync + 'static {
    type Session: BackendSession;

    fn open(&self) -> impl Future<Output = Result<Self::Session, BackendError>> + Send;
}

/// One authenticated session. Closed by whoever opened it.
pub trait BackendSession: Send {
    fn ask(
        &mut self,
        notebook_id: &str,
        query: &str,
    ) -> impl Future<Output = Result<String, BackendError>> + Send;

    fn close(self) -> impl Future<Output = ()> + Send;
}

/// Opens a session, asks exactly once and closes the session whatever the
/// outcome of the question.
pub async fn ask_once<B: Backend>(
    backend: &B,
    notebook_id: &str,
    query: &str,
) -> Result<String, BackendError> {
    let mut session = backend.open().await?;
    let answer = session.ask(notebook_id, query).await;
    session.close().await;
    debug!("Backend session closed for notebook {}", notebook_id);
    answer
}

#[cfg(test)]
mod tests {
    use super::stub::StubBackend;
    use super::*;

    #[tokio::test]
    async fn test_ask_once_returns_answer_and_closes() {
        let backend = StubBackend::answering("Hello there");
        let answer = ask_once(&backend, "nb1", "Hi").await.unwrap();
        assert_eq!(answer, "Hello there");
        assert_eq!(backend.opened(), 1);
        assert_eq!(backend.closed(), 1);
        assert_eq!(
            backend.questions(),
            vec![("nb1".to_string(), "Hi".to_string())]
        );
    }

    #[tokio::test]
    async fn test_ask_once_closes_after_failed_ask() {
        let backend = StubBackend::failing("notebook exploded");
        let err = ask_once(&backend, "nb1", "Hi").await.unwrap_err();
        assert!(err.to_string().contains("notebook exploded"));
        assert_eq!(backend.opened(), 1);
        assert_eq!(backend.closed(), 1);
    }

    #[tokio::test]
    async fn test_ask_once_does_not_ask_when_open_fails() {
        let backend = StubBackend::unauthenticated("cookies expired");
        let err = ask_once(&backend, "nb1", "Hi").await.unwrap_err();
        assert_eq!(err.to_string(), "Authentication failed: cookies expired");
        assert!(backend.questions().is_empty());
        assert_eq!(backend.closed(), 0);
    }
}
