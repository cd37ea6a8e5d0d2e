use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{Backend, BackendError, BackendSession};

#[derive(Clone)]
enum Behaviour {
    Answer(String),
    FailAsk(String),
    FailOpen(String),
}

/// In-process backend that records how it was used.
#[derive(Clone)]
pub struct StubBackend {
    behaviour: Behaviour,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    questions: Arc<Mutex<Vec<(String, String)>>>,
}

impl StubBackend {
    fn with(behaviour: Behaviour) -> Self {
        StubBackend {
            behaviour,
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
            questions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn answering(answer: &str) -> Self {
        Self::with(Behaviour::Answer(answer.to_string()))
    }

    pub fn failing(message: &str) -> Self {
        Self::with(Behaviour::FailAsk(message.to_string()))
    }

    pub fn unauthenticated(message: &str) -> Self {
        Self::with(Behaviour::FailOpen(message.to_string()))
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn questions(&self) -> Vec<(String, String)> {
        self.questions.lock().unwrap().clone()
    }
}

pub struct StubSession {
    backend: StubBackend,
}

impl Backend for StubBackend {
    type Session = StubSession;

    async fn open(&self) -> Result<StubSession, BackendError> {
        if let Behaviour::FailOpen(message) = &self.behaviour {
            return Err(BackendError::Auth(message.clone()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(StubSession {
            backend: self.clone(),
        })
    }
}

impl BackendSession for StubSession {
    async fn ask(&mut self, notebook_id: &str, query: &str) -> Result<String, BackendError> {
        self.backend
            .questions
            .lock()
            .unwrap()
            .push((notebook_id.to_string(), query.to_string()));
        match &self.backend.behaviour {
            Behaviour::Answer(answer) => Ok(answer.clone()),
            Behaviour::FailAsk(message) => Err(BackendError::Decode(message.clone())),
            Behaviour::FailOpen(message) => Err(BackendError::Auth(message.clone())),
        }
    }

    async fn close(self) {
        self.backend.closed.fetch_add(1, Ordering::SeqCst);
    }
}
