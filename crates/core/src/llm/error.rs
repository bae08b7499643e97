use crate::llm::Provider;
use serde_json::Value;
use std::fmt;

const MAX_BODY_CHARS: usize = 300;

/// Non-success reply from a text-generation backend. The raw body is kept for diagnosis.
#[derive(Debug, Clone)]
pub struct GenerationHttpError {
    pub provider: Provider,
    pub status: u16,
    pub body: String,
    pub body_json: Option<Value>,
}

impl GenerationHttpError {
    pub fn new(provider: Provider, status: u16, body: String) -> Self {
        let body_json = serde_json::from_str::<Value>(&body).ok();
        Self {
            provider,
            status,
            body,
            body_json,
        }
    }

    /// `error.message` from a JSON error body.
    pub fn message(&self) -> Option<&str> {
        self.body_json.as_ref()?.pointer("/error/message")?.as_str()
    }

    pub fn is_overloaded(&self) -> bool {
        matches!(self.status, 429 | 503 | 529)
    }
}

impl fmt::Display for GenerationHttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} returned HTTP {}: ", self.provider, self.status)?;
        match self.message() {
            Some(message) => f.write_str(message),
            None => f.write_str(&self.body.chars().take(MAX_BODY_CHARS).collect::<String>()),
        }
    }
}

impl std::error::Error for GenerationHttpError {}
