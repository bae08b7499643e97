use crate::domain::alert::AlertRecord;
use crate::domain::quote::QuoteRecord;
use std::fmt;

pub mod alpha_vantage;
pub mod finnhub;
pub mod http;
pub mod news_api;

/// Outcome of a single provider call. Failures are always absorbed by the services that own the
/// providers; they never reach API consumers as errors.
pub type ProviderResult<T> = Result<T, ProviderFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NetworkError,
    RateLimited,
    MalformedResponse,
    NoProviderConfigured,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::NetworkError => "network error",
            FailureKind::RateLimited => "rate limited",
            FailureKind::MalformedResponse => "malformed response",
            FailureKind::NoProviderConfigured => "no provider configured",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl ProviderFailure {
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn network(reason: impl Into<String>) -> Self {
        Self::new(FailureKind::NetworkError, reason)
    }

    pub fn rate_limited(reason: impl Into<String>) -> Self {
        Self::new(FailureKind::RateLimited, reason)
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::new(FailureKind::MalformedResponse, reason)
    }

    pub fn no_provider() -> Self {
        Self::new(
            FailureKind::NoProviderConfigured,
            "no provider credentials configured",
        )
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.reason)
    }
}

impl std::error::Error for ProviderFailure {}

#[async_trait::async_trait]
pub trait QuoteProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_quote(&self, symbol: &str) -> ProviderResult<QuoteRecord>;
}

#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_alerts(&self, limit: usize) -> ProviderResult<Vec<AlertRecord>>;
}

/// Parses provider numbers that may arrive either as JSON numbers or as strings ("181.20",
/// "0.52%").
pub(crate) fn parse_num(v: &serde_json::Value) -> Option<f64> {
    match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            let t = s.trim().trim_end_matches('%');
            if t.is_empty() {
                return None;
            }
            t.parse::<f64>().ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_numbers_from_strings_and_numbers() {
        assert_eq!(parse_num(&json!(1.5)), Some(1.5));
        assert_eq!(parse_num(&json!("181.20")), Some(181.2));
        assert_eq!(parse_num(&json!("0.52%")), Some(0.52));
        assert_eq!(parse_num(&json!("")), None);
        assert_eq!(parse_num(&json!(null)), None);
    }

    #[test]
    fn failure_display_includes_kind_and_reason() {
        let f = ProviderFailure::rate_limited("Note: 5 calls per minute");
        assert_eq!(f.to_string(), "rate limited: Note: 5 calls per minute");
    }
}
