use crate::provider::{ProviderFailure, ProviderResult};
use anyhow::Context;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

const MAX_BODY_IN_REASON: usize = 200;

/// Thin GET-and-decode wrapper shared by every provider. It only classifies transport-level
/// outcomes; provider-specific markers inside a decoded body are left to each provider.
#[derive(Debug, Clone)]
pub struct ProviderHttp {
    http: reqwest::Client,
}

impl ProviderHttp {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build provider http client")?;
        Ok(Self { http })
    }

    pub async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> ProviderResult<Value> {
        // API keys travel in the query string; keep the URL out of every reason string.
        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderFailure::network(format!("request failed: {}", e.without_url())))?;

        let status = res.status();
        let text = res.text().await.map_err(|e| {
            ProviderFailure::network(format!("failed to read body: {}", e.without_url()))
        })?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderFailure::rate_limited(format!(
                "HTTP {status}: {}",
                clip(&text)
            )));
        }
        if !status.is_success() {
            return Err(ProviderFailure::network(format!(
                "HTTP {status}: {}",
                clip(&text)
            )));
        }

        serde_json::from_str::<Value>(&text)
            .map_err(|e| ProviderFailure::malformed(format!("response is not valid JSON: {e}")))
    }
}

fn clip(s: &str) -> &str {
    match s.char_indices().nth(MAX_BODY_IN_REASON) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
