use crate::config::Settings;
use crate::domain::alert::{AlertKind, AlertRecord};
use crate::provider::http::ProviderHttp;
use crate::provider::{NewsProvider, ProviderFailure, ProviderResult};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";
const SOURCE: &str = "NewsAPI";

#[derive(Debug, Clone)]
pub struct NewsApiClient {
    http: ProviderHttp,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        let Some(api_key) = settings.news_api_key.clone() else {
            return Ok(None);
        };
        let base_url =
            std::env::var("NEWS_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Some(Self {
            http: ProviderHttp::new(settings.provider_timeout)?,
            base_url,
            api_key,
        }))
    }
}

#[async_trait::async_trait]
impl NewsProvider for NewsApiClient {
    fn provider_name(&self) -> &'static str {
        "news_api"
    }

    async fn fetch_alerts(&self, limit: usize) -> ProviderResult<Vec<AlertRecord>> {
        let page_size = limit.to_string();
        let url = format!("{}/top-headlines", self.base_url.trim_end_matches('/'));
        let body = self
            .http
            .get_json(
                &url,
                &[
                    ("category", "business"),
                    ("country", "us"),
                    ("pageSize", page_size.as_str()),
                    ("apiKey", self.api_key.as_str()),
                ],
            )
            .await?;
        parse_headlines(&body, limit)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct HeadlinesResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Clone, Deserialize)]
struct Article {
    #[serde(default)]
    source: ArticleSource,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(rename = "publishedAt", default)]
    published_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ArticleSource {
    #[serde(default)]
    name: Option<String>,
}

fn parse_headlines(body: &Value, limit: usize) -> ProviderResult<Vec<AlertRecord>> {
    if body.get("status").and_then(Value::as_str) == Some("error") {
        let code = body.get("code").and_then(Value::as_str).unwrap_or("unknown");
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if code == "rateLimited" {
            return Err(ProviderFailure::rate_limited(message.to_string()));
        }
        return Err(ProviderFailure::malformed(format!(
            "newsapi error {code}: {message}"
        )));
    }

    let parsed = serde_json::from_value::<HeadlinesResponse>(body.clone())
        .map_err(|e| ProviderFailure::malformed(format!("unexpected headlines payload: {e}")))?;

    let alerts = parsed
        .articles
        .into_iter()
        .filter(|a| !a.title.trim().is_empty() && a.title != "[Removed]")
        .take(limit)
        .enumerate()
        .map(|(idx, a)| {
            let timestamp = DateTime::parse_from_rfc3339(a.published_at.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());
            AlertRecord {
                id: if a.url.is_empty() {
                    format!("newsapi-{}-{idx}", timestamp.timestamp())
                } else {
                    a.url.clone()
                },
                kind: AlertKind::classify(None, &a.title),
                title: a.title.trim().to_string(),
                timestamp,
                source: a
                    .source
                    .name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| SOURCE.to_string()),
                is_live: true,
            }
        })
        .collect();
    Ok(alerts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::FailureKind;
    use serde_json::json;

    #[test]
    fn maps_headlines() {
        let body = json!({
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {
                    "source": {"id": null, "name": "CNBC"},
                    "title": "Retail stocks decline after weak sales data",
                    "url": "https://example.com/retail",
                    "publishedAt": "2026-03-02T13:05:00Z"
                },
                {
                    "source": {"id": null, "name": null},
                    "title": "[Removed]",
                    "url": "",
                    "publishedAt": "2026-03-02T12:00:00Z"
                }
            ]
        });
        let alerts = parse_headlines(&body, 5).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Bearish);
        assert_eq!(alerts[0].source, "CNBC");
        assert!(alerts[0].is_live);
    }

    #[test]
    fn classifies_error_status() {
        let limited = json!({"status": "error", "code": "rateLimited", "message": "Too many requests"});
        assert_eq!(
            parse_headlines(&limited, 5).unwrap_err().kind,
            FailureKind::RateLimited
        );

        let bad_key = json!({"status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid"});
        assert_eq!(
            parse_headlines(&bad_key, 5).unwrap_err().kind,
            FailureKind::MalformedResponse
        );
    }
}
