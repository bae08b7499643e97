use crate::config::Settings;
use crate::domain::alert::{AlertKind, AlertRecord};
use crate::domain::quote::{round2, QuoteRecord};
use crate::provider::http::ProviderHttp;
use crate::provider::{parse_num, NewsProvider, ProviderFailure, ProviderResult, QuoteProvider};
use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
const SOURCE: &str = "Alpha Vantage";

#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    http: ProviderHttp,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        let Some(api_key) = settings.alpha_vantage_api_key.clone() else {
            return Ok(None);
        };
        let base_url = std::env::var("ALPHA_VANTAGE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Some(Self {
            http: ProviderHttp::new(settings.provider_timeout)?,
            base_url,
            api_key,
        }))
    }
}

#[async_trait::async_trait]
impl QuoteProvider for AlphaVantageClient {
    fn provider_name(&self) -> &'static str {
        "alpha_vantage"
    }

    async fn fetch_quote(&self, symbol: &str) -> ProviderResult<QuoteRecord> {
        let body = self
            .http
            .get_json(
                &self.base_url,
                &[
                    ("function", "GLOBAL_QUOTE"),
                    ("symbol", symbol),
                    ("apikey", self.api_key.as_str()),
                ],
            )
            .await?;
        parse_global_quote(symbol, &body)
    }
}

#[async_trait::async_trait]
impl NewsProvider for AlphaVantageClient {
    fn provider_name(&self) -> &'static str {
        "alpha_vantage"
    }

    async fn fetch_alerts(&self, limit: usize) -> ProviderResult<Vec<AlertRecord>> {
        let limit_param = limit.to_string();
        let body = self
            .http
            .get_json(
                &self.base_url,
                &[
                    ("function", "NEWS_SENTIMENT"),
                    ("topics", "financial_markets"),
                    ("sort", "LATEST"),
                    ("limit", limit_param.as_str()),
                    ("apikey", self.api_key.as_str()),
                ],
            )
            .await?;
        parse_news_sentiment(&body, limit)
    }
}

/// Alpha Vantage reports throttling and errors with HTTP 200 and a marker key in the body.
fn check_markers(body: &Value) -> ProviderResult<()> {
    for key in ["Note", "Information"] {
        if let Some(note) = body.get(key).and_then(Value::as_str) {
            return Err(ProviderFailure::rate_limited(note.to_string()));
        }
    }
    if let Some(err) = body.get("Error Message").and_then(Value::as_str) {
        return Err(ProviderFailure::malformed(format!(
            "alpha vantage error: {err}"
        )));
    }
    Ok(())
}

fn parse_global_quote(symbol: &str, body: &Value) -> ProviderResult<QuoteRecord> {
    check_markers(body)?;

    let quote = body
        .get("Global Quote")
        .and_then(Value::as_object)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ProviderFailure::malformed(format!("no quote data for {symbol}")))?;

    let field = |key: &str| quote.get(key).and_then(parse_num);
    let price = field("05. price")
        .filter(|p| *p > 0.0)
        .ok_or_else(|| ProviderFailure::malformed("quote has no price"))?;
    let previous_close = field("08. previous close").unwrap_or(price);
    let change = field("09. change").unwrap_or(price - previous_close);

    Ok(QuoteRecord {
        symbol: symbol.to_string(),
        price: round2(price),
        change: round2(change),
        change_percent: round2(field("10. change percent").unwrap_or(0.0)),
        volume: field("06. volume").map(|v| v.max(0.0) as u64).unwrap_or(0),
        high: round2(field("03. high").unwrap_or(price)),
        low: round2(field("04. low").unwrap_or(price)),
        open: round2(field("02. open").unwrap_or(previous_close)),
        previous_close: round2(previous_close),
        timestamp: Utc::now(),
        is_live: true,
        source: SOURCE.to_string(),
    })
}

#[derive(Debug, Clone, Deserialize)]
struct NewsSentimentResponse {
    #[serde(default)]
    feed: Vec<NewsSentimentItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct NewsSentimentItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    time_published: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    overall_sentiment_score: Option<f64>,
}

fn parse_news_sentiment(body: &Value, limit: usize) -> ProviderResult<Vec<AlertRecord>> {
    check_markers(body)?;

    let parsed = serde_json::from_value::<NewsSentimentResponse>(body.clone())
        .map_err(|e| ProviderFailure::malformed(format!("unexpected news payload: {e}")))?;

    let alerts = parsed
        .feed
        .into_iter()
        .filter(|item| !item.title.trim().is_empty())
        .take(limit)
        .map(|item| {
            let timestamp = parse_time_published(&item.time_published).unwrap_or_else(Utc::now);
            AlertRecord {
                id: if item.url.is_empty() {
                    format!("av-{}", timestamp.timestamp())
                } else {
                    item.url.clone()
                },
                kind: AlertKind::classify(item.overall_sentiment_score, &item.title),
                title: item.title.trim().to_string(),
                timestamp,
                source: if item.source.trim().is_empty() {
                    SOURCE.to_string()
                } else {
                    item.source.trim().to_string()
                },
                is_live: true,
            }
        })
        .collect();
    Ok(alerts)
}

// Observed format: "20260302T143000" (UTC).
fn parse_time_published(s: &str) -> Option<chrono::DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), "%Y%m%dT%H%M%S").ok()?;
    Some(naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::FailureKind;
    use serde_json::json;

    #[test]
    fn maps_global_quote() {
        let body = json!({
            "Global Quote": {
                "01. symbol": "MSFT",
                "02. open": "380.10",
                "03. high": "384.00",
                "04. low": "378.55",
                "05. price": "383.2500",
                "06. volume": "21450000",
                "07. latest trading day": "2026-03-02",
                "08. previous close": "379.90",
                "09. change": "3.3500",
                "10. change percent": "0.8818%"
            }
        });
        let q = parse_global_quote("MSFT", &body).unwrap();
        assert_eq!(q.price, 383.25);
        assert_eq!(q.volume, 21_450_000);
        assert_eq!(q.change_percent, 0.88);
        assert_eq!(q.source, "Alpha Vantage");
    }

    #[test]
    fn classifies_body_markers() {
        let cases = [
            (
                json!({"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}),
                FailureKind::RateLimited,
            ),
            (
                json!({"Information": "We have detected your API key and our standard API rate limit is 25 requests per day."}),
                FailureKind::RateLimited,
            ),
            (
                json!({"Error Message": "Invalid API call."}),
                FailureKind::MalformedResponse,
            ),
            (json!({"Global Quote": {}}), FailureKind::MalformedResponse),
        ];
        for (body, kind) in cases {
            assert_eq!(parse_global_quote("AAPL", &body).unwrap_err().kind, kind);
        }
    }

    #[test]
    fn uses_sentiment_score_for_news() {
        let body = json!({
            "items": "2",
            "feed": [
                {
                    "title": "Markets surge on rate cut hopes",
                    "url": "https://example.com/a",
                    "time_published": "20260302T143000",
                    "source": "Benzinga",
                    "overall_sentiment_score": -0.31
                },
                {
                    "title": "Treasury yields steady",
                    "url": "https://example.com/b",
                    "time_published": "20260302T120000",
                    "source": "",
                    "overall_sentiment_score": 0.05
                }
            ]
        });
        let alerts = parse_news_sentiment(&body, 5).unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].kind, AlertKind::Bearish);
        assert_eq!(alerts[1].kind, AlertKind::Neutral);
        assert_eq!(alerts[1].source, "Alpha Vantage");
        assert_eq!(
            alerts[0].timestamp.to_rfc3339(),
            "2026-03-02T14:30:00+00:00"
        );
    }

    #[test]
    fn news_feed_missing_is_empty_success() {
        assert!(parse_news_sentiment(&json!({}), 5).unwrap().is_empty());
    }
}
