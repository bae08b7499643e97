use crate::config::Settings;
use crate::domain::alert::{AlertKind, AlertRecord};
use crate::domain::quote::{round2, QuoteRecord};
use crate::provider::http::ProviderHttp;
use crate::provider::{parse_num, NewsProvider, ProviderFailure, ProviderResult, QuoteProvider};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";
const SOURCE: &str = "Finnhub";

#[derive(Debug, Clone)]
pub struct FinnhubClient {
    http: ProviderHttp,
    base_url: String,
    api_key: String,
}

impl FinnhubClient {
    /// `None` when FINNHUB_API_KEY is absent: the provider is simply left out of the chain.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        let Some(api_key) = settings.finnhub_api_key.clone() else {
            return Ok(None);
        };
        let base_url =
            std::env::var("FINNHUB_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Some(Self {
            http: ProviderHttp::new(settings.provider_timeout)?,
            base_url,
            api_key,
        }))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait::async_trait]
impl QuoteProvider for FinnhubClient {
    fn provider_name(&self) -> &'static str {
        "finnhub"
    }

    async fn fetch_quote(&self, symbol: &str) -> ProviderResult<QuoteRecord> {
        let body = self
            .http
            .get_json(
                &self.url("quote"),
                &[("symbol", symbol), ("token", self.api_key.as_str())],
            )
            .await?;
        parse_quote(symbol, &body)
    }
}

#[async_trait::async_trait]
impl NewsProvider for FinnhubClient {
    fn provider_name(&self) -> &'static str {
        "finnhub"
    }

    async fn fetch_alerts(&self, limit: usize) -> ProviderResult<Vec<AlertRecord>> {
        let body = self
            .http
            .get_json(
                &self.url("news"),
                &[("category", "general"), ("token", self.api_key.as_str())],
            )
            .await?;
        parse_news(&body, limit)
    }
}

fn check_error(body: &Value) -> ProviderResult<()> {
    if let Some(err) = body.get("error").and_then(Value::as_str) {
        let lower = err.to_ascii_lowercase();
        if lower.contains("limit") {
            return Err(ProviderFailure::rate_limited(err.to_string()));
        }
        return Err(ProviderFailure::malformed(format!("finnhub error: {err}")));
    }
    Ok(())
}

fn parse_quote(symbol: &str, body: &Value) -> ProviderResult<QuoteRecord> {
    check_error(body)?;

    let field = |key: &str| body.get(key).and_then(parse_num);
    let price = field("c").ok_or_else(|| ProviderFailure::malformed("quote has no price"))?;
    // Finnhub answers unknown symbols with an all-zero payload instead of an error.
    if price <= 0.0 {
        return Err(ProviderFailure::malformed(format!(
            "no quote data for {symbol}"
        )));
    }

    let previous_close = field("pc").unwrap_or(price);
    let change = field("d").unwrap_or(price - previous_close);
    let change_percent = field("dp").unwrap_or_else(|| {
        if previous_close > 0.0 {
            change / previous_close * 100.0
        } else {
            0.0
        }
    });
    let timestamp = body
        .get("t")
        .and_then(Value::as_i64)
        .filter(|t| *t > 0)
        .and_then(|t| Utc.timestamp_opt(t, 0).single())
        .unwrap_or_else(Utc::now);

    Ok(QuoteRecord {
        symbol: symbol.to_string(),
        price: round2(price),
        change: round2(change),
        change_percent: round2(change_percent),
        // The quote endpoint carries no volume.
        volume: 0,
        high: round2(field("h").unwrap_or(price)),
        low: round2(field("l").unwrap_or(price)),
        open: round2(field("o").unwrap_or(previous_close)),
        previous_close: round2(previous_close),
        timestamp,
        is_live: true,
        source: SOURCE.to_string(),
    })
}

#[derive(Debug, Clone, Deserialize)]
struct FinnhubArticle {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    headline: String,
    #[serde(default)]
    datetime: i64,
    #[serde(default)]
    source: String,
}

fn parse_news(body: &Value, limit: usize) -> ProviderResult<Vec<AlertRecord>> {
    check_error(body)?;

    let articles = serde_json::from_value::<Vec<FinnhubArticle>>(body.clone())
        .map_err(|e| ProviderFailure::malformed(format!("unexpected news payload: {e}")))?;

    let alerts = articles
        .into_iter()
        .filter(|a| !a.headline.trim().is_empty())
        .take(limit)
        .map(|a| {
            let timestamp: DateTime<Utc> = Utc
                .timestamp_opt(a.datetime, 0)
                .single()
                .unwrap_or_else(Utc::now);
            let source = if a.source.trim().is_empty() {
                SOURCE.to_string()
            } else {
                a.source.trim().to_string()
            };
            AlertRecord {
                id: format!("finnhub-{}", a.id),
                kind: AlertKind::classify(None, &a.headline),
                title: a.headline.trim().to_string(),
                timestamp,
                source,
                is_live: true,
            }
        })
        .collect();
    Ok(alerts)
}
