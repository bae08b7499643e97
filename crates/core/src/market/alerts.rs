use crate::cache::CacheStore;
use crate::config::Settings;
use crate::domain::alert::{sort_and_truncate, AlertRecord};
use crate::provider::alpha_vantage::AlphaVantageClient;
use crate::provider::finnhub::FinnhubClient;
use crate::provider::news_api::NewsApiClient;
use crate::provider::NewsProvider;
use crate::simulate::simulated_alerts;
use chrono::Utc;
use std::time::Duration;

pub const PER_PROVIDER_LIMIT: usize = 5;
pub const MAX_ALERTS: usize = 10;

const CACHE_KEY: &str = "alerts:latest";

/// Union of every configured news provider, newest first. Unlike quotes, all providers are
/// queried on every refresh so coverage is as wide as possible.
pub struct AlertService {
    providers: Vec<Box<dyn NewsProvider>>,
    cache: CacheStore<Vec<AlertRecord>>,
}

impl AlertService {
    pub fn new(providers: Vec<Box<dyn NewsProvider>>, cache_ttl: Duration) -> Self {
        Self {
            providers,
            cache: CacheStore::new(cache_ttl),
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let mut providers: Vec<Box<dyn NewsProvider>> = Vec::new();
        if let Some(client) = AlphaVantageClient::from_settings(settings)? {
            providers.push(Box::new(client));
        }
        if let Some(client) = FinnhubClient::from_settings(settings)? {
            providers.push(Box::new(client));
        }
        if let Some(client) = NewsApiClient::from_settings(settings)? {
            providers.push(Box::new(client));
        }

        let service = Self::new(providers, settings.alert_cache_ttl);
        tracing::info!(
            providers = ?service.provider_names(),
            ttl_secs = settings.alert_cache_ttl.as_secs(),
            "alert service ready"
        );
        Ok(service)
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.provider_name()).collect()
    }

    pub async fn get_alerts(&self) -> Vec<AlertRecord> {
        if let Some(alerts) = self.cache.get(CACHE_KEY) {
            tracing::debug!(count = alerts.len(), "alert cache hit");
            return alerts;
        }

        let mut union = Vec::new();
        for provider in &self.providers {
            match provider.fetch_alerts(PER_PROVIDER_LIMIT).await {
                Ok(mut alerts) => {
                    alerts.truncate(PER_PROVIDER_LIMIT);
                    tracing::debug!(
                        provider = provider.provider_name(),
                        count = alerts.len(),
                        "news provider returned alerts"
                    );
                    union.extend(alerts);
                }
                Err(failure) => {
                    tracing::warn!(
                        provider = provider.provider_name(),
                        kind = %failure.kind,
                        reason = %failure.reason,
                        "news provider failed"
                    );
                }
            }
        }

        if union.is_empty() {
            tracing::warn!(
                providers = self.providers.len(),
                "no live alerts available; serving simulated alerts"
            );
            return simulate_now();
        }

        sort_and_truncate(&mut union, MAX_ALERTS);
        self.cache.set(CACHE_KEY, union.clone());
        union
    }
}

fn simulate_now() -> Vec<AlertRecord> {
    simulated_alerts(&mut rand::thread_rng(), Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alert::AlertKind;
    use crate::provider::{ProviderFailure, ProviderResult};
    use chrono::{DateTime, Duration as ChronoDuration};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeNewsProvider {
        name: &'static str,
        outcome: ProviderResult<Vec<AlertRecord>>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeNewsProvider {
        fn new(name: &'static str, outcome: ProviderResult<Vec<AlertRecord>>) -> Self {
            Self {
                name,
                outcome,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait::async_trait]
    impl NewsProvider for FakeNewsProvider {
        fn provider_name(&self) -> &'static str {
            self.name
        }

        async fn fetch_alerts(&self, _limit: usize) -> ProviderResult<Vec<AlertRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn alerts(source: &str, base: DateTime<Utc>, offsets_min: &[i64]) -> Vec<AlertRecord> {
        offsets_min
            .iter()
            .map(|m| AlertRecord {
                id: format!("{source}-{m}"),
                title: format!("{source} headline {m}"),
                kind: AlertKind::Neutral,
                timestamp: base - ChronoDuration::minutes(*m),
                source: source.to_string(),
                is_live: true,
            })
            .collect()
    }

    fn ttl() -> Duration {
        Duration::from_secs(300)
    }

    #[tokio::test]
    async fn unions_all_providers_sorted_and_capped() {
        let base = Utc::now();
        let a = FakeNewsProvider::new("a", Ok(alerts("a", base, &[1, 9, 17, 25, 33])));
        let b = FakeNewsProvider::new("b", Ok(alerts("b", base, &[3, 11, 19, 27, 35])));
        let c = FakeNewsProvider::new("c", Ok(alerts("c", base, &[5, 13, 21, 29, 37])));
        let c_calls = Arc::clone(&c.calls);

        let service = AlertService::new(vec![Box::new(a), Box::new(b), Box::new(c)], ttl());
        let out = service.get_alerts().await;

        assert_eq!(out.len(), MAX_ALERTS);
        assert!(out.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert_eq!(out[0].id, "a-1");
        assert_eq!(out[1].id, "b-3");
        assert_eq!(out[2].id, "c-5");
        assert_eq!(c_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_provider_does_not_hide_others() {
        let base = Utc::now();
        let service = AlertService::new(
            vec![
                Box::new(FakeNewsProvider::new(
                    "down",
                    Err(ProviderFailure::rate_limited("25 requests per day")),
                )),
                Box::new(FakeNewsProvider::new("up", Ok(alerts("up", base, &[2, 4])))),
            ],
            ttl(),
        );
        let out = service.get_alerts().await;
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|a| a.is_live));
    }

    #[tokio::test]
    async fn empty_union_falls_back_to_simulation_without_caching() {
        let empty = FakeNewsProvider::new("empty", Ok(Vec::new()));
        let calls = Arc::clone(&empty.calls);
        let service = AlertService::new(vec![Box::new(empty)], ttl());

        let first = service.get_alerts().await;
        let second = service.get_alerts().await;

        assert_eq!(first.len(), 6);
        assert!(first.iter().all(|a| !a.is_live && a.source == "Market Simulation"));
        assert!(second.iter().all(|a| !a.is_live));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn no_providers_serves_simulation() {
        let service = AlertService::new(Vec::new(), ttl());
        let out = service.get_alerts().await;
        assert!(!out.is_empty() && out.len() <= MAX_ALERTS);
        assert!(out.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[tokio::test]
    async fn live_union_is_cached() {
        let base = Utc::now();
        let provider = FakeNewsProvider::new("p", Ok(alerts("p", base, &[1])));
        let calls = Arc::clone(&provider.calls);
        let service = AlertService::new(vec![Box::new(provider)], ttl());

        let first = service.get_alerts().await;
        let second = service.get_alerts().await;
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
