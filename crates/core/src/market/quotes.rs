use crate::cache::CacheStore;
use crate::config::Settings;
use crate::domain::quote::{normalize_symbol, QuoteRecord};
use crate::provider::alpha_vantage::AlphaVantageClient;
use crate::provider::finnhub::FinnhubClient;
use crate::provider::{ProviderFailure, QuoteProvider};
use crate::simulate::simulated_quote;
use chrono::Utc;
use std::time::Duration;

/// A quote plus, when the live path failed, the reason simulated data was used instead.
#[derive(Debug, Clone)]
pub struct QuoteOutcome {
    pub quote: QuoteRecord,
    pub warning: Option<String>,
}

/// First-success-wins provider chain in front of a TTL cache. Never fails: when no provider
/// produces a quote the caller gets a simulated one.
pub struct QuoteService {
    providers: Vec<Box<dyn QuoteProvider>>,
    cache: CacheStore<QuoteRecord>,
}

impl QuoteService {
    pub fn new(providers: Vec<Box<dyn QuoteProvider>>, cache_ttl: Duration) -> Self {
        Self {
            providers,
            cache: CacheStore::new(cache_ttl),
        }
    }

    /// Providers in priority order; each one is included only when its key is configured.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let mut providers: Vec<Box<dyn QuoteProvider>> = Vec::new();
        if let Some(client) = FinnhubClient::from_settings(settings)? {
            providers.push(Box::new(client));
        }
        if let Some(client) = AlphaVantageClient::from_settings(settings)? {
            providers.push(Box::new(client));
        }

        let service = Self::new(providers, settings.quote_cache_ttl);
        tracing::info!(
            providers = ?service.provider_names(),
            ttl_secs = settings.quote_cache_ttl.as_secs(),
            "quote service ready"
        );
        Ok(service)
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.provider_name()).collect()
    }

    pub fn cached(&self, symbol: &str) -> Option<QuoteRecord> {
        self.cache.get(&cache_key(&normalize_symbol(symbol)))
    }

    pub async fn get_quote(&self, symbol: &str) -> QuoteRecord {
        self.fetch(symbol).await.quote
    }

    pub async fn fetch(&self, symbol: &str) -> QuoteOutcome {
        let symbol = normalize_symbol(symbol);
        let key = cache_key(&symbol);

        if let Some(quote) = self.cache.get(&key) {
            tracing::debug!(%symbol, "quote cache hit");
            return QuoteOutcome {
                quote,
                warning: None,
            };
        }

        let mut last_failure = ProviderFailure::no_provider();
        for provider in &self.providers {
            match provider.fetch_quote(&symbol).await {
                Ok(quote) => {
                    self.cache.set(key, quote.clone());
                    return QuoteOutcome {
                        quote,
                        warning: None,
                    };
                }
                Err(failure) => {
                    tracing::warn!(
                        %symbol,
                        provider = provider.provider_name(),
                        kind = %failure.kind,
                        reason = %failure.reason,
                        "quote provider failed; trying next"
                    );
                    last_failure = failure;
                }
            }
        }

        // Simulated quotes stay out of the cache so the next call tries live providers again.
        tracing::warn!(%symbol, error = %last_failure, "serving simulated quote");
        QuoteOutcome {
            quote: simulate_now(&symbol),
            warning: Some(last_failure.to_string()),
        }
    }
}

pub fn cache_key(symbol: &str) -> String {
    format!("quote:{symbol}")
}

pub(crate) fn simulate_now(symbol: &str) -> QuoteRecord {
    simulated_quote(symbol, &mut rand::thread_rng(), Utc::now())
}
