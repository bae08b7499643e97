pub mod cache;
pub mod domain;
pub mod llm;
pub mod market;
pub mod provider;
pub mod report;
pub mod simulate;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_QUOTE_CACHE_TTL_SECS: u64 = 60;
    const DEFAULT_ALERT_CACHE_TTL_SECS: u64 = 300;
    const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub finnhub_api_key: Option<String>,
        pub alpha_vantage_api_key: Option<String>,
        pub news_api_key: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub quote_cache_ttl: Duration,
        pub alert_cache_ttl: Duration,
        pub provider_timeout: Duration,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                finnhub_api_key: None,
                alpha_vantage_api_key: None,
                news_api_key: None,
                anthropic_api_key: None,
                sentry_dsn: None,
                quote_cache_ttl: Duration::from_secs(DEFAULT_QUOTE_CACHE_TTL_SECS),
                alert_cache_ttl: Duration::from_secs(DEFAULT_ALERT_CACHE_TTL_SECS),
                provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                finnhub_api_key: secret("FINNHUB_API_KEY"),
                alpha_vantage_api_key: secret("ALPHA_VANTAGE_API_KEY"),
                news_api_key: secret("NEWS_API_KEY"),
                anthropic_api_key: secret("ANTHROPIC_API_KEY"),
                sentry_dsn: secret("SENTRY_DSN"),
                quote_cache_ttl: secs_var("QUOTE_CACHE_TTL_SECS", DEFAULT_QUOTE_CACHE_TTL_SECS)?,
                alert_cache_ttl: secs_var("ALERT_CACHE_TTL_SECS", DEFAULT_ALERT_CACHE_TTL_SECS)?,
                provider_timeout: secs_var(
                    "PROVIDER_TIMEOUT_SECS",
                    DEFAULT_PROVIDER_TIMEOUT_SECS,
                )?,
            })
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }
    }

    // Blank values count as absent so an empty `KEY=` line in .env disables the provider.
    fn secret(name: &str) -> Option<String> {
        std::env::var(name)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn secs_var(name: &str, default: u64) -> anyhow::Result<Duration> {
        match std::env::var(name) {
            Ok(raw) if !raw.trim().is_empty() => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("{name} must be a whole number of seconds"))?;
                Ok(Duration::from_secs(secs))
            }
            _ => Ok(Duration::from_secs(default)),
        }
    }
}
