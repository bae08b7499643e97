use crate::domain::quote::QuoteRecord;
use crate::domain::report::AnalysisReport;
use crate::llm::error::GenerationHttpError;
use crate::llm::TextGenerator;
use crate::market::QuoteService;
use chrono::{DateTime, Utc};
use rand::RngCore;
use std::sync::Arc;

pub mod extract;
pub mod prompt;
pub mod sector;

pub use sector::Sector;

#[derive(Debug)]
pub enum ReportError {
    /// The text generator failed or produced nothing to extract from.
    NoSourceText { symbol: String, detail: String },
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::NoSourceText { symbol, detail } => {
                write!(f, "no source text for {symbol} report: {detail}")
            }
        }
    }
}

impl std::error::Error for ReportError {}

/// Quote -> prompt -> generated prose -> extracted report.
pub struct ReportService {
    quotes: Arc<QuoteService>,
    generator: Arc<dyn TextGenerator>,
}

impl ReportService {
    pub fn new(quotes: Arc<QuoteService>, generator: Arc<dyn TextGenerator>) -> Self {
        Self { quotes, generator }
    }

    pub async fn generate(&self, symbol: &str) -> Result<AnalysisReport, ReportError> {
        let quote = self.quotes.get_quote(symbol).await;
        let sector = Sector::for_symbol(&quote.symbol);
        let prompt = prompt::analysis_prompt(&quote, sector);

        let text = self
            .generator
            .generate_text(&prompt)
            .await
            .map_err(|e| {
                if let Some(http) = e.downcast_ref::<GenerationHttpError>() {
                    tracing::warn!(
                        symbol = %quote.symbol,
                        status = http.status,
                        overloaded = http.is_overloaded(),
                        "text generator rejected request"
                    );
                }
                ReportError::NoSourceText {
                    symbol: quote.symbol.clone(),
                    detail: format!("{:?} generation failed: {e:#}", self.generator.provider()),
                }
            })?;

        if text.trim().is_empty() {
            return Err(ReportError::NoSourceText {
                symbol: quote.symbol,
                detail: "generator returned empty text".to_string(),
            });
        }

        tracing::info!(
            symbol = %quote.symbol,
            sector = sector.map(|s| s.name()).unwrap_or("unknown"),
            chars = text.len(),
            "assembling report"
        );
        Ok(assemble_now(&text, quote, sector))
    }
}

fn assemble_now(text: &str, quote: QuoteRecord, sector: Option<Sector>) -> AnalysisReport {
    assemble_report(text, quote, sector, &mut rand::thread_rng(), Utc::now())
}

/// Builds the report from generated text. Anything the text does not state is filled from
/// defaults drawn from `rng`.
pub fn assemble_report(
    text: &str,
    quote: QuoteRecord,
    sector: Option<Sector>,
    rng: &mut dyn RngCore,
    now: DateTime<Utc>,
) -> AnalysisReport {
    let metrics = sector::synthetic_metrics(sector, rng);
    let extracted = extract::extract(
        text,
        &extract::ExtractContext {
            quote: &quote,
            sector,
            metrics: &metrics,
        },
        rng,
    );

    AnalysisReport {
        stock: quote.symbol.clone(),
        sector: sector.map(|s| s.name().to_string()),
        generated_at: now,
        is_ai_generated: true,
        quote,
        highlights: extracted.highlights,
        metrics,
        sections: extracted.sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Provider, TextPrompt};
    use crate::market::quotes::tests::FakeQuoteProvider;
    use std::time::Duration;

    struct FakeGenerator {
        reply: anyhow::Result<String>,
    }

    #[async_trait::async_trait]
    impl TextGenerator for FakeGenerator {
        fn provider(&self) -> Provider {
            Provider::Anthropic
        }

        async fn generate_text(&self, prompt: &TextPrompt) -> anyhow::Result<String> {
            assert!(!prompt.user.is_empty());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    fn service(reply: anyhow::Result<String>) -> ReportService {
        let quotes = QuoteService::new(
            vec![Box::new(FakeQuoteProvider::ok("live", 100.0))],
            Duration::from_secs(60),
        );
        ReportService::new(Arc::new(quotes), Arc::new(FakeGenerator { reply }))
    }

    #[tokio::test]
    async fn assembles_report_from_generated_text() {
        let text = "RECOMMENDATION: SELL. Target price $90.\nTrend is bearish.\n\n\
                    RISK FACTORS:\n- Weakening demand across core product lines\n";
        let report = service(Ok(text.to_string())).generate("msft").await.unwrap();

        assert_eq!(report.stock, "MSFT");
        assert_eq!(report.sector.as_deref(), Some("Technology"));
        assert!(report.is_ai_generated);
        assert_eq!(report.quote.price, 100.0);
        assert_eq!(report.highlights.rating, "SELL");
        assert_eq!(report.highlights.target_price, 90.0);
        assert_eq!(report.highlights.trend, "Bearish");
        assert_eq!(
            report.sections.risks,
            vec!["Weakening demand across core product lines"]
        );
        assert!(!report.sections.executive_summary.is_empty());
        assert!(!report.sections.market_position.is_empty());
    }

    #[tokio::test]
    async fn generator_failure_is_no_source_text() {
        let err = service(Err(anyhow::anyhow!("status=529")))
            .generate("AAPL")
            .await
            .unwrap_err();
        let ReportError::NoSourceText { symbol, detail } = &err;
        assert_eq!(symbol, "AAPL");
        assert!(detail.contains("status=529"));
        assert!(err.to_string().starts_with("no source text for AAPL report"));
    }

    #[tokio::test]
    async fn blank_text_is_no_source_text() {
        let err = service(Ok("  \n\t ".to_string()))
            .generate("AAPL")
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::NoSourceText { .. }));
    }
}
