use crate::domain::quote::QuoteRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub stock: String,
    pub sector: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub is_ai_generated: bool,
    pub quote: QuoteRecord,
    pub highlights: ReportHighlights,
    pub metrics: ReportMetrics,
    pub sections: ReportSections,
}

/// Every field is always populated; missing source text is replaced by generated defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSections {
    pub executive_summary: String,
    pub market_position: String,
    pub technical_analysis: String,
    pub fundamental_analysis: String,
    pub recommendation: String,
    pub risks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportHighlights {
    pub rating: String,
    pub target_price: f64,
    pub trend: String,
    pub support: f64,
    pub resistance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetrics {
    pub pe_ratio: f64,
    pub profit_margin: f64,
    pub revenue_growth: f64,
    pub beta: f64,
    pub dividend_yield: f64,
    pub rsi: f64,
    pub macd_note: String,
}
