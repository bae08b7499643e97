use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical quote shape. Live and simulated quotes share it field for field, so consumers never
/// branch on where a quote came from; `is_live` and `source` are informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub previous_close: f64,
    pub timestamp: DateTime<Utc>,
    pub is_live: bool,
    pub source: String,
}

/// One entry of a batch quote request. `data` is always present; `error` carries the reason
/// simulated data was substituted for a live quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub symbol: String,
    pub data: QuoteRecord,
    pub error: Option<String>,
}

pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_cents() {
        assert_eq!(round2(181.456), 181.46);
        assert_eq!(round2(-1.234), -1.23);
        assert_eq!(round2(100.0), 100.0);
    }

    #[test]
    fn normalizes_symbol_case_and_whitespace() {
        assert_eq!(normalize_symbol("  aapl "), "AAPL");
    }
}
