use crate::domain::quote::{round2, QuoteRecord};
use chrono::{DateTime, Utc};
use rand::Rng;

pub const SIMULATED_QUOTE_SOURCE: &str = "Simulated (Rate Limited)";

const DEFAULT_BASE_PRICE: f64 = 100.0;
const DEFAULT_BASE_VOLUME: f64 = 20_000_000.0;

const BASE_PRICES: &[(&str, f64)] = &[
    ("AAPL", 180.0),
    ("MSFT", 380.0),
    ("GOOGL", 140.0),
    ("AMZN", 155.0),
    ("NVDA", 480.0),
    ("TSLA", 245.0),
    ("META", 350.0),
    ("JPM", 170.0),
    ("V", 260.0),
    ("JNJ", 160.0),
    ("XOM", 105.0),
];

pub fn base_price(symbol: &str) -> f64 {
    BASE_PRICES
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, p)| *p)
        .unwrap_or(DEFAULT_BASE_PRICE)
}

fn base_volume(symbol: &str) -> f64 {
    match symbol {
        "AAPL" => 50_000_000.0,
        "NVDA" => 25_000_000.0,
        "MSFT" => 30_000_000.0,
        _ => DEFAULT_BASE_VOLUME,
    }
}

/// Builds a plausible quote around the symbol's reference price: ±3% on the price, ±2% daily
/// move, and volume between half and one and a half times the symbol's usual volume.
pub fn simulated_quote<R: Rng + ?Sized>(
    symbol: &str,
    rng: &mut R,
    now: DateTime<Utc>,
) -> QuoteRecord {
    let base = base_price(symbol);
    let variation: f64 = rng.gen_range(-0.03..0.03);
    let price = round2(base * (1.0 + variation));

    let daily: f64 = rng.gen_range(-0.02..0.02);
    let change = round2(price * daily);
    let change_percent = round2(daily * 100.0);

    let volume = (base_volume(symbol) * rng.gen_range(0.5..1.5)).floor() as u64;

    QuoteRecord {
        symbol: symbol.to_string(),
        price,
        change,
        change_percent,
        volume,
        high: round2(price * 1.02),
        low: round2(price * 0.98),
        open: round2(price * (1.0 - daily / 2.0)),
        previous_close: round2(price - change),
        timestamp: now,
        is_live: false,
        source: SIMULATED_QUOTE_SOURCE.to_string(),
    }
}
