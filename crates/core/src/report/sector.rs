use crate::domain::quote::round2;
use crate::domain::report::ReportMetrics;
use rand::{Rng, RngCore};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sector {
    Technology,
    Healthcare,
    Financials,
    Energy,
    Consumer,
}

const SYMBOL_SECTORS: &[(&str, Sector)] = &[
    ("AAPL", Sector::Technology),
    ("MSFT", Sector::Technology),
    ("GOOGL", Sector::Technology),
    ("NVDA", Sector::Technology),
    ("META", Sector::Technology),
    ("AMZN", Sector::Consumer),
    ("TSLA", Sector::Consumer),
    ("WMT", Sector::Consumer),
    ("JPM", Sector::Financials),
    ("V", Sector::Financials),
    ("BAC", Sector::Financials),
    ("JNJ", Sector::Healthcare),
    ("PFE", Sector::Healthcare),
    ("UNH", Sector::Healthcare),
    ("XOM", Sector::Energy),
    ("CVX", Sector::Energy),
];

impl Sector {
    pub fn for_symbol(symbol: &str) -> Option<Sector> {
        SYMBOL_SECTORS
            .iter()
            .find(|(s, _)| *s == symbol)
            .map(|(_, sector)| *sector)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Sector::Technology => "Technology",
            Sector::Healthcare => "Healthcare",
            Sector::Financials => "Financials",
            Sector::Energy => "Energy",
            Sector::Consumer => "Consumer",
        }
    }
}

/// Ranges the synthetic metrics are drawn from, plus the fallback risk list.
struct SectorProfile {
    pe: Range<f64>,
    margin: Range<f64>,
    growth: Range<f64>,
    beta: Range<f64>,
    dividend: Range<f64>,
    rsi: Range<f64>,
    macd: Range<f64>,
    risks: [&'static str; 5],
}

static TECHNOLOGY: SectorProfile = SectorProfile {
    pe: 22.0..38.0,
    margin: 18.0..32.0,
    growth: 8.0..25.0,
    beta: 1.05..1.45,
    dividend: 0.0..1.0,
    rsi: 40.0..72.0,
    macd: -1.2..1.8,
    risks: [
        "Intensifying competition for talent and AI infrastructure spend",
        "Regulatory scrutiny of data privacy and antitrust practices",
        "Supply chain concentration in semiconductor manufacturing",
        "Rapid technology shifts that can erode product relevance",
        "Valuation sensitivity to rising interest rates",
    ],
};

static HEALTHCARE: SectorProfile = SectorProfile {
    pe: 14.0..26.0,
    margin: 10.0..24.0,
    growth: 3.0..12.0,
    beta: 0.6..0.95,
    dividend: 1.2..3.2,
    rsi: 35.0..65.0,
    macd: -1.0..1.0,
    risks: [
        "Clinical trial outcomes that may delay or derail key products",
        "Drug pricing reform and reimbursement pressure",
        "Patent expirations exposing revenue to generic competition",
        "Product liability and litigation exposure",
        "Lengthy regulatory approval timelines",
    ],
};

static FINANCIALS: SectorProfile = SectorProfile {
    pe: 9.0..16.0,
    margin: 20.0..35.0,
    growth: 2.0..9.0,
    beta: 0.9..1.3,
    dividend: 1.8..3.8,
    rsi: 38.0..66.0,
    macd: -0.8..1.0,
    risks: [
        "Credit losses rising as the economic cycle turns",
        "Net interest margin compression from rate cuts",
        "Stricter capital requirements under new regulation",
        "Exposure to commercial real estate valuations",
        "Cybersecurity incidents affecting customer trust",
    ],
};

static ENERGY: SectorProfile = SectorProfile {
    pe: 8.0..15.0,
    margin: 8.0..18.0,
    growth: -5.0..8.0,
    beta: 0.8..1.3,
    dividend: 2.8..5.5,
    rsi: 35.0..68.0,
    macd: -1.5..1.5,
    risks: [
        "Commodity price volatility driven by global supply decisions",
        "Energy transition policies reducing long-term demand",
        "Environmental liabilities and emissions regulation",
        "Geopolitical disruption in key producing regions",
        "High capital intensity of new exploration projects",
    ],
};

static CONSUMER: SectorProfile = SectorProfile {
    pe: 18.0..45.0,
    margin: 4.0..15.0,
    growth: 5.0..18.0,
    beta: 1.0..1.6,
    dividend: 0.0..1.5,
    rsi: 38.0..70.0,
    macd: -1.2..1.5,
    risks: [
        "Softening consumer spending amid persistent inflation",
        "Margin pressure from wage growth and logistics costs",
        "Intense price competition from online and discount rivals",
        "Inventory mismanagement during demand swings",
        "Brand damage from product recalls or controversies",
    ],
};

static GENERIC: SectorProfile = SectorProfile {
    pe: 12.0..28.0,
    margin: 6.0..20.0,
    growth: 2.0..12.0,
    beta: 0.8..1.3,
    dividend: 0.5..3.0,
    rsi: 35.0..65.0,
    macd: -1.0..1.0,
    risks: [
        "Macroeconomic slowdown reducing revenue growth",
        "Interest rate changes affecting valuation multiples",
        "Competitive pressure on pricing and market share",
        "Regulatory changes increasing compliance costs",
        "Execution risk on strategic initiatives",
    ],
};

fn profile(sector: Option<Sector>) -> &'static SectorProfile {
    match sector {
        Some(Sector::Technology) => &TECHNOLOGY,
        Some(Sector::Healthcare) => &HEALTHCARE,
        Some(Sector::Financials) => &FINANCIALS,
        Some(Sector::Energy) => &ENERGY,
        Some(Sector::Consumer) => &CONSUMER,
        None => &GENERIC,
    }
}

pub fn default_risks(sector: Option<Sector>) -> Vec<String> {
    profile(sector)
        .risks
        .iter()
        .map(|r| r.to_string())
        .collect()
}

/// Filler metrics for the report. None of these come from the generated text; they are drawn
/// from the sector's ranges so the report always renders.
pub fn synthetic_metrics(sector: Option<Sector>, rng: &mut dyn RngCore) -> ReportMetrics {
    let p = profile(sector);
    let macd: f64 = rng.gen_range(p.macd.clone());
    let macd_note = if macd > 0.5 {
        "MACD bullish crossover above the signal line"
    } else if macd < -0.5 {
        "MACD bearish crossover below the signal line"
    } else {
        "MACD flat near the signal line"
    };

    ReportMetrics {
        pe_ratio: round2(rng.gen_range(p.pe.clone())),
        profit_margin: round2(rng.gen_range(p.margin.clone())),
        revenue_growth: round2(rng.gen_range(p.growth.clone())),
        beta: round2(rng.gen_range(p.beta.clone())),
        dividend_yield: round2(rng.gen_range(p.dividend.clone())),
        rsi: round2(rng.gen_range(p.rsi.clone())),
        macd_note: format!("{macd_note} ({macd:+.2})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn resolves_known_symbols_only() {
        assert_eq!(Sector::for_symbol("NVDA"), Some(Sector::Technology));
        assert_eq!(Sector::for_symbol("XOM"), Some(Sector::Energy));
        assert_eq!(Sector::for_symbol("ZZZZ"), None);
    }

    #[test]
    fn metrics_stay_within_sector_ranges() {
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let m = synthetic_metrics(Some(Sector::Financials), &mut rng);
            assert!((9.0..=16.0).contains(&m.pe_ratio));
            assert!((1.8..=3.8).contains(&m.dividend_yield));
            assert!((38.0..=66.0).contains(&m.rsi));
            assert!(m.macd_note.starts_with("MACD"));
        }
    }

    #[test]
    fn unknown_sector_uses_generic_risks() {
        let generic = default_risks(None);
        assert_eq!(generic.len(), 5);
        assert_ne!(generic, default_risks(Some(Sector::Technology)));
    }
}
