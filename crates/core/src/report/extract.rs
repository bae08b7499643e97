use crate::domain::quote::{round2, QuoteRecord};
use crate::domain::report::{ReportHighlights, ReportMetrics, ReportSections};
use crate::report::sector::{default_risks, Sector};
use rand::{Rng, RngCore};
use regex::Regex;
use std::sync::LazyLock;

const DEFAULT_RATING: &str = "HOLD";
const DEFAULT_TARGET_MULTIPLIER: f64 = 1.12;
const TREND_THRESHOLD_PERCENT: f64 = 1.0;
const MAX_RISKS: usize = 5;
const MIN_RISK_CHARS: usize = 15;

/// Inputs the default generators draw on.
pub struct ExtractContext<'a> {
    pub quote: &'a QuoteRecord,
    pub sector: Option<Sector>,
    pub metrics: &'a ReportMetrics,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub highlights: ReportHighlights,
    pub sections: ReportSections,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatingExtraction {
    pub rating: String,
    pub target_price: f64,
}

static RATING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(strong[ \t]+buy|strong[ \t]+sell|buy|sell|hold)\b").expect("Invalid regex")
});

static TARGET_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)target[ \t]+price(?:[^$\n]{0,30}\$[ \t]*|[^$\d\n]{0,30})(\d[\d,]*(?:\.\d+)?)(?:[^\w-]|$)",
    )
    .expect("Invalid regex")
});

static TREND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(bullish|bearish|neutral|positive|negative)\b").expect("Invalid regex")
});

static SUPPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)support[^$\n]{0,30}\$[ \t]*(\d[\d,]*(?:\.\d+)?)").expect("Invalid regex")
});

static RESISTANCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)resistance[^$\n]{0,30}\$[ \t]*(\d[\d,]*(?:\.\d+)?)").expect("Invalid regex")
});

/// "2. MARKET POSITION" style headers; upper case only so numbered risk items don't match.
static NUMBERED_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:#{1,6}[ \t]*)?(?:\*\*)?\d+[.)][ \t]*(?:\*\*)?[A-Z][A-Z &/,-]{2,}(?:\*\*)?:?(?:\*\*)?[ \t]*$")
        .expect("Invalid regex")
});

static RISK_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)\n|•|(?:^|[ \t])\d{1,2}[.)][ \t]+|(?:^|[ \t])[-*][ \t]+").expect("Invalid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    ExecutiveSummary,
    MarketPosition,
    TechnicalAnalysis,
    FundamentalAnalysis,
    Recommendation,
    RiskFactors,
}

const SECTIONS: [(Section, &str); 6] = [
    (Section::ExecutiveSummary, r"EXECUTIVE[ \t]+SUMMARY"),
    (Section::MarketPosition, r"MARKET[ \t]+POSITION(?:ING)?"),
    (Section::TechnicalAnalysis, r"TECHNICAL[ \t]+ANALYSIS"),
    (Section::FundamentalAnalysis, r"FUNDAMENTAL[ \t]+ANALYSIS"),
    (Section::Recommendation, r"(?:INVESTMENT[ \t]+)?RECOMMENDATION"),
    (Section::RiskFactors, r"(?:KEY[ \t]+)?RISK(?:[ \t]+FACTORS|S)"),
];

/// A header sits at the start of a line, may carry markdown/numbering decoration, and is
/// followed by a colon or the end of the line.
static SECTION_HEADERS: LazyLock<Vec<(Section, Regex)>> = LazyLock::new(|| {
    SECTIONS
        .iter()
        .map(|(section, name)| {
            let pattern = format!(
                r"(?im)^[ \t]*(?:#{{1,6}}[ \t]*)?(?:\*\*)?(?:\d+[.)][ \t]*)?(?:\*\*)?{name}(?:\*\*)?[ \t]*(?::(?:\*\*)?|$)"
            );
            (*section, Regex::new(&pattern).expect("Invalid regex"))
        })
        .collect()
});

/// Price-level rules: (pattern, default as a multiple range of the current price).
struct LevelRule {
    name: &'static str,
    pattern: &'static LazyLock<Regex>,
    default: fn(&QuoteRecord, &mut dyn RngCore) -> f64,
}

static LEVEL_RULES: [LevelRule; 2] = [
    LevelRule {
        name: "support",
        pattern: &SUPPORT_RE,
        default: |quote, rng| quote.price * rng.gen_range(0.93..0.97),
    },
    LevelRule {
        name: "resistance",
        pattern: &RESISTANCE_RE,
        default: |quote, rng| quote.price * rng.gen_range(1.06..1.10),
    },
];

/// Fills every highlight and section from `text`. Each field has its own case-insensitive rule
/// and its own default, so a miss on one field never affects another.
pub fn extract(text: &str, ctx: &ExtractContext<'_>, rng: &mut dyn RngCore) -> Extraction {
    let text = text.replace("\r\n", "\n");

    let RatingExtraction {
        rating,
        target_price,
    } = extract_rating(&text, ctx.quote.price);
    let trend = extract_trend(&text, ctx.quote.change_percent);

    let mut levels = LEVEL_RULES.iter().map(|rule| {
        capture_number(rule.pattern, &text).unwrap_or_else(|| {
            tracing::debug!(field = rule.name, "no match in generated text; using default");
            round2((rule.default)(ctx.quote, rng))
        })
    });
    let support = levels.next().unwrap_or_default();
    let resistance = levels.next().unwrap_or_default();

    let highlights = ReportHighlights {
        rating,
        target_price,
        trend,
        support,
        resistance,
    };

    let sections = ReportSections {
        executive_summary: section_or(&text, Section::ExecutiveSummary, || {
            default_executive_summary(ctx, &highlights)
        }),
        market_position: section_or(&text, Section::MarketPosition, || {
            default_market_position(ctx)
        }),
        technical_analysis: section_or(&text, Section::TechnicalAnalysis, || {
            default_technical_analysis(ctx, &highlights)
        }),
        fundamental_analysis: section_or(&text, Section::FundamentalAnalysis, || {
            default_fundamental_analysis(ctx)
        }),
        recommendation: section_or(&text, Section::Recommendation, || {
            default_recommendation(ctx, &highlights)
        }),
        risks: extract_risks(&text, ctx.sector),
    };

    Extraction {
        highlights,
        sections,
    }
}

/// Rating is the leftmost rating keyword; target price follows "target price" with an optional
/// dollar sign. Defaults: HOLD and 12% above the current price.
pub fn extract_rating(text: &str, price: f64) -> RatingExtraction {
    let rating = RATING_RE
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| {
            m.as_str()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_ascii_uppercase()
        })
        .unwrap_or_else(|| DEFAULT_RATING.to_string());

    let target_price = capture_number(&TARGET_PRICE_RE, text)
        .unwrap_or_else(|| round2(price * DEFAULT_TARGET_MULTIPLIER));

    RatingExtraction {
        rating,
        target_price,
    }
}

/// First trend word, title-cased; otherwise derived from the day's move.
pub fn extract_trend(text: &str, change_percent: f64) -> String {
    if let Some(word) = TREND_RE
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_lowercase())
    {
        let mut chars = word.chars();
        return match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => word,
        };
    }

    if change_percent > TREND_THRESHOLD_PERCENT {
        "Bullish".to_string()
    } else if change_percent < -TREND_THRESHOLD_PERCENT {
        "Bearish".to_string()
    } else {
        "Neutral".to_string()
    }
}

/// Risk bullets from the risk section, at most five, each longer than fifteen characters.
/// Falls back to the sector's list (or a generic one) when nothing usable is found.
pub fn extract_risks(text: &str, sector: Option<Sector>) -> Vec<String> {
    let risks: Vec<String> = section_text(text, Section::RiskFactors)
        .map(|body| {
            RISK_SPLIT_RE
                .split(&body)
                .map(|fragment| {
                    fragment
                        .trim()
                        .trim_start_matches(|c: char| !c.is_alphanumeric())
                        .trim_end()
                        .to_string()
                })
                .filter(|fragment| fragment.chars().count() > MIN_RISK_CHARS)
                .take(MAX_RISKS)
                .collect()
        })
        .unwrap_or_default();

    if risks.is_empty() {
        tracing::debug!(field = "risks", "no match in generated text; using default");
        default_risks(sector)
    } else {
        risks
    }
}

fn capture_number(re: &Regex, text: &str) -> Option<f64> {
    let raw = re.captures(text)?.get(1)?.as_str().replace(',', "");
    raw.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

fn section_or(text: &str, section: Section, default: impl FnOnce() -> String) -> String {
    section_text(text, section).unwrap_or_else(|| {
        tracing::debug!(field = ?section, "no match in generated text; using default");
        default()
    })
}

/// Text from the header up to the next blank line, the next numbered header, or the next known
/// section header. Content may start on the header line itself ("RECOMMENDATION: BUY ...").
fn section_text(text: &str, section: Section) -> Option<String> {
    let header = SECTION_HEADERS
        .iter()
        .find(|(s, _)| *s == section)
        .map(|(_, re)| re)?;
    let found = header.find(text)?;

    let mut lines: Vec<&str> = Vec::new();
    for (idx, line) in text[found.end()..].lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if lines.is_empty() {
                continue;
            }
            break;
        }
        if idx > 0 && is_header_line(trimmed) {
            break;
        }
        lines.push(trimmed);
    }

    let body = lines.join("\n");
    let body = body.trim_matches(|c: char| c == '*' || c.is_whitespace());
    if body.is_empty() {
        None
    } else {
        Some(body.to_string())
    }
}

fn is_header_line(line: &str) -> bool {
    NUMBERED_HEADER_RE.is_match(line) || SECTION_HEADERS.iter().any(|(_, re)| re.is_match(line))
}

fn default_executive_summary(ctx: &ExtractContext<'_>, h: &ReportHighlights) -> String {
    let q = ctx.quote;
    format!(
        "{} is trading at ${:.2} ({:+.2}% on the day) with a {} near-term trend. \
         The overall rating is {} with a target price of ${:.2}.",
        q.symbol,
        q.price,
        q.change_percent,
        h.trend.to_lowercase(),
        h.rating,
        h.target_price
    )
}

fn default_market_position(ctx: &ExtractContext<'_>) -> String {
    match ctx.sector {
        Some(sector) => format!(
            "{} is an established participant in the {} sector, where scale and brand \
             strength support its competitive standing.",
            ctx.quote.symbol,
            sector.name()
        ),
        None => format!(
            "{} holds an established position in its market; competitive dynamics should be \
             monitored against sector peers.",
            ctx.quote.symbol
        ),
    }
}

fn default_technical_analysis(ctx: &ExtractContext<'_>, h: &ReportHighlights) -> String {
    format!(
        "Price is ${:.2} with support near ${:.2} and resistance near ${:.2}. \
         RSI stands at {:.1}; {}.",
        ctx.quote.price, h.support, h.resistance, ctx.metrics.rsi, ctx.metrics.macd_note
    )
}

fn default_fundamental_analysis(ctx: &ExtractContext<'_>) -> String {
    let m = ctx.metrics;
    format!(
        "The stock trades at {:.1}x earnings with a {:.1}% profit margin and {:.1}% revenue \
         growth. Beta is {:.2} and the dividend yield is {:.2}%.",
        m.pe_ratio, m.profit_margin, m.revenue_growth, m.beta, m.dividend_yield
    )
}

fn default_recommendation(ctx: &ExtractContext<'_>, h: &ReportHighlights) -> String {
    let upside = if ctx.quote.price > 0.0 {
        (h.target_price / ctx.quote.price - 1.0) * 100.0
    } else {
        0.0
    };
    format!(
        "{} with a 12-month target price of ${:.2}, implying {:+.1}% from the current price.",
        h.rating, h.target_price, upside
    )
}
