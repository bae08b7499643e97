use crate::domain::alert::{sort_and_truncate, AlertKind, AlertRecord};
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::RangeInclusive;

pub const SIMULATED_ALERT_SOURCE: &str = "Market Simulation";

const SIMULATED_ALERT_COUNT: usize = 6;

const WATCH_SYMBOLS: &[&str] = &["AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "TSLA", "META"];

struct AlertTemplate {
    headline: &'static str,
    kind: AlertKind,
    minutes_ago: RangeInclusive<i64>,
}

const TEMPLATES: &[AlertTemplate] = &[
    AlertTemplate {
        headline: "{symbol} surges {percent}% after earnings beat expectations",
        kind: AlertKind::Bullish,
        minutes_ago: 2..=15,
    },
    AlertTemplate {
        headline: "{symbol} announces ${amount}B share buyback program",
        kind: AlertKind::Bullish,
        minutes_ago: 20..=45,
    },
    AlertTemplate {
        headline: "Analysts cut {symbol} price target to ${price} on margin concerns",
        kind: AlertKind::Bearish,
        minutes_ago: 50..=90,
    },
    AlertTemplate {
        headline: "{symbol} falls {percent}% as regulators open antitrust probe",
        kind: AlertKind::Bearish,
        minutes_ago: 100..=180,
    },
    AlertTemplate {
        headline: "{symbol} schedules investor day to outline product roadmap",
        kind: AlertKind::Neutral,
        minutes_ago: 200..=300,
    },
    AlertTemplate {
        headline: "Options activity in {symbol} climbs ahead of Fed decision",
        kind: AlertKind::Neutral,
        minutes_ago: 320..=480,
    },
    AlertTemplate {
        headline: "{symbol} upgraded to outperform with ${price} target",
        kind: AlertKind::Bullish,
        minutes_ago: 500..=720,
    },
    AlertTemplate {
        headline: "{symbol} slides {percent}% after supplier warns on demand",
        kind: AlertKind::Bearish,
        minutes_ago: 740..=1440,
    },
];

/// Six templated alerts backdated from `now`, newest first.
pub fn simulated_alerts<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> Vec<AlertRecord> {
    let mut alerts: Vec<AlertRecord> = TEMPLATES
        .iter()
        .take(SIMULATED_ALERT_COUNT)
        .map(|template| {
            let symbol = WATCH_SYMBOLS.choose(rng).copied().unwrap_or("AAPL");
            let percent: u32 = rng.gen_range(5..=25);
            let amount: f64 = (rng.gen_range(10.0..=60.0_f64) * 10.0).round() / 10.0;
            let price: u32 = rng.gen_range(150..=350);
            let minutes_ago = rng.gen_range(template.minutes_ago.clone());

            let title = template
                .headline
                .replace("{symbol}", symbol)
                .replace("{percent}", &percent.to_string())
                .replace("{amount}", &format!("{amount:.1}"))
                .replace("{price}", &price.to_string());

            AlertRecord {
                id: format!("sim-{}", uuid::Uuid::from_u128(rng.gen::<u128>())),
                title,
                kind: template.kind,
                timestamp: now - Duration::minutes(minutes_ago),
                source: SIMULATED_ALERT_SOURCE.to_string(),
                is_live: false,
            }
        })
        .collect();

    sort_and_truncate(&mut alerts, SIMULATED_ALERT_COUNT);
    alerts
}
