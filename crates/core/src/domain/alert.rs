use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub is_live: bool,
}

const SENTIMENT_THRESHOLD: f64 = 0.2;

const BULLISH_KEYWORDS: &[&str] = &[
    "beat", "surge", "rally", "jump", "gain", "bullish", "up", "rise",
];
const BEARISH_KEYWORDS: &[&str] = &[
    "fall", "drop", "decline", "bear", "down", "plunge", "crash",
];

impl AlertKind {
    pub fn from_sentiment_score(score: f64) -> Self {
        if score > SENTIMENT_THRESHOLD {
            AlertKind::Bullish
        } else if score < -SENTIMENT_THRESHOLD {
            AlertKind::Bearish
        } else {
            AlertKind::Neutral
        }
    }

    /// Prefer the provider's numeric score; fall back to scanning the headline.
    pub fn classify(score: Option<f64>, headline: &str) -> Self {
        match score {
            Some(s) if s.is_finite() => Self::from_sentiment_score(s),
            _ => classify_headline(headline),
        }
    }
}

/// Keyword scan over the headline. Bullish words are checked before bearish ones; a keyword
/// matches at the start of a word so inflections ("surges", "dropped") count.
pub fn classify_headline(headline: &str) -> AlertKind {
    let lower = headline.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let hit = |keywords: &[&str]| {
        keywords
            .iter()
            .any(|k| words.iter().any(|w| w.starts_with(k)))
    };

    if hit(BULLISH_KEYWORDS) {
        AlertKind::Bullish
    } else if hit(BEARISH_KEYWORDS) {
        AlertKind::Bearish
    } else {
        AlertKind::Neutral
    }
}

/// Newest first, at most `limit` entries.
pub fn sort_and_truncate(alerts: &mut Vec<AlertRecord>, limit: usize) {
    alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    alerts.truncate(limit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn classifies_headlines_by_keyword() {
        let cases = [
            ("Stock surges after earnings beat", AlertKind::Bullish),
            ("Shares plunge on guidance cut", AlertKind::Bearish),
            ("Company names new CFO", AlertKind::Neutral),
            ("Oil prices DROP sharply", AlertKind::Bearish),
            ("Supply chain review announced", AlertKind::Neutral),
            // Bullish list wins when both match.
            ("Gains fade as index falls", AlertKind::Bullish),
        ];
        for (headline, expected) in cases {
            assert_eq!(classify_headline(headline), expected, "{headline}");
        }
    }

    #[test]
    fn score_takes_precedence_over_headline() {
        assert_eq!(
            AlertKind::classify(Some(-0.35), "Stock surges"),
            AlertKind::Bearish
        );
        assert_eq!(AlertKind::classify(Some(0.21), "Flat day"), AlertKind::Bullish);
        assert_eq!(AlertKind::classify(Some(0.2), "Stock surges"), AlertKind::Neutral);
        assert_eq!(AlertKind::classify(None, "Stock surges"), AlertKind::Bullish);
    }

    #[test]
    fn sorts_newest_first_and_truncates() {
        let base = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        let mut alerts: Vec<AlertRecord> = (0..15)
            .map(|i| AlertRecord {
                id: format!("a{i}"),
                title: format!("headline {i}"),
                kind: AlertKind::Neutral,
                timestamp: base + chrono::Duration::minutes((i * 7) % 15),
                source: "test".to_string(),
                is_live: true,
            })
            .collect();

        sort_and_truncate(&mut alerts, 10);
        assert_eq!(alerts.len(), 10);
        assert!(alerts.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn serializes_kind_as_type() {
        let alert = AlertRecord {
            id: "x".to_string(),
            title: "t".to_string(),
            kind: AlertKind::Bearish,
            timestamp: Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap(),
            source: "s".to_string(),
            is_live: false,
        };
        let v = serde_json::to_value(&alert).unwrap();
        assert_eq!(v["type"], "bearish");
    }
}
