use crate::domain::quote::QuoteRecord;
use crate::llm::TextPrompt;
use crate::report::sector::Sector;

fn system_prompt() -> String {
    [
        "You are an equity research analyst writing a concise stock analysis report.",
        "Write plain prose under these headers, each on its own line:",
        "EXECUTIVE SUMMARY:",
        "MARKET POSITION:",
        "TECHNICAL ANALYSIS:",
        "FUNDAMENTAL ANALYSIS:",
        "RECOMMENDATION:",
        "RISK FACTORS:",
        "Rules:",
        "- RECOMMENDATION must state one of STRONG BUY, BUY, HOLD, SELL, STRONG SELL",
        "- state a target price as 'Target price: $NNN.NN'",
        "- describe the trend as bullish, bearish or neutral",
        "- give support and resistance levels with a $ sign",
        "- list up to 5 risk factors, one per line, starting with '- '",
    ]
    .join("\n")
}

fn user_prompt(quote: &QuoteRecord, sector: Option<Sector>) -> String {
    let data_note = if quote.is_live {
        format!("live data from {}", quote.source)
    } else {
        "simulated data; live providers were unavailable".to_string()
    };
    format!(
        "Task: Write an analysis report for {symbol}{sector}.\n\n\
Current quote ({data_note}):\n\
- price: ${price:.2}\n\
- change: {change:+.2} ({change_percent:+.2}%)\n\
- open: ${open:.2}, high: ${high:.2}, low: ${low:.2}\n\
- previous close: ${previous_close:.2}\n\
- volume: {volume}\n\
- as of: {timestamp}",
        symbol = quote.symbol,
        sector = sector
            .map(|s| format!(" ({} sector)", s.name()))
            .unwrap_or_default(),
        price = quote.price,
        change = quote.change,
        change_percent = quote.change_percent,
        open = quote.open,
        high = quote.high,
        low = quote.low,
        previous_close = quote.previous_close,
        volume = quote.volume,
        timestamp = quote.timestamp.to_rfc3339(),
    )
}

pub fn analysis_prompt(quote: &QuoteRecord, sector: Option<Sector>) -> TextPrompt {
    TextPrompt {
        system: system_prompt(),
        user: user_prompt(quote, sector),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::simulated_quote;
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn prompt_carries_quote_and_sector() {
        let quote = simulated_quote(
            "NVDA",
            &mut StdRng::seed_from_u64(2),
            Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap(),
        );
        let prompt = analysis_prompt(&quote, Sector::for_symbol("NVDA"));
        assert!(prompt.system.contains("RISK FACTORS:"));
        assert!(prompt.user.contains("NVDA (Technology sector)"));
        assert!(prompt.user.contains("simulated data"));
        assert!(prompt.user.contains(&format!("${:.2}", quote.price)));
    }
}
