use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketpulse_core::domain::alert::AlertRecord;
use marketpulse_core::llm::anthropic::AnthropicClient;
use marketpulse_core::market::MarketServices;
use marketpulse_core::report::ReportService;
use marketpulse_core::time::format_time_ago;

#[derive(Debug, Parser)]
#[command(name = "marketpulse", about = "Quotes, alerts and analysis reports")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Latest quote for one symbol. Falls back to simulated data when no provider answers.
    Quote { symbol: String },

    /// Quotes for several symbols fetched concurrently, in input order.
    Batch {
        #[arg(required = true)]
        symbols: Vec<String>,
    },

    /// Up to ten recent market alerts, newest first.
    Alerts,

    /// Analysis report for one symbol. Requires ANTHROPIC_API_KEY.
    Report { symbol: String },
}

#[derive(Debug, Serialize)]
struct CliAlert {
    #[serde(flatten)]
    alert: AlertRecord,
    time_ago: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = marketpulse_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    // stdout carries the JSON result; logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(args.command, &settings).await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "command failed");
        return Err(err);
    }
    Ok(())
}

async fn run(command: Command, settings: &marketpulse_core::config::Settings) -> anyhow::Result<()> {
    let market = MarketServices::from_settings(settings)?;

    match command {
        Command::Quote { symbol } => {
            let outcome = market.quotes.fetch(&symbol).await;
            if let Some(warning) = &outcome.warning {
                tracing::warn!(%symbol, %warning, "live quote unavailable; printed simulated data");
            }
            print_json(&outcome.quote)
        }
        Command::Batch { symbols } => print_json(&market.batch.get_batch(&symbols).await),
        Command::Alerts => {
            let now = chrono::Utc::now();
            let alerts: Vec<CliAlert> = market
                .alerts
                .get_alerts()
                .await
                .into_iter()
                .map(|alert| CliAlert {
                    time_ago: format_time_ago(alert.timestamp, now),
                    alert,
                })
                .collect();
            print_json(&alerts)
        }
        Command::Report { symbol } => {
            let generator = AnthropicClient::from_settings_optional(settings)?
                .context("report generation unavailable: ANTHROPIC_API_KEY is not set")?;
            let service = ReportService::new(Arc::clone(&market.quotes), Arc::new(generator));
            let report = service.generate(&symbol).await?;
            print_json(&report)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}

fn init_sentry(settings: &marketpulse_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands() {
        let args = Args::try_parse_from(["marketpulse", "batch", "AAPL", "zzzz"]).unwrap();
        match args.command {
            Command::Batch { symbols } => assert_eq!(symbols, vec!["AAPL", "zzzz"]),
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Args::try_parse_from(["marketpulse", "batch"]).is_err());
        assert!(matches!(
            Args::try_parse_from(["marketpulse", "alerts"]).unwrap().command,
            Command::Alerts
        ));
    }
}
