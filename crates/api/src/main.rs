use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketpulse_core::domain::alert::AlertRecord;
use marketpulse_core::domain::quote::{BatchItem, QuoteRecord};
use marketpulse_core::domain::report::AnalysisReport;
use marketpulse_core::llm::anthropic::AnthropicClient;
use marketpulse_core::market::MarketServices;
use marketpulse_core::report::{ReportError, ReportService};
use marketpulse_core::time::format_time_ago;

const MAX_BATCH_SYMBOLS: usize = 50;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = marketpulse_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let market = MarketServices::from_settings(&settings)?;

    let reports = match AnthropicClient::from_settings_optional(&settings) {
        Ok(Some(client)) => Some(Arc::new(ReportService::new(
            Arc::clone(&market.quotes),
            Arc::new(client),
        ))),
        Ok(None) => {
            tracing::warn!("ANTHROPIC_API_KEY missing; report generation unavailable");
            None
        }
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "text generator init failed; report generation unavailable");
            None
        }
    };

    let state = AppState { market, reports };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/quotes", get(get_batch_quotes))
        .route("/quotes/:symbol", get(get_quote))
        .route("/alerts", get(get_alerts))
        .route("/reports/:symbol", get(get_report))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    market: MarketServices,
    reports: Option<Arc<ReportService>>,
}

#[derive(Debug, Serialize)]
struct ApiQuote {
    #[serde(flatten)]
    quote: QuoteRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApiAlert {
    #[serde(flatten)]
    alert: AlertRecord,
    time_ago: String,
}

#[derive(Debug, Deserialize)]
struct BatchParams {
    symbols: Option<String>,
}

async fn get_quote(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiQuote>, StatusCode> {
    if symbol.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let outcome = state.market.quotes.fetch(&symbol).await;
    Ok(Json(ApiQuote {
        quote: outcome.quote,
        warning: outcome.warning,
    }))
}

async fn get_batch_quotes(
    State(state): State<AppState>,
    Query(params): Query<BatchParams>,
) -> Result<Json<Vec<BatchItem>>, StatusCode> {
    let symbols = parse_symbols(params.symbols.as_deref().unwrap_or_default());
    if symbols.is_empty() || symbols.len() > MAX_BATCH_SYMBOLS {
        return Err(StatusCode::BAD_REQUEST);
    }

    Ok(Json(state.market.batch.get_batch(&symbols).await))
}

async fn get_alerts(State(state): State<AppState>) -> Json<Vec<ApiAlert>> {
    let now = Utc::now();
    let alerts = state
        .market
        .alerts
        .get_alerts()
        .await
        .into_iter()
        .map(|alert| ApiAlert {
            time_ago: format_time_ago(alert.timestamp, now),
            alert,
        })
        .collect();
    Json(alerts)
}

async fn get_report(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<AnalysisReport>, StatusCode> {
    let Some(reports) = &state.reports else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };
    if symbol.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    match reports.generate(&symbol).await {
        Ok(report) => Ok(Json(report)),
        Err(e @ ReportError::NoSourceText { .. }) => {
            let err = anyhow::Error::new(e);
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(%symbol, error = %err, "report generation failed");
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
