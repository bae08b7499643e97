use crate::config::Settings;
use std::sync::Arc;

pub mod alerts;
pub mod batch;
pub mod quotes;

pub use alerts::AlertService;
pub use batch::BatchCoordinator;
pub use quotes::{QuoteOutcome, QuoteService};

/// The market-data services a binary needs, built once from settings and shared by handle.
#[derive(Clone)]
pub struct MarketServices {
    pub quotes: Arc<QuoteService>,
    pub batch: BatchCoordinator,
    pub alerts: Arc<AlertService>,
}

impl MarketServices {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let quotes = Arc::new(QuoteService::from_settings(settings)?);
        let alerts = Arc::new(AlertService::from_settings(settings)?);
        Ok(Self {
            batch: BatchCoordinator::new(Arc::clone(&quotes)),
            quotes,
            alerts,
        })
    }
}
