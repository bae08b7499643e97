use crate::domain::quote::{normalize_symbol, BatchItem};
use crate::market::quotes::{simulate_now, QuoteService};
use std::sync::Arc;

/// Fans a symbol list out over the quote service, one task per symbol, and waits for every task.
/// A task that dies is replaced by a simulated quote; it never takes its siblings down.
#[derive(Clone)]
pub struct BatchCoordinator {
    quotes: Arc<QuoteService>,
}

impl BatchCoordinator {
    pub fn new(quotes: Arc<QuoteService>) -> Self {
        Self { quotes }
    }

    /// One item per input symbol, in input order.
    pub async fn get_batch(&self, symbols: &[String]) -> Vec<BatchItem> {
        let handles: Vec<_> = symbols
            .iter()
            .map(|symbol| {
                let quotes = Arc::clone(&self.quotes);
                let symbol = symbol.clone();
                tokio::spawn(async move { quotes.fetch(&symbol).await })
            })
            .collect();

        let mut items = Vec::with_capacity(handles.len());
        for (symbol, handle) in symbols.iter().zip(handles) {
            let symbol = normalize_symbol(symbol);
            let item = match handle.await {
                Ok(outcome) => BatchItem {
                    symbol,
                    data: outcome.quote,
                    error: outcome.warning,
                },
                Err(err) => {
                    tracing::error!(%symbol, error = %err, "quote task failed; substituting simulated quote");
                    BatchItem {
                        data: simulate_now(&symbol),
                        error: Some(format!("quote task failed: {err}")),
                        symbol,
                    }
                }
            };
            items.push(item);
        }

        let simulated = items.iter().filter(|i| i.error.is_some()).count();
        tracing::info!(
            requested = symbols.len(),
            simulated,
            "batch quotes complete"
        );
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::quotes::tests::FakeQuoteProvider;
    use std::time::Duration;

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn returns_one_item_per_symbol_in_order_without_providers() {
        let quotes = Arc::new(QuoteService::new(Vec::new(), Duration::from_secs(60)));
        let batch = BatchCoordinator::new(quotes);

        let items = batch.get_batch(&symbols(&["AAPL", "ZZZZ"])).await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].symbol, "AAPL");
        assert_eq!(items[1].symbol, "ZZZZ");
        assert_eq!(items[0].data.symbol, "AAPL");
        assert_eq!(items[1].data.symbol, "ZZZZ");
        assert!(items.iter().all(|i| !i.data.is_live && i.error.is_some()));
    }

    #[tokio::test]
    async fn live_items_carry_no_error() {
        let quotes = Arc::new(QuoteService::new(
            vec![Box::new(FakeQuoteProvider::ok("live", 42.0))],
            Duration::from_secs(60),
        ));
        let items = BatchCoordinator::new(quotes)
            .get_batch(&symbols(&["msft", "nvda"]))
            .await;

        assert!(items.iter().all(|i| i.data.is_live && i.error.is_none()));
        assert_eq!(items[0].symbol, "MSFT");
    }

    #[tokio::test]
    async fn panicking_task_is_isolated() {
        let quotes = Arc::new(QuoteService::new(
            vec![Box::new(FakeQuoteProvider::ok("live", 42.0))],
            Duration::from_secs(60),
        ));
        let items = BatchCoordinator::new(quotes)
            .get_batch(&symbols(&["AAPL", "BOOM", "TSLA"]))
            .await;

        assert_eq!(items.len(), 3);
        assert!(items[0].data.is_live);
        assert!(!items[1].data.is_live);
        assert!(items[1]
            .error
            .as_deref()
            .unwrap()
            .starts_with("quote task failed"));
        assert!(items[2].data.is_live);
    }

    #[tokio::test]
    async fn empty_input_gives_empty_output() {
        let quotes = Arc::new(QuoteService::new(Vec::new(), Duration::from_secs(60)));
        assert!(BatchCoordinator::new(quotes).get_batch(&[]).await.is_empty());
    }
}
