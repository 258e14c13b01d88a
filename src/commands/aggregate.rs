//! The `agg` command.

use futures::future::BoxFuture;

use super::{require_args, App, Command};
use crate::feed::{parse_interval, Aggregator, Ingestor};
use crate::Result;

/// `agg <interval>`: fetch every feed once, waiting `interval` between feeds.
pub struct Agg;

impl Command for Agg {
    fn usage(&self) -> &'static str {
        "agg <interval>"
    }

    fn description(&self) -> &'static str {
        "Fetch all feeds, e.g. agg 1m30s"
    }

    fn run<'a>(&'a self, app: &'a App, args: &'a [String]) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            require_args(args, 1, self.usage())?;
            let interval = parse_interval(&args[0])?;

            let aggregator = Aggregator::new(
                Ingestor::new(&app.db, &app.fetcher),
                interval,
                app.config.aggregator.on_fetch_error,
            );
            let summary = aggregator.run().await?;

            let mut out = format!(
                "Collected {} feed(s): {} new post(s), {} duplicate(s), {} failed item(s)",
                summary.feeds_processed,
                summary.totals.inserted,
                summary.totals.duplicates,
                summary.totals.failed
            );
            if summary.feeds_failed > 0 {
                out.push_str(&format!("\nSkipped {} failing feed(s)", summary.feeds_failed));
            }
            Ok(out)
        })
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::commands::tests::{args, test_app};
    use crate::FeedmillError;

    #[tokio::test]
    async fn test_agg_invalid_interval_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir).await;

        let result = Agg.run(&app, &args(&["soon"])).await;
        assert!(matches!(result, Err(FeedmillError::Config(msg)) if msg.contains("soon")));

        let usage = Agg.run(&app, &[]).await.unwrap_err();
        assert!(usage.to_string().contains("usage: agg <interval>"));
    }

    #[tokio::test]
    async fn test_agg_without_feeds() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir).await;

        let out = Agg.run(&app, &args(&["0"])).await.unwrap();
        assert_eq!(
            out,
            "Collected 0 feed(s): 0 new post(s), 0 duplicate(s), 0 failed item(s)"
        );
    }
}
