use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use super::decoder::decode_crl;
use super::errors::CrlResult;
use super::fetcher::CrlFetcher;
use super::metrics::CrlMetrics;
use super::store::ConfigStore;
use super::types::{CrlFacts, DistributionPoint};

/// Outcome of one pass over the configured distribution points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Distribution points in the config snapshot used by the sweep
    pub attempted: usize,
    /// Distribution points whose metrics were updated
    pub updated: usize,
    /// Distribution points skipped because of a fetch or decode failure
    pub failed: usize,
    /// Series removed because their distribution point left the config
    pub pruned: usize,
}

/// Scheduler for periodic CRL sweeps.
///
/// Sweeps run on a fixed interval and right after every successful config
/// reload. Only one sweep runs at a time: a reload that arrives during a sweep
/// starts the next sweep once the current one is done.
pub struct CrlScheduler<F> {
    store: Arc<ConfigStore>,
    fetcher: Arc<F>,
    metrics: Arc<CrlMetrics>,
}

impl<F> CrlScheduler<F>
where
    F: CrlFetcher + Send + Sync + 'static,
{
    pub fn new(store: Arc<ConfigStore>, fetcher: Arc<F>, metrics: Arc<CrlMetrics>) -> Self {
        Self {
            store,
            fetcher,
            metrics,
        }
    }

    /// Refresh every distribution point of the current config once.
    ///
    /// The config is read once up front, so a reload during the sweep does not
    /// change which distribution points it covers. A failing distribution
    /// point keeps its previous metrics and does not affect the others.
    pub async fn sweep(&self) -> SweepReport {
        let config = self.store.current();

        let mut report = SweepReport {
            attempted: config.crls.len(),
            pruned: self.metrics.retain_configured(&config.crls),
            ..SweepReport::default()
        };

        if config.crls.is_empty() {
            warn!("No CRL distribution points configured");
            return report;
        }

        let mut join_set = JoinSet::new();
        for distribution_point in config.crls.iter().cloned() {
            let fetcher = Arc::clone(&self.fetcher);
            let metrics = Arc::clone(&self.metrics);

            join_set.spawn(async move {
                let result =
                    refresh_distribution_point(fetcher.as_ref(), &metrics, &distribution_point)
                        .await;
                (distribution_point, result)
            });
        }

        while let Some(task_result) = join_set.join_next().await {
            match task_result {
                Ok((distribution_point, Ok(facts))) => {
                    debug!(
                        "Updated CRL metrics for {}: generated {}, expires {}",
                        distribution_point, facts.generation_time, facts.expiration_time
                    );
                    report.updated += 1;
                }
                Ok((distribution_point, Err(e))) => {
                    warn!("Failed to refresh CRL from {}: {}", distribution_point, e);
                    report.failed += 1;
                }
                Err(e) => {
                    // Task panicked or was cancelled - this shouldn't happen in normal operation
                    error!("CRL refresh task failed to complete: {}", e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Run sweeps until `shutdown` resolves.
    ///
    /// The first sweep starts immediately. An in-flight sweep is abandoned on
    /// shutdown; metrics are rebuilt from scratch on the next start anyway.
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        let refresh_interval = self.store.refresh_interval();
        debug!(
            "Starting CRL scheduler with interval of {:?}",
            refresh_interval
        );

        let mut ticker = interval(refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => debug!("Running scheduled CRL sweep"),
                _ = self.store.reloaded() => info!("Config reloaded, running CRL sweep"),
            }

            tokio::select! {
                _ = &mut shutdown => break,
                report = self.sweep() => {
                    info!(
                        "CRL sweep complete: {} updated, {} failed, {} removed",
                        report.updated, report.failed, report.pruned
                    );
                }
            }
        }

        info!("CRL scheduler stopped");
    }
}

async fn refresh_distribution_point<F>(
    fetcher: &F,
    metrics: &CrlMetrics,
    distribution_point: &DistributionPoint,
) -> CrlResult<CrlFacts>
where
    F: CrlFetcher + ?Sized,
{
    let body = fetcher.fetch(distribution_point.as_str()).await?;
    let facts = decode_crl(&body)?;
    metrics.set(distribution_point, facts);
    Ok(facts)
}
