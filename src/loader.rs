//! Progressive loader
//!
//! Fetches metrics for a collection of spots in consecutive batches. All
//! fetches of a batch run concurrently and are awaited together; after each
//! batch that issued at least one fetch, a snapshot of the full collection is
//! published. Every run is tagged with a generation and abandons itself as
//! soon as the active generation moves on.
//!
//! [`ProgressiveLoader::spawn`] runs a load on its own task so the caller can
//! keep handling view transitions; snapshots arrive on the returned
//! [`LoadHandle`].

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::climate::ClimateSource;
use crate::config::LoaderConfig;
use crate::metrics::{SolarMetrics, fetch_solar_metrics};
use crate::models::{Coordinates, SolarSpot};

/// Upper bound on simultaneous upstream calls
pub const MAX_CONCURRENT_REQUESTS: usize = 5;

/// Tag identifying one view-mode collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    #[must_use]
    pub fn initial() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether spots that failed are fetched again by a later run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// A failed spot keeps its failed status until the collection is replaced
    #[default]
    Never,
    /// Failed spots get one new attempt on each subsequent run
    OnReload,
}

/// Full collection state after one batch
#[derive(Debug, Clone)]
pub struct LoadSnapshot {
    pub generation: Generation,
    pub batch_index: usize,
    pub spots: Vec<SolarSpot>,
}

impl LoadSnapshot {
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.spots.iter().filter(|spot| spot.is_loaded()).count()
    }
}

/// Outcome of one loader run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub generation: Generation,
    /// Upstream calls issued
    pub fetched: usize,
    pub loaded: usize,
    pub failed: usize,
    pub snapshots: usize,
    /// The run stopped because a newer generation became active
    pub superseded: bool,
}

#[derive(Clone)]
pub struct ProgressiveLoader {
    source: Arc<dyn ClimateSource>,
    batch_size: usize,
    retry_policy: RetryPolicy,
}

impl ProgressiveLoader {
    #[must_use]
    pub fn new(source: Arc<dyn ClimateSource>, config: &LoaderConfig) -> Self {
        Self {
            source,
            batch_size: config.batch_size.clamp(1, MAX_CONCURRENT_REQUESTS),
            retry_policy: config.retry_failed,
        }
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn should_fetch(&self, spot: &SolarSpot) -> bool {
        if spot.is_pending() {
            return true;
        }
        spot.is_failed() && self.retry_policy == RetryPolicy::OnReload
    }

    /// Load every spot that still needs it and publish a snapshot per batch.
    ///
    /// Fetch failures mark the spot failed and are never returned. Nothing is
    /// published once `active` holds a generation other than `generation`.
    #[instrument(skip(self, spots, active, publish), fields(generation = generation.value(), spots = spots.len()))]
    pub async fn run<F>(
        &self,
        generation: Generation,
        mut spots: Vec<SolarSpot>,
        active: &watch::Receiver<Generation>,
        mut publish: F,
    ) -> LoadSummary
    where
        F: FnMut(LoadSnapshot),
    {
        let mut summary = LoadSummary {
            generation,
            ..LoadSummary::default()
        };
        let indices: Vec<usize> = (0..spots.len()).collect();

        for (batch_index, batch) in indices.chunks(self.batch_size).enumerate() {
            if is_superseded(generation, active) {
                debug!("Generation {} superseded before batch {}", generation, batch_index);
                summary.superseded = true;
                return summary;
            }

            let targets: Vec<usize> = batch
                .iter()
                .copied()
                .filter(|&index| self.should_fetch(&spots[index]))
                .collect();
            if targets.is_empty() {
                continue;
            }

            let source = self.source.as_ref();
            let fetches: Vec<_> = targets
                .iter()
                .map(|&index| fetch_indexed(source, index, spots[index].location.coordinates))
                .collect();
            let results = join_all(fetches).await;
            summary.fetched += targets.len();

            if is_superseded(generation, active) {
                debug!("Generation {} superseded during batch {}", generation, batch_index);
                summary.superseded = true;
                return summary;
            }

            for (index, result) in results {
                let spot = &mut spots[index];
                match result {
                    Ok(metrics) => {
                        spot.enrich(metrics);
                        summary.loaded += 1;
                    }
                    Err(e) => {
                        warn!("Failed to load metrics for {}: {}", spot.name(), e);
                        spot.mark_failed();
                        summary.failed += 1;
                    }
                }
            }

            publish(LoadSnapshot {
                generation,
                batch_index,
                spots: spots.clone(),
            });
            summary.snapshots += 1;
        }

        info!(
            "Generation {} finished: {} fetched, {} loaded, {} failed",
            generation, summary.fetched, summary.loaded, summary.failed
        );
        summary
    }

    /// Start a run on its own task.
    ///
    /// The returned handle yields the snapshots as they are published; the
    /// run keeps going if the handle is dropped until `active` moves on.
    #[must_use]
    pub fn spawn(
        &self,
        generation: Generation,
        spots: Vec<SolarSpot>,
        active: watch::Receiver<Generation>,
    ) -> LoadHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let loader = self.clone();
        let task = tokio::spawn(async move {
            loader
                .run(generation, spots, &active, |snapshot| {
                    // A closed receiver only means nobody applies this load anymore
                    let _ = tx.send(snapshot);
                })
                .await
        });
        LoadHandle {
            generation,
            snapshots: rx,
            task,
        }
    }
}

/// A load running in the background
pub struct LoadHandle {
    generation: Generation,
    snapshots: mpsc::UnboundedReceiver<LoadSnapshot>,
    task: JoinHandle<LoadSummary>,
}

impl LoadHandle {
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Next published snapshot, `None` once the run has ended
    pub async fn next_snapshot(&mut self) -> Option<LoadSnapshot> {
        self.snapshots.recv().await
    }

    /// Wait for the run to end and return its summary
    pub async fn finish(self) -> LoadSummary {
        let generation = self.generation;
        match self.task.await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Load for generation {} did not complete: {}", generation, e);
                LoadSummary {
                    generation,
                    superseded: true,
                    ..LoadSummary::default()
                }
            }
        }
    }
}

async fn fetch_indexed(
    source: &dyn ClimateSource,
    index: usize,
    coordinates: Coordinates,
) -> (usize, Result<SolarMetrics>) {
    (index, fetch_solar_metrics(source, coordinates).await)
}

fn is_superseded(generation: Generation, active: &watch::Receiver<Generation>) -> bool {
    *active.borrow() != generation
}
