//! Parallel search over armour combination batches.
//!
//! Workers pull batches from the rayon queue and explore them against a
//! shared bound. A worker beating the bound sends the serialized build to the
//! coordinator, which rescores it from scratch and raises the bound for
//! everyone. The run ends when the channel closes, i.e. when every worker has
//! dropped its sender.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::build::Build;
use crate::data::data_registry::Catalog;
use crate::data::search_params::SearchParameters;
use crate::error::{Result, SearchError};
use crate::optimizer::armour_prune::PruneCache;
use crate::optimizer::search::{BestBound, PartialBuild, SearchPlan, SearchResult};
use crate::parallel::batch::{batches_of, interleaving_shuffle};
use crate::parallel::pool::WorkerPool;
use crate::parallel::progress::Progress;

/// Best EFR published to every worker, stored as `f64` bits.
#[derive(Debug, Default)]
pub struct SharedBound(AtomicU64);

impl SharedBound {
    pub fn new() -> Self {
        Self(AtomicU64::new(0f64.to_bits()))
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    /// Raises the bound to `value` unless it is already higher.
    pub fn raise(&self, value: f64) {
        let _ = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                (value > f64::from_bits(bits)).then_some(value.to_bits())
            });
    }
}

#[derive(Debug)]
enum WorkerMessage {
    Improved { serialized: String, efr: f64 },
}

struct WorkerBound<'a> {
    shared: &'a SharedBound,
    sender: &'a Sender<WorkerMessage>,
    catalog: &'a Catalog,
    local: f64,
}

impl BestBound for WorkerBound<'_> {
    fn current(&self) -> f64 {
        self.local.max(self.shared.get())
    }

    fn report(&mut self, found: SearchResult) -> Result<f64> {
        let serialized = found.build.serialize(self.catalog)?;
        self.sender
            .send(WorkerMessage::Improved {
                serialized,
                efr: found.efr,
            })
            .map_err(|_| SearchError::Worker("coordinator stopped listening".to_string()))?;
        self.local = self.local.max(found.efr);
        Ok(self.current())
    }
}

/// Runs the search on a worker pool sized by `params.tuning.workers`.
pub fn find_highest_efr_build_parallel(
    params: &SearchParameters,
    catalog: &Catalog,
) -> Result<Option<SearchResult>> {
    find_highest_efr_build_parallel_with_cache(params, catalog, &mut PruneCache::new())
}

pub fn find_highest_efr_build_parallel_with_cache(
    params: &SearchParameters,
    catalog: &Catalog,
    cache: &mut PruneCache,
) -> Result<Option<SearchResult>> {
    let plan = SearchPlan::prepare(params, catalog, cache)?;
    let mut combinations: Vec<PartialBuild> = plan.combinations.clone();
    for _ in 0..params.tuning.shuffle_rounds {
        combinations = interleaving_shuffle(combinations);
    }
    let batches: Vec<&[PartialBuild]> = batches_of(combinations.len(), params.tuning.batch_size)
        .into_iter()
        .map(|(start, end)| &combinations[start..end])
        .collect();

    let pool = WorkerPool::with_workers(params.tuning.workers);
    info!(
        workers = pool.effective_workers(),
        batches = batches.len(),
        "starting parallel search"
    );
    let progress =
        Progress::new("COMBINING WEAPONS -", combinations.len()).with_granularity(1000);
    let shared = SharedBound::new();
    let (sender, receiver) = mpsc::channel::<WorkerMessage>();

    let (workers_result, best) = thread::scope(|scope| {
        let plan = &plan;
        let batches = &batches;
        let shared = &shared;
        let progress = &progress;
        let workers = scope.spawn(move || {
            pool.install(move || {
                batches.par_iter().try_for_each_with(sender, |sender, batch| {
                    let mut bound = WorkerBound {
                        shared,
                        sender: &*sender,
                        catalog,
                        local: 0.0,
                    };
                    plan.explore(batch, &mut bound, Some(progress))
                })
            })
        });

        let best = coordinate(receiver, shared, plan);
        let joined = workers
            .join()
            .map_err(|_| SearchError::Worker("worker thread panicked".to_string()));
        (joined, best)
    });

    let best = best?;
    workers_result???;
    progress.finish();
    Ok(best)
}

/// Rescores every reported build and keeps the best. Returns once all
/// senders are gone.
fn coordinate(
    receiver: mpsc::Receiver<WorkerMessage>,
    shared: &SharedBound,
    plan: &SearchPlan<'_>,
) -> Result<Option<SearchResult>> {
    let catalog = plan.catalog();
    let mut best: Option<SearchResult> = None;
    for message in receiver {
        let WorkerMessage::Improved { serialized, efr } = message;
        let build = Build::deserialize(&serialized, catalog)?;
        let rescored = plan.score_in_scope(build)?;
        debug!(reported = efr, rescored = rescored.efr, "worker reported a build");
        if rescored.efr != efr {
            warn!(reported = efr, rescored = rescored.efr, "candidate score changed on rescoring");
        }
        if best.as_ref().map_or(true, |b| rescored.efr > b.efr) {
            shared.raise(rescored.efr);
            info!("{}", rescored.build.to_humanreadable(plan.pinned_states(), catalog)?);
            best = Some(rescored);
        }
    }
    Ok(best)
}
