pub mod armour_prune;
pub mod deco_prune;
pub mod prune;
pub mod search;
pub mod set_bonus;
pub mod slot_fill;
pub mod weapon_prune;

pub use armour_prune::PruneCache;
pub use search::{find_highest_efr_build, find_highest_efr_build_with_cache, SearchResult};

use crate::data::data_registry::Catalog;
use crate::data::search_params::SearchParameters;
use crate::error::Result;
use crate::parallel::coordinator::find_highest_efr_build_parallel_with_cache;

/// Where the weapon stage runs: on the calling thread or on a worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    Sequential,
    #[default]
    Parallel,
}

/// Runs the search in `mode`, sharing `cache` across calls.
pub fn optimize(
    params: &SearchParameters,
    catalog: &Catalog,
    mode: ExecutionMode,
    cache: &mut PruneCache,
) -> Result<Option<SearchResult>> {
    match mode {
        ExecutionMode::Sequential => find_highest_efr_build_with_cache(params, catalog, cache),
        ExecutionMode::Parallel => find_highest_efr_build_parallel_with_cache(params, catalog, cache),
    }
}
