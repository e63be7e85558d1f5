pub mod batch;
pub mod coordinator;
pub mod pool;
pub mod progress;

pub use batch::{batch_ranges, batches_of, interleaving_shuffle};
pub use coordinator::{find_highest_efr_build_parallel, find_highest_efr_build_parallel_with_cache};
pub use pool::WorkerPool;
pub use progress::Progress;
