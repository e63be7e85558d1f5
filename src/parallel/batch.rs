//! Work splitting for the parallel search.
//!
//! Armour combinations come out of the slot-by-slot stage roughly grouped by
//! charm and head piece. [interleaving_shuffle] spreads neighbours apart so
//! early batches sample the whole space, and [batch_ranges] cuts the result
//! into contiguous batches for the worker queue.

const MAX_PARTITIONS: usize = 8;
const ITEMS_PER_PARTITION: usize = 32;

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Batches are as equal in size as possible; later batches may be smaller.
///
/// # Example
/// ```
/// # use mhwi_build_search::parallel::batch_ranges;
/// let ranges = batch_ranges(100, 4);
/// assert_eq!(ranges, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
/// ```
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = num_batches.min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut ranges = Vec::with_capacity(num_batches);
    let mut start = 0;
    for i in 0..num_batches {
        let size = base + if i < remainder { 1 } else { 0 };
        let end = start + size;
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// Ranges of at most `batch_size` items covering `total`.
pub fn batches_of(total: usize, batch_size: usize) -> Vec<(usize, usize)> {
    let batch_size = batch_size.max(1);
    batch_ranges(total, total.div_ceil(batch_size))
}

/// Deterministic reordering: split into `min(len / 32, 8)` contiguous
/// partitions (at least one) and take one item from each in turn.
///
/// # Example
/// ```
/// # use mhwi_build_search::parallel::interleaving_shuffle;
/// let items: Vec<u32> = (0..64).collect();
/// let shuffled = interleaving_shuffle(items);
/// assert_eq!(&shuffled[..4], &[0, 32, 1, 33]);
/// ```
pub fn interleaving_shuffle<T>(items: Vec<T>) -> Vec<T> {
    let len = items.len();
    let partitions = (len / ITEMS_PER_PARTITION).clamp(1, MAX_PARTITIONS);
    let partition_size = len.div_ceil(partitions).max(1);

    let mut queues: Vec<std::vec::IntoIter<T>> = Vec::with_capacity(partitions);
    let mut rest = items;
    while !rest.is_empty() {
        let tail = rest.split_off(partition_size.min(rest.len()));
        queues.push(rest.into_iter());
        rest = tail;
    }

    let mut shuffled = Vec::with_capacity(len);
    for _ in 0..partition_size {
        for queue in queues.iter_mut() {
            if let Some(item) = queue.next() {
                shuffled.push(item);
            }
        }
    }
    shuffled
}
