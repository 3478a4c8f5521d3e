//! Concurrency helper: bounded-parallel map over one batch of records.

use rayon::prelude::*;

/// Apply `f` to every item with at most `limit` invocations in flight,
/// collecting one outcome per item in input order. Both record kinds run
/// through here: attachments with a worker pool, notes with `limit <= 1`,
/// which degrades to a plain sequential map. Outcomes never abort the
/// remaining items.
pub fn map_limited<T, R, F>(items: &[T], limit: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Sync + Fn(&T) -> R,
{
    if limit <= 1 {
        return items.iter().map(&f).collect();
    }
    let mut out = Vec::with_capacity(items.len());
    for chunk in items.chunks(limit) {
        out.extend(chunk.par_iter().map(&f).collect::<Vec<R>>());
    }
    out
}
