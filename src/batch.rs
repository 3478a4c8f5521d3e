//! Order-preserving fixed-size batching over a materialized id sequence.

/// Split `items` into contiguous chunks of `batch_size`; the last chunk
/// may be shorter. Deterministic: same input order, same batches. The
/// input must already be materialized; the returned slices borrow from it.
///
/// A `batch_size` of zero is a contract violation and panics.
pub fn split_into_batches<T>(items: &[T], batch_size: usize) -> Vec<&[T]> {
    assert!(batch_size > 0, "batch_size must be positive");
    items.chunks(batch_size).collect()
}
