/// Half-open index bounds `[low, high)` into a key or record collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdxRange {
    /// Inclusive lower bound
    pub low: usize,
    /// Exclusive upper bound
    pub high: usize,
}

/// Provider hard limit on items per batch-get or batch-write call.
pub const BATCH_ITEM_LIMIT: usize = 25;

/// Splits a collection of `len` elements into ordered ranges of at most
/// `size` elements, covering `[0, len)` with no gaps or overlaps. The final
/// range may be shorter. A `size` of zero yields no ranges.
///
/// Each range is produced exactly once, so the sequence can be handed out as
/// a work queue across dispatchers.
pub fn partition(len: usize, size: usize) -> impl Iterator<Item = IdxRange> {
    let count = if size == 0 { 0 } else { len.div_ceil(size) };

    (0..count).map(move |i| IdxRange {
        low: i * size,
        high: ((i + 1) * size).min(len),
    })
}
