use std::ops::Range;

pub const DEFAULT_TAIL_FRACTION: f64 = 0.05;

/// Index range of the last `floor(fraction * len)` records.
pub fn tail_range(len: usize, fraction: f64) -> Range<usize> {
    let take = ((fraction * len as f64).floor() as usize).min(len);
    (len - take)..len
}
