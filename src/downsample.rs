//! Uniform index downsampling for rendering
//!
//! **Problem**: a long run logs tens of thousands of samples per series;
//! plotting all of them is slow and visually indistinguishable from a few
//! hundred.
//!
//! **Solution**: keep `max_points` evenly spaced *array positions* (not
//! evenly spaced step values), always including the first and last sample.
//! Position `i` of the output maps to `floor(i * (len - 1) / (max_points - 1))`.

use crate::reconcile::CombinedSeries;

/// Default point cap for rendered series.
pub const DEFAULT_MAX_POINTS: usize = 500;

/// Positions kept when reducing `len` samples to at most `max_points`.
///
/// Returns `0..len` when `len <= max_points`. Positions are strictly
/// increasing, so the output length is exactly `min(len, max_points)`.
///
/// # Examples
///
/// ```rust
/// use runlens::downsample::sample_indices;
///
/// assert_eq!(sample_indices(10, 4), vec![0, 3, 6, 9]);
/// assert_eq!(sample_indices(3, 500), vec![0, 1, 2]);
/// ```
#[must_use]
pub fn sample_indices(len: usize, max_points: usize) -> Vec<usize> {
    if len <= max_points {
        return (0..len).collect();
    }
    match max_points {
        0 => Vec::new(),
        1 => vec![0],
        // u128 keeps i * (len - 1) from overflowing on 32-bit targets
        _ => (0..max_points)
            .map(|i| {
                let scaled = (i as u128 * (len - 1) as u128) / (max_points - 1) as u128;
                usize::try_from(scaled).unwrap_or(len - 1)
            })
            .collect(),
    }
}

/// Reduce paired arrays to at most `max_points` samples.
///
/// Identity when `xs.len() <= max_points`.
///
/// # Panics
///
/// Panics if `xs` and `ys` differ in length; that is a caller bug, not run
/// data.
#[must_use]
pub fn reduce<X: Clone, Y: Clone>(xs: &[X], ys: &[Y], max_points: usize) -> (Vec<X>, Vec<Y>) {
    assert_eq!(xs.len(), ys.len(), "downsample inputs must have equal length");
    sample_indices(xs.len(), max_points)
        .into_iter()
        .map(|i| (xs[i].clone(), ys[i].clone()))
        .unzip()
}

/// Reduce the rows of a combined series to at most `max_points`.
#[must_use]
pub fn reduce_combined(series: &CombinedSeries, max_points: usize) -> CombinedSeries {
    if series.len() <= max_points {
        return series.clone();
    }
    series.select_rows(&sample_indices(series.len(), max_points))
}
