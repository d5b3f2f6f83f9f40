//! Dynamic Time Warping.
//!
//! Computes the minimum-cost monotonic alignment between two sequences of
//! possibly different lengths:
//!
//! ```text
//! cost[0][0] = 0
//! cost[i][0] = cost[0][j] = +∞            (i, j > 0)
//! cost[i][j] = d(a[i-1], b[j-1]) + min(cost[i-1][j], cost[i][j-1], cost[i-1][j-1])
//! ```
//!
//! The result is `cost[m][n]`.  Only two rows of the table are kept, each as
//! long as the shorter input, so memory is `O(min(m, n))` while time stays
//! `O(m · n)`.
//!
//! # Example
//!
//! ```rust
//! use kinesis_perception::dtw::dtw_distance;
//!
//! let a = [0.0_f32, 1.0, 2.0];
//! let b = [0.0_f32, 0.0, 1.0, 2.0];
//! let d = dtw_distance(&a, &b, |x, y| Ok((x - y).abs())).unwrap();
//! assert_eq!(d, 0.0);
//! ```

use kinesis_types::{JointWeights, KinesisError, Sequence};

use crate::distance::weighted_pose_distance;

/// DTW alignment cost between `a` and `b` under the pointwise `cost`.
///
/// `cost` is always called as `cost(&a[i], &b[j])`, whichever input ends up
/// spanning the rolling row.  The first error it returns aborts the
/// alignment.
///
/// # Errors
///
/// [`KinesisError::InvalidInput`] when either input is empty, or whatever
/// `cost` reports.
pub fn dtw_distance<T, F>(a: &[T], b: &[T], mut cost: F) -> Result<f32, KinesisError>
where
    F: FnMut(&T, &T) -> Result<f32, KinesisError>,
{
    if a.is_empty() || b.is_empty() {
        return Err(KinesisError::InvalidInput(
            "DTW requires two non-empty sequences".to_string(),
        ));
    }

    // The recurrence is symmetric under transposition, so the longer input
    // can always drive the outer loop.
    let transposed = a.len() < b.len();
    let (rows, cols) = if transposed { (b, a) } else { (a, b) };
    let n = cols.len();

    let mut prev = vec![f32::INFINITY; n + 1];
    let mut curr = vec![f32::INFINITY; n + 1];
    prev[0] = 0.0;

    for r in rows {
        curr[0] = f32::INFINITY;
        for j in 1..=n {
            let c = &cols[j - 1];
            let d = if transposed { cost(c, r)? } else { cost(r, c)? };
            curr[j] = d + prev[j].min(curr[j - 1]).min(prev[j - 1]);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    Ok(prev[n])
}

/// DTW between two pose sequences using [`weighted_pose_distance`] as the
/// pointwise cost.  Both sequences should already be normalised.
pub fn sequence_distance(
    a: &Sequence,
    b: &Sequence,
    weights: &JointWeights,
) -> Result<f32, KinesisError> {
    dtw_distance(a.frames(), b.frames(), |x, y| {
        weighted_pose_distance(x, y, weights)
    })
}
