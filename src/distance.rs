//! Distance strategies, selected once at construction.

/// Distance function over two equal-shape points.
///
/// `Absolute` reports the true 1-D distance. The Euclidean variants report
/// the **squared** distance (no square root): squared distance is monotonic
/// with true distance, so ordering is unaffected, and the reported magnitude
/// deliberately stays in squared units.
///
/// The 2-D and 3-D variants are unrolled specialisations of the generic
/// fold; they are functionally identical to `EuclideanN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Metric {
    Absolute,
    Euclidean2,
    Euclidean3,
    EuclideanN,
}

impl Metric {
    /// Selects the strategy for the given dimensionality.
    pub(crate) fn for_dimensions(dims: usize) -> Self {
        match dims {
            1 => Metric::Absolute,
            2 => Metric::Euclidean2,
            3 => Metric::Euclidean3,
            // Also covers the degenerate 0-dimensional case: the fold over
            // zero components yields 0.0 rather than indexing out of bounds.
            _ => Metric::EuclideanN,
        }
    }

    /// Evaluates the distance between two rows of this metric's shape.
    pub(crate) fn eval(self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Metric::Absolute => abs_diff_1d(a[0], b[0]),
            Metric::Euclidean2 => sq_dist_2d(a, b),
            Metric::Euclidean3 => sq_dist_3d(a, b),
            Metric::EuclideanN => sq_dist_nd(a, b),
        }
    }
}

#[inline]
fn abs_diff_1d(a: f64, b: f64) -> f64 {
    (a - b).abs()
}

#[inline]
fn sq_dist_2d(a: &[f64], b: &[f64]) -> f64 {
    let d0 = a[0] - b[0];
    let d1 = a[1] - b[1];
    d0 * d0 + d1 * d1
}

#[inline]
fn sq_dist_3d(a: &[f64], b: &[f64]) -> f64 {
    let d0 = a[0] - b[0];
    let d1 = a[1] - b[1];
    let d2 = a[2] - b[2];
    d0 * d0 + d1 * d1 + d2 * d2
}

#[inline]
fn sq_dist_nd(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
