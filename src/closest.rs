//! Nearest-match engine: linear scan, memoization, consume-once tracking.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::distance::Metric;
use crate::error::ClosestError;
use crate::key::QueryKey;
use crate::point::{Point, Shape};
use crate::result::Match;

/// Indices already returned in consume-once mode.
///
/// Fixed-size mask over `0..n` with an element count, so membership and
/// exhaustion checks are O(1).
#[derive(Debug, Clone)]
struct ReturnedIndexes {
    mask: Vec<bool>,
    count: usize,
}

impl ReturnedIndexes {
    fn new(n: usize) -> Self {
        Self {
            mask: vec![false; n],
            count: 0,
        }
    }

    fn contains(&self, index: usize) -> bool {
        self.mask[index]
    }

    fn mark(&mut self, index: usize) {
        if !self.mask[index] {
            self.mask[index] = true;
            self.count += 1;
        }
    }

    fn len(&self) -> usize {
        self.count
    }

    fn clear(&mut self) {
        self.mask.fill(false);
        self.count = 0;
    }
}

/// Nearest-match engine over an immutable reference list.
///
/// Finds the list entry closest to a query under the absolute difference
/// (scalar lists) or the squared Euclidean distance (vector lists). Two
/// modes:
///
/// - **Plain** (`unique = false`): every query is answered from the full
///   list; exact-repeat queries are served from a memoization cache.
/// - **Consume-once** (`unique = true`): each list index is returned at most
///   once. After all `n` entries have been matched, [`get`](Closest::get)
///   yields `None` until [`clear_cache`](Closest::clear_cache) resets the
///   tracker.
///
/// Ties always resolve to the lowest index.
///
/// # Example
///
/// ```
/// use closest::Closest;
///
/// // Greedy one-to-one assignment: each entry is matched at most once.
/// let mut engine = Closest::new([1.0, 2.0, 3.0], true).unwrap();
/// assert_eq!(engine.get(1.0).unwrap().unwrap().index(), 0);
/// assert_eq!(engine.get(1.0).unwrap().unwrap().index(), 1);
/// assert_eq!(engine.get(1.0).unwrap().unwrap().index(), 2);
/// assert!(engine.get(1.0).unwrap().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Closest {
    /// Reference values, row-major, `len × dims`.
    rows: Vec<f64>,
    /// Number of reference entries.
    len: usize,
    /// Shape of every entry, fixed by the first element.
    shape: Shape,
    /// Distance strategy selected for `shape` at construction.
    metric: Metric,
    /// Consume-once mode flag.
    unique: bool,
    /// Memoized results by canonical query key. Unused in unique mode.
    cache: HashMap<QueryKey, Match>,
    /// Consume-once tracker. Unused in plain mode.
    returned: ReturnedIndexes,
}

impl Closest {
    /// Creates an engine over `list`.
    ///
    /// The first element fixes the dimensionality and selects the distance
    /// strategy; the list is then snapshotted into row-major storage and
    /// never changes.
    ///
    /// # Errors
    ///
    /// Returns [`ClosestError::EmptyReferenceList`] if `list` has no
    /// elements, or [`ClosestError::NonUniformList`] if any element's
    /// dimensionality differs from the first element's.
    pub fn new<I, P>(list: I, unique: bool) -> Result<Self, ClosestError>
    where
        I: IntoIterator<Item = P>,
        P: Into<Point>,
    {
        let points: Vec<Point> = list.into_iter().map(Into::into).collect();
        let Some(first) = points.first() else {
            return Err(ClosestError::EmptyReferenceList);
        };

        let shape = Shape::of(first);
        let dims = shape.dimensions();
        let mut rows = Vec::with_capacity(points.len() * dims);
        for (index, point) in points.iter().enumerate() {
            if point.dimensions() != dims {
                return Err(ClosestError::NonUniformList {
                    index,
                    dimensions: point.dimensions(),
                    expected: dims,
                });
            }
            rows.extend_from_slice(point.components());
        }

        let len = points.len();
        debug!(len, dims, unique, "engine constructed");
        Ok(Self {
            rows,
            len,
            shape,
            metric: Metric::for_dimensions(dims),
            unique,
            cache: HashMap::new(),
            returned: ReturnedIndexes::new(len),
        })
    }

    /// Returns the nearest reference entry to `query`.
    ///
    /// `Ok(None)` is returned only by a consume-once engine whose entries
    /// are all spent; a plain engine always matches.
    ///
    /// # Errors
    ///
    /// Returns [`ClosestError::DimensionMismatch`] if the query's
    /// dimensionality differs from the reference list's.
    pub fn get<P: Into<Point>>(&mut self, query: P) -> Result<Option<Match>, ClosestError> {
        let query = query.into();
        if query.dimensions() != self.dimensions() {
            return Err(ClosestError::DimensionMismatch {
                query: query.dimensions(),
                expected: self.dimensions(),
            });
        }

        if self.unique {
            return Ok(self.take_nearest(&query));
        }

        // Exact-repeat queries skip the scan entirely.
        let key = QueryKey::new(query.components());
        if let Some(hit) = self.cache.get(&key) {
            trace!(index = hit.index(), "cache hit");
            return Ok(Some(hit.clone()));
        }

        let Some(result) = self.scan(&query, false) else {
            // Construction guarantees a non-empty list, so an unrestricted
            // scan always yields a winner.
            return Ok(None);
        };
        self.cache.insert(key, result.clone());
        Ok(Some(result))
    }

    /// Consume-once lookup: scans only unreturned indices and marks the
    /// winner. Results are never cached here — the same query value can
    /// legitimately match different indices across calls.
    fn take_nearest(&mut self, query: &Point) -> Option<Match> {
        if self.returned.len() == self.len {
            debug!(len = self.len, "reference list exhausted");
            return None;
        }

        let result = self.scan(query, true)?;
        self.returned.mark(result.index());
        trace!(
            index = result.index(),
            remaining = self.remaining(),
            "entry consumed"
        );
        Some(result)
    }

    /// Linear scan over eligible rows; `skip_returned` applies the
    /// consume-once mask.
    fn scan(&self, query: &Point, skip_returned: bool) -> Option<Match> {
        let mut best: Option<(usize, f64)> = None;
        for index in 0..self.len {
            if skip_returned && self.returned.contains(index) {
                continue;
            }
            let distance = self.metric.eval(query.components(), self.row(index));
            // Strict less-than under the IEEE total order: the lowest index
            // keeps every tie, and NaN distances rank after everything else.
            let better = match best {
                None => true,
                Some((_, min)) => distance.total_cmp(&min).is_lt(),
            };
            if better {
                best = Some((index, distance));
            }
        }

        best.map(|(index, distance)| {
            Match::new(self.shape.rebuild(self.row(index)), index, distance)
        })
    }

    /// Resets per-query state using the engine's default scope: a
    /// consume-once engine clears only the returned-index tracker, a plain
    /// engine clears everything.
    ///
    /// The memoization cache never goes stale (the list is immutable), so
    /// clearing it is never required for correctness.
    pub fn clear_cache(&mut self) {
        self.clear_cache_with(self.unique);
    }

    /// Resets per-query state. Always clears the returned-index tracker;
    /// clears the memoization cache too unless `index_only`.
    pub fn clear_cache_with(&mut self, index_only: bool) {
        if !index_only {
            self.cache.clear();
        }
        self.returned.clear();
    }

    /// Returns the number of reference entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `false`: construction rejects empty lists. Provided for API
    /// symmetry with [`len`](Closest::len).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the dimensionality shared by every entry and query.
    pub fn dimensions(&self) -> usize {
        self.shape.dimensions()
    }

    /// Returns whether this engine consumes each entry at most once.
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Returns how many entries a consume-once engine can still match.
    /// Always the full length in plain mode.
    pub fn remaining(&self) -> usize {
        self.len - self.returned.len()
    }

    fn row(&self, index: usize) -> &[f64] {
        let dims = self.dimensions();
        &self.rows[index * dims..(index + 1) * dims]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_flattens_rows() {
        let engine = Closest::new([[1.0, 2.0], [3.0, 4.0]], false).unwrap();
        assert_eq!(engine.rows, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(engine.len(), 2);
        assert_eq!(engine.dimensions(), 2);
        assert_eq!(engine.metric, Metric::Euclidean2);
    }

    #[test]
    fn test_scalar_list_selects_absolute_metric() {
        let engine = Closest::new([1.0, 5.0], false).unwrap();
        assert_eq!(engine.metric, Metric::Absolute);
        assert_eq!(engine.shape, Shape::Scalar);
    }

    #[test]
    fn test_cache_is_read_on_repeat_query() {
        let mut engine = Closest::new([1.0, 5.0, 10.0], false).unwrap();
        engine.get(4.0).unwrap();
        assert_eq!(engine.cache.len(), 1);

        // Plant a sentinel under the same key: a repeat query must be
        // answered from the cache, not from a rescan.
        let key = QueryKey::new(&[4.0]);
        let sentinel = Match::new(Point::Scalar(10.0), 2, 6.0);
        engine.cache.insert(key, sentinel.clone());
        assert_eq!(engine.get(4.0).unwrap().unwrap(), sentinel);
    }

    #[test]
    fn test_distinct_queries_grow_cache() {
        let mut engine = Closest::new([1.0, 5.0, 10.0], false).unwrap();
        engine.get(4.0).unwrap();
        engine.get(4.0).unwrap();
        engine.get(6.0).unwrap();
        assert_eq!(engine.cache.len(), 2);
    }

    #[test]
    fn test_unique_mode_never_touches_cache() {
        let mut engine = Closest::new([1.0, 5.0, 10.0], true).unwrap();

        // Even a planted entry is ignored in unique mode.
        let key = QueryKey::new(&[4.0]);
        engine
            .cache
            .insert(key, Match::new(Point::Scalar(10.0), 2, 6.0));

        let first = engine.get(4.0).unwrap().unwrap();
        assert_eq!(first.index(), 1);
        // And nothing new is stored.
        assert_eq!(engine.cache.len(), 1);
    }

    #[test]
    fn test_clear_cache_default_scope() {
        // Plain engine: default clears the cache.
        let mut plain = Closest::new([1.0, 5.0], false).unwrap();
        plain.get(2.0).unwrap();
        plain.clear_cache();
        assert!(plain.cache.is_empty());

        // Consume-once engine: default clears indices only.
        let mut unique = Closest::new([1.0, 5.0], true).unwrap();
        unique.cache.insert(
            QueryKey::new(&[9.0]),
            Match::new(Point::Scalar(5.0), 1, 4.0),
        );
        unique.get(1.0).unwrap();
        unique.clear_cache();
        assert_eq!(unique.remaining(), 2);
        assert_eq!(unique.cache.len(), 1);
    }

    #[test]
    fn test_clear_cache_with_full_scope() {
        let mut engine = Closest::new([1.0, 5.0], true).unwrap();
        engine.get(1.0).unwrap();
        engine.cache.insert(
            QueryKey::new(&[9.0]),
            Match::new(Point::Scalar(5.0), 1, 4.0),
        );
        engine.clear_cache_with(false);
        assert!(engine.cache.is_empty());
        assert_eq!(engine.remaining(), 2);
    }

    #[test]
    fn test_returned_indexes_bookkeeping() {
        let mut returned = ReturnedIndexes::new(3);
        assert_eq!(returned.len(), 0);
        assert!(!returned.contains(1));

        returned.mark(1);
        assert!(returned.contains(1));
        assert_eq!(returned.len(), 1);

        // Marking twice does not double-count.
        returned.mark(1);
        assert_eq!(returned.len(), 1);

        returned.mark(0);
        returned.mark(2);
        assert_eq!(returned.len(), 3);

        returned.clear();
        assert_eq!(returned.len(), 0);
        assert!(!returned.contains(2));
    }

    #[test]
    fn test_nan_distances_rank_last() {
        // The NaN entry never wins while a finite distance exists.
        let mut engine = Closest::new([f64::NAN, 5.0], false).unwrap();
        assert_eq!(engine.get(100.0).unwrap().unwrap().index(), 1);

        // All-NaN distances settle on the first eligible index.
        let mut engine = Closest::new([f64::NAN, f64::NAN], false).unwrap();
        assert_eq!(engine.get(0.0).unwrap().unwrap().index(), 0);
    }

    #[test]
    fn test_is_empty_is_false() {
        let engine = Closest::new([1.0], false).unwrap();
        assert!(!engine.is_empty());
    }
}
