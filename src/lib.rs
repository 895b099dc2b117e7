//! Nearest-match lookup over a fixed reference list.
//!
//! Given a query — a plain number or a fixed-length vector — [`Closest`]
//! returns the reference entry minimizing a Euclidean-family distance:
//!
//! | List shape | Distance | Reported value |
//! |------------|----------|----------------|
//! | Scalar | absolute difference | true distance |
//! | Vector (any length) | squared Euclidean | squared, no square root |
//!
//! Ties resolve to the lowest index. Two modes: plain lookup memoizes
//! exact-repeat queries, while consume-once mode (`unique`) returns each
//! reference index at most once until reset — useful for snapping inputs
//! onto a quantization grid, color or value binning, and greedy one-to-one
//! assignment between two point sets.
//!
//! # Quick start
//!
//! ```
//! use closest::Closest;
//!
//! let mut engine = Closest::new([1.0, 5.0, 10.0], false).unwrap();
//!
//! let hit = engine.get(4.0).unwrap().unwrap();
//! assert_eq!(hit.index(), 1);
//! assert_eq!(hit.distance(), 1.0);
//! ```
//!
//! # Architecture
//!
//! ```text
//! Closest::get()
//!   ├─ shape check            (point.rs)    query vs. list dimensionality
//!   ├─ QueryKey::new()        (key.rs)      canonical bit-pattern key
//!   ├─ cache lookup           (closest.rs)  plain mode only
//!   ├─ Metric::eval()         (distance.rs) linear scan, O(n) per query
//!   └─ cache / tracker update (closest.rs)
//! ```
//!
//! Queries are answered by a full linear scan — there is no spatial index,
//! so the cache only benefits exact-repeat queries.

pub mod closest;
pub mod error;
pub mod point;
pub mod result;

pub(crate) mod distance;
pub(crate) mod key;

pub use closest::Closest;
pub use error::ClosestError;
pub use point::Point;
pub use result::Match;
