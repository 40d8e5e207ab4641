//! Nearest neighbor search: the kd-tree, its best-k queue and the distance helpers they share.

use num_traits::AsPrimitive;

use crate::common_types::Coordinates;

pub mod bounds;
pub mod heap_utils;
pub mod kd_tree;

/// A search result: the original index of a point and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Neighbor {
    pub index: usize,
    pub distance: f64,
}

/// Squared Euclidean distance between two points of equal dimension.
pub fn squared_euclidean_distance<A, B>(a: &A, b: &B) -> f64
where
    A: Coordinates + ?Sized,
    B: Coordinates<Scalar = A::Scalar> + ?Sized,
{
    (0..a.dimension())
        .map(|axis| {
            let diff: f64 = a.coordinate(axis).as_() - b.coordinate(axis).as_();
            diff * diff
        })
        .sum()
}

/// Calculates the Euclidean distance between two points.
pub fn euclidean_distance<A, B>(a: &A, b: &B) -> f64
where
    A: Coordinates + ?Sized,
    B: Coordinates<Scalar = A::Scalar> + ?Sized,
{
    squared_euclidean_distance(a, b).sqrt()
}

/// Largest absolute per-axis difference between two points.
pub fn chebyshev_distance<A, B>(a: &A, b: &B) -> f64
where
    A: Coordinates + ?Sized,
    B: Coordinates<Scalar = A::Scalar> + ?Sized,
{
    (0..a.dimension())
        .map(|axis| {
            let diff: f64 = a.coordinate(axis).as_() - b.coordinate(axis).as_();
            diff.abs()
        })
        .fold(0.0, f64::max)
}

/// Exhaustive k-nearest-neighbor search.
///
/// Same ordering as the tree: ascending Euclidean distance, ties by index.
/// Dimensions are not checked; use it as a reference on trusted input.
pub fn brute_force_knn<P, Q>(points: &[P], query: &Q, k: usize) -> Vec<Neighbor>
where
    P: Coordinates,
    Q: Coordinates<Scalar = P::Scalar> + ?Sized,
{
    let mut queue = heap_utils::KnnQueue::new(k);
    for (index, point) in points.iter().enumerate() {
        queue.try_insert(squared_euclidean_distance(point, query), index);
    }
    queue
        .drain()
        .into_iter()
        .map(|n| Neighbor {
            index: n.index,
            distance: n.distance.sqrt(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distances() {
        let a = [0.0, 0.0, 0.0];
        let b = [1.0, 2.0, -2.0];
        assert_eq!(squared_euclidean_distance(&a, &b), 9.0);
        assert_eq!(euclidean_distance(&a, &b), 3.0);
        assert_eq!(chebyshev_distance(&a, &b), 2.0);
    }

    #[test]
    fn test_distance_between_container_types() {
        let v = vec![3.0_f32, 4.0];
        let s: &[f32] = &[0.0, 0.0];
        assert_eq!(euclidean_distance(&v, s), 5.0);
    }

    #[test]
    fn test_brute_force_orders_by_distance_then_index() {
        let points = vec![[2.0, 0.0], [1.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [5.0, 5.0]];
        let result = brute_force_knn(&points, &[0.0, 0.0], 4);
        let indices: Vec<usize> = result.iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 0]);
        assert_eq!(result[0].distance, 1.0);
        assert_eq!(result[3].distance, 2.0);
    }

    #[test]
    fn test_brute_force_k_larger_than_points() {
        let points = vec![[0.0], [1.0]];
        assert_eq!(brute_force_knn(&points, &[0.2], 10).len(), 2);
        assert!(brute_force_knn(&points, &[0.2], 0).is_empty());
    }
}
