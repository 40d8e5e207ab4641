//! This module contains the point abstraction shared by the tree and its queries.

use std::fmt::Debug;

use num_traits::{AsPrimitive, Float};

/// Read-only access to the coordinates of a fixed-dimension point.
///
/// Anything indexable by axis can be stored in a [`KdTree`](crate::KdTree):
/// plain vectors, slices, arrays, or a labelled [`DataPoint`].
pub trait Coordinates {
    /// The coordinate type. Distances are always evaluated in `f64`.
    type Scalar: Float + AsPrimitive<f64> + Debug + Send + Sync;

    /// Number of coordinates.
    fn dimension(&self) -> usize;

    /// The coordinate along `axis`. `axis` is always below [`dimension`](Self::dimension).
    fn coordinate(&self, axis: usize) -> Self::Scalar;
}

impl<F: Float + AsPrimitive<f64> + Debug + Send + Sync> Coordinates for [F] {
    type Scalar = F;

    fn dimension(&self) -> usize {
        self.len()
    }

    fn coordinate(&self, axis: usize) -> F {
        self[axis]
    }
}

impl<F: Float + AsPrimitive<f64> + Debug + Send + Sync> Coordinates for Vec<F> {
    type Scalar = F;

    fn dimension(&self) -> usize {
        self.len()
    }

    fn coordinate(&self, axis: usize) -> F {
        self[axis]
    }
}

impl<F: Float + AsPrimitive<f64> + Debug + Send + Sync, const N: usize> Coordinates for [F; N] {
    type Scalar = F;

    fn dimension(&self) -> usize {
        N
    }

    fn coordinate(&self, axis: usize) -> F {
        self[axis]
    }
}

impl<T: Coordinates + ?Sized> Coordinates for &T {
    type Scalar = T::Scalar;

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn coordinate(&self, axis: usize) -> Self::Scalar {
        (**self).coordinate(axis)
    }
}

/// Represents a single data point, with features and a label.
///
/// - `F`: The type of the features (e.g., `f64`, `f32`).
/// - `L`: The type of the label (e.g., `i32`, `String`, an enum).
///
/// The label rides along untouched; only `features` take part in distances.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataPoint<F, L> {
    pub features: Vec<F>,
    pub label: L,
}

impl<F, L> DataPoint<F, L> {
    pub fn new(features: Vec<F>, label: L) -> Self {
        DataPoint { features, label }
    }
}

impl<F: Float + AsPrimitive<f64> + Debug + Send + Sync, L> Coordinates for DataPoint<F, L> {
    type Scalar = F;

    fn dimension(&self) -> usize {
        self.features.len()
    }

    fn coordinate(&self, axis: usize) -> F {
        self.features[axis]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containers_expose_same_coordinates() {
        let v = vec![1.0_f64, -2.0, 3.5];
        let a = [1.0_f64, -2.0, 3.5];
        let dp = DataPoint::new(v.clone(), "label");

        assert_eq!(v.dimension(), 3);
        assert_eq!(a.dimension(), 3);
        assert_eq!(dp.dimension(), 3);
        assert_eq!(v.as_slice().dimension(), 3);
        for axis in 0..3 {
            assert_eq!(v.coordinate(axis), a.coordinate(axis));
            assert_eq!(dp.coordinate(axis), a.coordinate(axis));
            assert_eq!((&v).coordinate(axis), a.coordinate(axis));
        }
    }

    #[test]
    fn test_f32_points() {
        let p = [0.5_f32, 1.5];
        assert_eq!(p.dimension(), 2);
        assert_eq!(p.coordinate(1), 1.5_f32);
    }
}
