//! Axis-aligned bounding boxes over groups of points.

use num_traits::{AsPrimitive, Float};

use crate::common_types::Coordinates;

/// Componentwise `[min, max]` extent of a point group.
///
/// An empty group has `min = +inf` and `max = -inf` on every axis, so its
/// lower bound distance to any query is infinite.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox<F> {
    pub min: Vec<F>,
    pub max: Vec<F>,
}

impl<F: Float + AsPrimitive<f64>> BoundingBox<F> {
    pub fn empty(dim: usize) -> Self {
        BoundingBox {
            min: vec![F::infinity(); dim],
            max: vec![F::neg_infinity(); dim],
        }
    }

    /// Bounding box of the points addressed by `indices`.
    pub fn from_indices<P>(points: &[P], indices: &[usize], dim: usize) -> Self
    where
        P: Coordinates<Scalar = F>,
    {
        let mut bounds = Self::empty(dim);
        for &i in indices {
            let p = &points[i];
            for axis in 0..dim {
                let c = p.coordinate(axis);
                if c < bounds.min[axis] {
                    bounds.min[axis] = c;
                }
                if c > bounds.max[axis] {
                    bounds.max[axis] = c;
                }
            }
        }
        bounds
    }

    pub fn dim(&self) -> usize {
        self.min.len()
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Self) -> Self {
        BoundingBox {
            min: self
                .min
                .iter()
                .zip(&other.min)
                .map(|(&a, &b)| a.min(b))
                .collect(),
            max: self
                .max
                .iter()
                .zip(&other.max)
                .map(|(&a, &b)| a.max(b))
                .collect(),
        }
    }

    /// `max - min` along `axis`; negative for an empty box.
    pub fn spread(&self, axis: usize) -> F {
        self.max[axis] - self.min[axis]
    }

    /// Axis of maximum spread, lowest axis on ties.
    pub fn widest_axis(&self) -> usize {
        let mut best = 0;
        for axis in 1..self.dim() {
            if self.spread(axis) > self.spread(best) {
                best = axis;
            }
        }
        best
    }

    pub fn contains<Q>(&self, point: &Q) -> bool
    where
        Q: Coordinates<Scalar = F> + ?Sized,
    {
        (0..self.dim()).all(|axis| {
            let c = point.coordinate(axis);
            self.min[axis] <= c && c <= self.max[axis]
        })
    }

    /// Distance from `coordinate` to the box's extent along `axis`.
    #[inline]
    fn axis_gap(&self, coordinate: f64, axis: usize) -> f64 {
        let lo: f64 = self.min[axis].as_();
        let hi: f64 = self.max[axis].as_();
        if coordinate < lo {
            lo - coordinate
        } else if coordinate > hi {
            coordinate - hi
        } else {
            0.0
        }
    }

    /// Squared distance from `query` to the nearest point of the box; zero inside.
    pub fn min_squared_distance<Q>(&self, query: &Q) -> f64
    where
        Q: Coordinates<Scalar = F> + ?Sized,
    {
        let mut sum = 0.0;
        for axis in 0..self.dim() {
            let gap = self.axis_gap(query.coordinate(axis).as_(), axis);
            sum += gap * gap;
        }
        sum
    }

    /// Largest per-axis gap between `query` and the box (Chebyshev distance); zero inside.
    pub fn min_chebyshev_distance<Q>(&self, query: &Q) -> f64
    where
        Q: Coordinates<Scalar = F> + ?Sized,
    {
        let mut worst = 0.0_f64;
        for axis in 0..self.dim() {
            let gap = self.axis_gap(query.coordinate(axis).as_(), axis);
            worst = worst.max(gap);
        }
        worst
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_from_points() {
        let points = vec![vec![0.0, 5.0], vec![2.0, -1.0], vec![1.0, 3.0]];
        let bounds = BoundingBox::from_indices(&points, &[0, 1, 2], 2);
        assert_eq!(bounds.min, vec![0.0, -1.0]);
        assert_eq!(bounds.max, vec![2.0, 5.0]);
        assert_eq!(bounds.widest_axis(), 1);
        for p in &points {
            assert!(bounds.contains(p));
        }
    }

    #[test]
    fn test_widest_axis_ties_go_to_lowest() {
        let points = vec![vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 0.5]];
        let bounds = BoundingBox::from_indices(&points, &[0, 1], 3);
        assert_eq!(bounds.widest_axis(), 0);
    }

    #[test]
    fn test_min_squared_distance() {
        let bounds = BoundingBox {
            min: vec![0.0, 0.0],
            max: vec![1.0, 1.0],
        };
        assert_eq!(bounds.min_squared_distance(&[0.5, 0.5]), 0.0);
        assert_eq!(bounds.min_squared_distance(&[3.0, 0.5]), 4.0);
        assert_eq!(bounds.min_squared_distance(&[-1.0, 3.0]), 1.0 + 4.0);
        assert_eq!(bounds.min_chebyshev_distance(&[-1.0, 3.0]), 2.0);
    }

    #[test]
    fn test_empty_box_is_infinitely_far() {
        let bounds = BoundingBox::<f64>::empty(2);
        assert!(bounds.min_squared_distance(&[0.0, 0.0]).is_infinite());
        let joined = bounds.union(&BoundingBox {
            min: vec![1.0, 2.0],
            max: vec![3.0, 4.0],
        });
        assert_eq!(joined.min, vec![1.0, 2.0]);
        assert_eq!(joined.max, vec![3.0, 4.0]);
    }
}
