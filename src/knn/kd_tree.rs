//! This module contains the k-d tree implementation.
//!
//! The tree is built once over a fixed point set and is read-only afterwards.
//! Nodes live in a flat arena and refer to their children by [`NodeId`]; each
//! leaf owns a contiguous range of the permuted index array.

use std::cmp::Ordering;

use log::{debug, trace};
use num_traits::{Float, Zero};
use rayon::prelude::*;

use super::bounds::BoundingBox;
use super::heap_utils::KnnQueue;
use super::{chebyshev_distance, squared_euclidean_distance, Neighbor};
use crate::common_types::Coordinates;
use crate::error::{KdTreeError, KdTreeResult};

/// Leaf size used when none is given.
pub const DEFAULT_LEAF_SIZE: usize = 20;

/// Position of a node in the tree's arena.
pub type NodeId = usize;

/// Construction parameters fixed for the lifetime of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KdTreeConfig {
    /// Largest number of points stored in a leaf.
    pub leaf_size: usize,
}

impl Default for KdTreeConfig {
    fn default() -> Self {
        KdTreeConfig {
            leaf_size: DEFAULT_LEAF_SIZE,
        }
    }
}

impl KdTreeConfig {
    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }
}

/// A tree element: a split on one axis, or a leaf over a range of the index array.
#[derive(Debug, Clone)]
pub enum Node<F> {
    Internal {
        axis: usize,
        /// Points with `coordinate(axis) <= split_value` are under `left`, the rest under `right`.
        split_value: F,
        left: NodeId,
        right: NodeId,
        bounds: BoundingBox<F>,
    },
    Leaf {
        /// `start..end` addresses [`KdTree::indices`].
        start: usize,
        end: usize,
        bounds: BoundingBox<F>,
    },
}

impl<F> Node<F> {
    pub fn bounds(&self) -> &BoundingBox<F> {
        match self {
            Node::Internal { bounds, .. } | Node::Leaf { bounds, .. } => bounds,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

/// Counters collected during one nearest neighbor search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub internal_visited: usize,
    pub leaves_visited: usize,
    pub points_examined: usize,
    /// Subtrees skipped because their box was farther than the current k-th best.
    pub subtrees_pruned: usize,
}

/// A static k-d tree over a point set.
#[derive(Debug, Clone)]
pub struct KdTree<P: Coordinates> {
    points: Vec<P>,
    indices: Vec<usize>,
    nodes: Vec<Node<P::Scalar>>,
    root: Option<NodeId>,
    dim: usize,
    leaf_size: usize,
}

impl<P: Coordinates> Default for KdTree<P> {
    /// A tree with no points and no nodes.
    fn default() -> Self {
        KdTree {
            points: Vec::new(),
            indices: Vec::new(),
            nodes: Vec::new(),
            root: None,
            dim: 0,
            leaf_size: DEFAULT_LEAF_SIZE,
        }
    }
}

impl<P: Coordinates> KdTree<P> {
    /// Builds the tree. `leaf_size` defaults to [`DEFAULT_LEAF_SIZE`].
    pub fn new(points: Vec<P>, leaf_size: Option<usize>) -> KdTreeResult<Self> {
        let config = KdTreeConfig::default();
        let config = match leaf_size {
            Some(leaf_size) => config.with_leaf_size(leaf_size),
            None => config,
        };
        Self::with_config(points, config)
    }

    pub fn with_config(points: Vec<P>, config: KdTreeConfig) -> KdTreeResult<Self> {
        if config.leaf_size == 0 {
            return Err(KdTreeError::InvalidLeafSize {
                got: config.leaf_size,
            });
        }
        let dim = Self::validate_points(&points)?;

        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::new();
        let root = Self::build_recursive(
            &points,
            &mut indices,
            0,
            dim,
            config.leaf_size,
            &mut nodes,
        );

        let tree = KdTree {
            points,
            indices,
            nodes,
            root: Some(root),
            dim,
            leaf_size: config.leaf_size,
        };
        debug!(
            "built kd-tree over {} points (dim {}, leaf_size {}): {} nodes, {} leaves, depth {}",
            tree.len(),
            tree.dim,
            tree.leaf_size,
            tree.nodes.len(),
            tree.leaf_count(),
            tree.depth()
        );
        Ok(tree)
    }

    /// Returns the shared dimension, or 0 for an empty point set.
    fn validate_points(points: &[P]) -> KdTreeResult<usize> {
        let Some(first) = points.first() else {
            return Ok(0);
        };
        let dim = first.dimension();
        if dim == 0 {
            return Err(KdTreeError::ZeroDimension);
        }
        for (index, point) in points.iter().enumerate() {
            if point.dimension() != dim {
                return Err(KdTreeError::InconsistentDimension {
                    index,
                    expected: dim,
                    found: point.dimension(),
                });
            }
            if let Some(axis) = (0..dim).find(|&axis| !point.coordinate(axis).is_finite()) {
                return Err(KdTreeError::NonFiniteCoordinate { index, axis });
            }
        }
        Ok(dim)
    }

    /// Builds the subtree over `indices`, which starts at `offset` in the full index array.
    fn build_recursive(
        points: &[P],
        indices: &mut [usize],
        offset: usize,
        dim: usize,
        leaf_size: usize,
        nodes: &mut Vec<Node<P::Scalar>>,
    ) -> NodeId {
        let bounds = BoundingBox::from_indices(points, indices, dim);
        let count = indices.len();
        let leaf = |bounds: BoundingBox<P::Scalar>| Node::Leaf {
            start: offset,
            end: offset + count,
            bounds,
        };

        if count <= leaf_size {
            nodes.push(leaf(bounds));
            return nodes.len() - 1;
        }

        let axis = bounds.widest_axis();
        if bounds.spread(axis) <= <P::Scalar as Zero>::zero() {
            // Every point coincides, no split can separate them.
            debug!("keeping {} coincident points in a single leaf", count);
            nodes.push(leaf(bounds));
            return nodes.len() - 1;
        }

        let (mid, split_value) = Self::partition_at_median(points, indices, axis);
        let (left_indices, right_indices) = indices.split_at_mut(mid);
        let left = Self::build_recursive(points, left_indices, offset, dim, leaf_size, nodes);
        let right =
            Self::build_recursive(points, right_indices, offset + mid, dim, leaf_size, nodes);

        let bounds = nodes[left].bounds().union(nodes[right].bounds());
        nodes.push(Node::Internal {
            axis,
            split_value,
            left,
            right,
            bounds,
        });
        nodes.len() - 1
    }

    /// Reorders `indices` so that `[..mid]` holds `coordinate <= split_value` and
    /// `[mid..]` holds `coordinate > split_value`; both sides are non-empty.
    ///
    /// Requires at least two distinct coordinates on `axis`.
    fn partition_at_median(points: &[P], indices: &mut [usize], axis: usize) -> (usize, P::Scalar) {
        let coordinate = |i: usize| points[i].coordinate(axis);
        // Lower median: with no ties the left side gets ceil(len / 2) points.
        let mid = (indices.len() - 1) / 2;
        indices.select_nth_unstable_by(mid, |&a, &b| {
            coordinate(a)
                .partial_cmp(&coordinate(b))
                .unwrap_or(Ordering::Equal)
        });
        let median = coordinate(indices[mid]);

        // Points tied with the median belong on the left.
        let ties = partition_in_place(&mut indices[mid..], |i| coordinate(i) <= median);
        if mid + ties < indices.len() {
            return (mid + ties, median);
        }

        // The median is the largest coordinate: split just below it instead.
        // `[..mid]` is non-empty here, since every point from `mid` on equals the maximum.
        let below = partition_in_place(&mut indices[..mid], |i| coordinate(i) < median);
        let split_value = indices[..below]
            .iter()
            .map(|&i| coordinate(i))
            .fold(<P::Scalar as Float>::neg_infinity(), Float::max);
        (below, split_value)
    }

    /// Number of coordinates per point; 0 for an empty tree.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    pub fn points(&self) -> &[P] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<&P> {
        self.points.get(index)
    }

    /// The index array, permuted so that every node's points are contiguous.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<P::Scalar>> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[Node<P::Scalar>] {
        &self.nodes
    }

    /// Original point indices stored in a leaf; empty for internal nodes.
    pub fn leaf_indices(&self, id: NodeId) -> &[usize] {
        match self.nodes.get(id) {
            Some(Node::Leaf { start, end, .. }) => &self.indices[*start..*end],
            _ => &[],
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    /// Number of levels; a lone leaf has depth 1, a tree without nodes 0.
    pub fn depth(&self) -> usize {
        fn depth_of<F>(nodes: &[Node<F>], id: NodeId) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 1,
                Node::Internal { left, right, .. } => {
                    1 + depth_of(nodes, *left).max(depth_of(nodes, *right))
                }
            }
        }
        self.root.map_or(0, |root| depth_of(&self.nodes, root))
    }

    fn check_query<Q>(&self, query: &Q) -> KdTreeResult<()>
    where
        Q: Coordinates<Scalar = P::Scalar> + ?Sized,
    {
        // An empty tree has no dimension to check against.
        if self.is_empty() {
            return Ok(());
        }
        if query.dimension() != self.dim {
            return Err(KdTreeError::DimensionMismatch {
                expected: self.dim,
                found: query.dimension(),
            });
        }
        match (0..self.dim).find(|&axis| !query.coordinate(axis).is_finite()) {
            Some(axis) => Err(KdTreeError::NonFiniteQuery { axis }),
            None => Ok(()),
        }
    }

    /// Indices of the `k` nearest points, closest first.
    pub fn knn_search<Q>(&self, query: &Q, k: usize) -> KdTreeResult<Vec<usize>>
    where
        Q: Coordinates<Scalar = P::Scalar> + ?Sized,
    {
        Ok(self
            .knn_neighbors(query, k)?
            .into_iter()
            .map(|n| n.index)
            .collect())
    }

    /// Indices and Euclidean distances of the `k` nearest points, aligned by position.
    pub fn knn_search_with_distances<Q>(
        &self,
        query: &Q,
        k: usize,
    ) -> KdTreeResult<(Vec<usize>, Vec<f64>)>
    where
        Q: Coordinates<Scalar = P::Scalar> + ?Sized,
    {
        Ok(self
            .knn_neighbors(query, k)?
            .into_iter()
            .map(|n| (n.index, n.distance))
            .unzip())
    }

    /// The `k` nearest points by ascending Euclidean distance, ties by index.
    ///
    /// Returns `min(k, len())` neighbors.
    pub fn knn_neighbors<Q>(&self, query: &Q, k: usize) -> KdTreeResult<Vec<Neighbor>>
    where
        Q: Coordinates<Scalar = P::Scalar> + ?Sized,
    {
        self.knn_search_with_stats(query, k)
            .map(|(neighbors, _)| neighbors)
    }

    /// Same as [`knn_neighbors`](Self::knn_neighbors), also reporting how much of the tree was touched.
    pub fn knn_search_with_stats<Q>(
        &self,
        query: &Q,
        k: usize,
    ) -> KdTreeResult<(Vec<Neighbor>, SearchStats)>
    where
        Q: Coordinates<Scalar = P::Scalar> + ?Sized,
    {
        self.check_query(query)?;
        let mut stats = SearchStats::default();
        let root = match self.root {
            Some(root) if k > 0 && !self.is_empty() => root,
            _ => return Ok((Vec::new(), stats)),
        };

        let mut queue = KnnQueue::new(k.min(self.len()));
        self.knn_recursive(root, query, &mut queue, &mut stats);
        trace!(
            "knn k={}: {} internal nodes, {} leaves, {} points examined, {} subtrees pruned",
            k,
            stats.internal_visited,
            stats.leaves_visited,
            stats.points_examined,
            stats.subtrees_pruned
        );
        Ok((into_euclidean(queue.drain()), stats))
    }

    fn knn_recursive<Q>(
        &self,
        id: NodeId,
        query: &Q,
        queue: &mut KnnQueue,
        stats: &mut SearchStats,
    ) where
        Q: Coordinates<Scalar = P::Scalar> + ?Sized,
    {
        match &self.nodes[id] {
            Node::Leaf { start, end, .. } => {
                stats.leaves_visited += 1;
                for &index in &self.indices[*start..*end] {
                    stats.points_examined += 1;
                    queue.try_insert(squared_euclidean_distance(&self.points[index], query), index);
                }
            }
            Node::Internal { left, right, .. } => {
                stats.internal_visited += 1;
                let left_bound = self.nodes[*left].bounds().min_squared_distance(query);
                let right_bound = self.nodes[*right].bounds().min_squared_distance(query);
                let children = if left_bound <= right_bound {
                    [(*left, left_bound), (*right, right_bound)]
                } else {
                    [(*right, right_bound), (*left, left_bound)]
                };
                for (child, bound) in children {
                    // worst_distance is +inf until the queue is full. Equal bounds are still
                    // visited: they may hold an equally distant point with a smaller index.
                    if bound <= queue.worst_distance() {
                        self.knn_recursive(child, query, queue, stats);
                    } else {
                        stats.subtrees_pruned += 1;
                    }
                }
            }
        }
    }

    /// The nearest point, or `None` for an empty tree.
    pub fn nn_search<Q>(&self, query: &Q) -> KdTreeResult<Option<Neighbor>>
    where
        Q: Coordinates<Scalar = P::Scalar> + ?Sized,
    {
        Ok(self.knn_neighbors(query, 1)?.into_iter().next())
    }

    /// Every point within Euclidean distance `radius` (inclusive).
    ///
    /// With `sort` the result is ordered like [`knn_neighbors`](Self::knn_neighbors),
    /// otherwise it follows the tree layout.
    pub fn radius_search<Q>(&self, query: &Q, radius: f64, sort: bool) -> KdTreeResult<Vec<Neighbor>>
    where
        Q: Coordinates<Scalar = P::Scalar> + ?Sized,
    {
        check_radius(radius)?;
        self.check_query(query)?;
        let mut found = Vec::new();
        if let Some(root) = self.root.filter(|_| !self.is_empty()) {
            self.radius_recursive(root, query, radius * radius, &mut found);
        }
        let mut found = into_euclidean(found);
        if sort {
            sort_neighbors(&mut found);
        }
        Ok(found)
    }

    fn radius_recursive<Q>(&self, id: NodeId, query: &Q, squared_radius: f64, found: &mut Vec<Neighbor>)
    where
        Q: Coordinates<Scalar = P::Scalar> + ?Sized,
    {
        match &self.nodes[id] {
            Node::Leaf { start, end, .. } => {
                for &index in &self.indices[*start..*end] {
                    let distance = squared_euclidean_distance(&self.points[index], query);
                    if distance <= squared_radius {
                        found.push(Neighbor { index, distance });
                    }
                }
            }
            Node::Internal { left, right, .. } => {
                for child in [*left, *right] {
                    if self.nodes[child].bounds().min_squared_distance(query) <= squared_radius {
                        self.radius_recursive(child, query, squared_radius, found);
                    }
                }
            }
        }
    }

    /// Every point whose coordinates all lie within `range` of the query's
    /// (an axis-aligned square in 2-D, a cube in 3-D). Reported distances are Euclidean.
    pub fn range_search<Q>(&self, query: &Q, range: f64, sort: bool) -> KdTreeResult<Vec<Neighbor>>
    where
        Q: Coordinates<Scalar = P::Scalar> + ?Sized,
    {
        check_radius(range)?;
        self.check_query(query)?;
        let mut found = Vec::new();
        if let Some(root) = self.root.filter(|_| !self.is_empty()) {
            self.range_recursive(root, query, range, &mut found);
        }
        if sort {
            sort_neighbors(&mut found);
        }
        Ok(found)
    }

    fn range_recursive<Q>(&self, id: NodeId, query: &Q, range: f64, found: &mut Vec<Neighbor>)
    where
        Q: Coordinates<Scalar = P::Scalar> + ?Sized,
    {
        match &self.nodes[id] {
            Node::Leaf { start, end, .. } => {
                for &index in &self.indices[*start..*end] {
                    let point = &self.points[index];
                    if chebyshev_distance(point, query) <= range {
                        let distance = squared_euclidean_distance(point, query).sqrt();
                        found.push(Neighbor { index, distance });
                    }
                }
            }
            Node::Internal { left, right, .. } => {
                for child in [*left, *right] {
                    if self.nodes[child].bounds().min_chebyshev_distance(query) <= range {
                        self.range_recursive(child, query, range, found);
                    }
                }
            }
        }
    }
}

impl<P> KdTree<P>
where
    P: Coordinates + Sync,
{
    /// Runs one [`knn_neighbors`](Self::knn_neighbors) per query in parallel.
    ///
    /// Fails with the first error encountered; no partial results are returned.
    pub fn knn_search_batch<Q>(&self, queries: &[Q], k: usize) -> KdTreeResult<Vec<Vec<Neighbor>>>
    where
        Q: Coordinates<Scalar = P::Scalar> + Sync,
    {
        queries
            .par_iter()
            .map(|query| self.knn_neighbors(query, k))
            .collect()
    }
}

/// Moves elements satisfying `pred` to the front; returns how many there are.
///
/// Order within either side is not kept (`slice::partition_in_place` is still unstable).
fn partition_in_place(slice: &mut [usize], mut pred: impl FnMut(usize) -> bool) -> usize {
    let mut boundary = 0;
    for i in 0..slice.len() {
        if pred(slice[i]) {
            slice.swap(boundary, i);
            boundary += 1;
        }
    }
    boundary
}

fn check_radius(radius: f64) -> KdTreeResult<()> {
    if radius.is_finite() && radius >= 0.0 {
        Ok(())
    } else {
        Err(KdTreeError::InvalidRadius { radius })
    }
}

/// Squared distances to Euclidean distances.
fn into_euclidean(neighbors: Vec<Neighbor>) -> Vec<Neighbor> {
    neighbors
        .into_iter()
        .map(|n| Neighbor {
            index: n.index,
            distance: n.distance.sqrt(),
        })
        .collect()
}

fn sort_neighbors(neighbors: &mut [Neighbor]) {
    neighbors.sort_unstable_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.index.cmp(&b.index))
    });
}
