//! A static k-d tree spatial index with exact nearest neighbor search.
//!
//! The tree is built once from a point set and then answers k-nearest-neighbor,
//! nearest neighbor, radius and axis-aligned range queries. Queries never
//! mutate the tree, so a single tree can serve many threads at once.
//!
//! ```
//! use kdtree_knn::KdTree;
//!
//! let points = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0], vec![5.0, 5.0]];
//! let tree = KdTree::new(points, Some(2)).unwrap();
//!
//! let (indices, distances) = tree.knn_search_with_distances(&[0.0, 0.0], 2).unwrap();
//! assert_eq!(indices, vec![0, 1]);
//! assert_eq!(distances, vec![0.0, 1.0]);
//! ```

pub mod common_types;
pub mod error;
pub mod knn;

#[cfg(feature = "python")]
mod python;

pub use common_types::{Coordinates, DataPoint};
pub use error::{KdTreeError, KdTreeResult};
pub use knn::heap_utils::KnnQueue;
pub use knn::kd_tree::{KdTree, KdTreeConfig, Node, NodeId, SearchStats, DEFAULT_LEAF_SIZE};
pub use knn::{brute_force_knn, euclidean_distance, squared_euclidean_distance, Neighbor};
