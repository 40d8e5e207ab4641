//! Python bindings, built with the `python` feature.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::error::KdTreeError;
use crate::knn::kd_tree::{KdTree, DEFAULT_LEAF_SIZE};
use crate::knn::{euclidean_distance, Neighbor};

impl From<KdTreeError> for PyErr {
    fn from(err: KdTreeError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

fn split_neighbors(neighbors: Vec<Neighbor>) -> (Vec<usize>, Vec<f64>) {
    neighbors.into_iter().map(|n| (n.index, n.distance)).unzip()
}

/// Calculates the Euclidean distance between two vectors of f64.
#[pyfunction(name = "euclidean_distance")]
fn euclidean_distance_py(a: Vec<f64>, b: Vec<f64>) -> PyResult<f64> {
    if a.len() != b.len() {
        return Err(PyValueError::new_err(
            "Input vectors must have the same length.",
        ));
    }
    Ok(euclidean_distance(&a, &b))
}

#[pyclass(name = "KdTree", frozen)]
struct PyKdTree {
    tree: KdTree<Vec<f64>>,
}

#[pymethods]
impl PyKdTree {
    #[new]
    #[pyo3(signature = (points, leaf_size = DEFAULT_LEAF_SIZE))]
    fn new(py: Python<'_>, points: Vec<Vec<f64>>, leaf_size: usize) -> PyResult<Self> {
        let tree = py.allow_threads(|| KdTree::new(points, Some(leaf_size)))?;
        Ok(PyKdTree { tree })
    }

    /// Returns `(indices, distances)` of the `k` nearest points, closest first.
    fn knn_search(&self, py: Python<'_>, query: Vec<f64>, k: usize) -> PyResult<(Vec<usize>, Vec<f64>)> {
        let neighbors = py.allow_threads(|| self.tree.knn_neighbors(&query, k))?;
        Ok(split_neighbors(neighbors))
    }

    /// Returns `(index, distance)` of the nearest point, or `None` for an empty tree.
    fn nn_search(&self, py: Python<'_>, query: Vec<f64>) -> PyResult<Option<(usize, f64)>> {
        let nearest = py.allow_threads(|| self.tree.nn_search(&query))?;
        Ok(nearest.map(|n| (n.index, n.distance)))
    }

    #[pyo3(signature = (query, radius, sort = false))]
    fn radius_search(
        &self,
        py: Python<'_>,
        query: Vec<f64>,
        radius: f64,
        sort: bool,
    ) -> PyResult<(Vec<usize>, Vec<f64>)> {
        let neighbors = py.allow_threads(|| self.tree.radius_search(&query, radius, sort))?;
        Ok(split_neighbors(neighbors))
    }

    #[pyo3(signature = (query, range, sort = false))]
    fn range_search(
        &self,
        py: Python<'_>,
        query: Vec<f64>,
        range: f64,
        sort: bool,
    ) -> PyResult<(Vec<usize>, Vec<f64>)> {
        let neighbors = py.allow_threads(|| self.tree.range_search(&query, range, sort))?;
        Ok(split_neighbors(neighbors))
    }

    #[getter]
    fn dim(&self) -> usize {
        self.tree.dim()
    }

    #[getter]
    fn leaf_size(&self) -> usize {
        self.tree.leaf_size()
    }

    fn __len__(&self) -> usize {
        self.tree.len()
    }
}

/// The name of this function must match the `lib.name` in `Cargo.toml`.
#[pymodule]
fn kdtree_knn(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(euclidean_distance_py, m)?)?;
    m.add_class::<PyKdTree>()?;
    Ok(())
}
