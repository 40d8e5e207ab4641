//! This module contains the bounded best-k structure used by the nearest neighbor queries.

use std::cmp::Ordering;

use ordered_float::OrderedFloat;

use super::Neighbor;

/// Represents an element in the KnnQueue heap, pairing a squared distance with a point index.
#[derive(Debug, Clone, Copy)]
pub struct HeapElement {
    pub distance: OrderedFloat<f64>,
    pub index: usize,
}

impl PartialEq for HeapElement {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for HeapElement {}

impl PartialOrd for HeapElement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapElement {
    fn cmp(&self, other: &Self) -> Ordering {
        // Equal distances are ordered by index, so the larger index is the worse candidate.
        self.distance
            .cmp(&other.distance)
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Holds the `k` best (smallest distance) candidates seen so far.
///
/// The candidates live in an array-backed binary max-heap keyed by
/// `(distance, index)`, so the current worst candidate is always at slot 0.
/// Only [`try_insert`](Self::try_insert), [`worst_distance`](Self::worst_distance)
/// and [`drain`](Self::drain) are needed by the search.
#[derive(Debug, Clone)]
pub struct KnnQueue {
    capacity: usize,
    heap: Vec<HeapElement>,
}

impl KnnQueue {
    pub fn new(capacity: usize) -> Self {
        KnnQueue {
            capacity,
            heap: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the current number of candidates stored.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// Largest distance held, or `+inf` while the queue still has spare capacity.
    pub fn worst_distance(&self) -> f64 {
        if self.is_full() {
            self.heap
                .first()
                .map_or(f64::NEG_INFINITY, |worst| worst.distance.0)
        } else {
            f64::INFINITY
        }
    }

    /// Adds the candidate if there is room or it beats the current worst,
    /// evicting the worst in the latter case. Returns whether it was kept.
    pub fn try_insert(&mut self, distance: f64, index: usize) -> bool {
        if self.capacity == 0 {
            return false;
        }
        let item = HeapElement {
            distance: OrderedFloat(distance),
            index,
        };
        if self.heap.len() < self.capacity {
            self.heap.push(item);
            self.sift_up(self.heap.len() - 1);
            true
        } else if item < self.heap[0] {
            self.heap[0] = item;
            self.sift_down(0);
            true
        } else {
            false
        }
    }

    /// Consumes the queue and returns the candidates by ascending distance.
    pub fn drain(self) -> Vec<Neighbor> {
        let mut items = self.heap;
        items.sort_unstable();
        items
            .into_iter()
            .map(|elem| Neighbor {
                index: elem.index,
                distance: elem.distance.0,
            })
            .collect()
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.heap[pos] <= self.heap[parent] {
                break;
            }
            self.heap.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let largest = if right < len && self.heap[right] > self.heap[left] {
                right
            } else {
                left
            };
            if self.heap[largest] <= self.heap[pos] {
                break;
            }
            self.heap.swap(pos, largest);
            pos = largest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drained_indices(queue: KnnQueue) -> Vec<usize> {
        queue.drain().into_iter().map(|n| n.index).collect()
    }

    #[test]
    fn test_knn_queue_logic() {
        let mut queue = KnnQueue::new(3); // Keep 3 best (smallest distance)

        assert!(queue.try_insert(10.0, 10));
        assert!(queue.try_insert(5.0, 5));
        assert_eq!(queue.worst_distance(), f64::INFINITY); // Not full yet
        assert!(queue.try_insert(12.0, 12));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.worst_distance(), 12.0);

        // 4.0 beats 12.0, which is evicted
        assert!(queue.try_insert(4.0, 4));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.worst_distance(), 10.0);

        // 15.0 does not beat 10.0
        assert!(!queue.try_insert(15.0, 15));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.worst_distance(), 10.0);

        let neighbors = queue.drain();
        let distances: Vec<f64> = neighbors.iter().map(|n| n.distance).collect();
        assert_eq!(distances, vec![4.0, 5.0, 10.0]);
        assert_eq!(
            neighbors.iter().map(|n| n.index).collect::<Vec<_>>(),
            vec![4, 5, 10]
        );
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut queue = KnnQueue::new(0);
        assert!(!queue.try_insert(1.0, 0));
        assert!(queue.is_empty());
        assert!(queue.is_full());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_equal_distances_prefer_smaller_index() {
        let mut queue = KnnQueue::new(2);
        queue.try_insert(1.0, 7);
        queue.try_insert(1.0, 3);
        // Same distance, index 5 beats the current worst (index 7)
        assert!(queue.try_insert(1.0, 5));
        // Same distance, index 9 is worse than everything held
        assert!(!queue.try_insert(1.0, 9));
        assert_eq!(drained_indices(queue), vec![3, 5]);
    }

    #[test]
    fn test_heap_keeps_k_smallest_of_many() {
        let mut queue = KnnQueue::new(5);
        // Distances in a scrambled order: (i * 37) % 101 is a permutation of 0..101
        for i in 0..101usize {
            let d = ((i * 37) % 101) as f64;
            queue.try_insert(d, i);
            assert!(queue.len() <= 5);
        }
        let distances: Vec<f64> = queue.drain().iter().map(|n| n.distance).collect();
        assert_eq!(distances, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }
}
