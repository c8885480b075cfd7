use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// A candidate book and its full-precision cosine similarity to the source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub similarity: f64,
}

impl Neighbor {
    /// Similarity as reported to callers: rounded to 4 decimals and kept inside `[0, 1]`.
    pub fn reported_score(&self) -> f64 {
        report_score(self.similarity)
    }
}

/// A similarity that is not a number reports as 0.
pub fn report_score(similarity: f64) -> f64 {
    if similarity.is_nan() {
        return 0.0;
    }
    let rounded = (similarity * 10_000.0).round() / 10_000.0;
    rounded.clamp(0.0, 1.0)
}

// Higher similarity ranks first; equal similarities fall back to ascending index.
#[derive(Clone, Copy, Debug)]
struct Ranked(Neighbor);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Ranked {}
impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .similarity
            .total_cmp(&other.0.similarity)
            .then_with(|| other.0.index.cmp(&self.0.index))
    }
}

/// Bounded selection of the best `limit` neighbors.
pub struct TopK {
    heap: BinaryHeap<Reverse<Ranked>>,
    limit: usize,
}

impl TopK {
    pub fn new(limit: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(limit + 1),
            limit,
        }
    }

    pub fn push(&mut self, neighbor: Neighbor) {
        if self.limit == 0 {
            return;
        }
        self.heap.push(Reverse(Ranked(neighbor)));
        if self.heap.len() > self.limit {
            self.heap.pop();
        }
    }

    pub fn merge(mut self, other: TopK) -> TopK {
        for Reverse(Ranked(neighbor)) in other.heap {
            self.push(neighbor);
        }
        self
    }

    /// Best first.
    pub fn into_sorted_vec(self) -> Vec<Neighbor> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(Ranked(neighbor))| neighbor)
            .collect()
    }
}
