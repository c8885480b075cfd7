use std::collections::HashMap;

/// Offline cluster assignment, one label per catalog index.
///
/// Member lists are built once so a cluster's candidate pool is available without
/// scanning every label.
pub struct ClusterPartition {
    labels: Vec<u32>,
    members: HashMap<u32, Vec<usize>>,
}

impl ClusterPartition {
    pub fn new(labels: Vec<u32>) -> Self {
        let mut members: HashMap<u32, Vec<usize>> = HashMap::new();
        for (index, label) in labels.iter().enumerate() {
            members.entry(*label).or_default().push(index);
        }
        Self { labels, members }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, index: usize) -> Option<u32> {
        self.labels.get(index).copied()
    }

    /// Members of `cluster` in ascending index order.
    pub fn members(&self, cluster: u32) -> &[usize] {
        self.members.get(&cluster).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn population(&self, cluster: u32) -> usize {
        self.members(cluster).len()
    }

    pub fn cluster_count(&self) -> usize {
        self.members.len()
    }

    /// `(cluster id, population)` pairs sorted by cluster id.
    pub fn sizes(&self) -> Vec<(u32, usize)> {
        let mut sizes: Vec<(u32, usize)> = self
            .members
            .iter()
            .map(|(cluster, members)| (*cluster, members.len()))
            .collect();
        sizes.sort_unstable_by_key(|(cluster, _)| *cluster);
        sizes
    }
}
