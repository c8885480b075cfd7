//! Cluster-restricted exact nearest-neighbor search.
//!
//! The candidate pool for a source book is the other members of its own cluster.
//! Candidates are scored by brute-force cosine similarity and the best `top_k` are
//! kept, ties broken by ascending catalog index.

mod ranking;

pub use ranking::{report_score, Neighbor, TopK};

use crate::catalog::OutOfRange;
use crate::cluster::ClusterPartition;
use crate::vector::{simd, EmbeddingStore};
use rayon::prelude::*;
use std::sync::OnceLock;

const DEFAULT_PARALLEL_SCORE_MIN: usize = 4_096;
static RAYON_INIT: OnceLock<()> = OnceLock::new();

#[derive(Clone, Debug)]
pub struct RecommendSettings {
    pub simd_enabled: bool,
    /// Candidate pools at least this large are scored on the rayon pool.
    pub parallel_score_min: usize,
    pub search_threads: Option<usize>,
}

impl Default for RecommendSettings {
    fn default() -> Self {
        Self {
            simd_enabled: true,
            parallel_score_min: DEFAULT_PARALLEL_SCORE_MIN,
            search_threads: None,
        }
    }
}

impl RecommendSettings {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            simd_enabled: config.simd_enabled,
            parallel_score_min: config.parallel_score_min.max(2),
            search_threads: (config.search_threads > 0).then_some(config.search_threads),
        }
    }

    pub fn init_rayon(&self) {
        let _ = RAYON_INIT.get_or_init(|| {
            let mut builder = rayon::ThreadPoolBuilder::new();
            if let Some(threads) = self.search_threads {
                builder = builder.num_threads(threads);
            }
            if let Err(err) = builder.build_global() {
                tracing::warn!(error = %err, "rayon pool already initialized");
            }
        });
    }
}

pub struct NeighborSearch<'a> {
    embeddings: &'a EmbeddingStore,
    clusters: &'a ClusterPartition,
    settings: &'a RecommendSettings,
}

impl<'a> NeighborSearch<'a> {
    pub fn new(
        embeddings: &'a EmbeddingStore,
        clusters: &'a ClusterPartition,
        settings: &'a RecommendSettings,
    ) -> Self {
        Self {
            embeddings,
            clusters,
            settings,
        }
    }

    /// Up to `top_k` (at least 1) most similar books sharing `source`'s cluster,
    /// best first. A singleton cluster yields an empty list.
    pub fn neighbors(&self, source: usize, top_k: usize) -> Result<Vec<Neighbor>, OutOfRange> {
        let out_of_range = || OutOfRange {
            index: i64::try_from(source).unwrap_or(i64::MAX),
            total: self.clusters.len(),
        };
        let cluster = self.clusters.label(source).ok_or_else(out_of_range)?;
        let query = self.embeddings.row(source).ok_or_else(out_of_range)?;
        let query_norm = self.embeddings.norm(source).ok_or_else(out_of_range)?;

        let members = self.clusters.members(cluster);
        let pool = members.len().saturating_sub(1);
        if pool == 0 {
            return Ok(Vec::new());
        }
        let limit = top_k.clamp(1, pool);

        let score = |index: usize| Neighbor {
            index,
            similarity: self.similarity(query, query_norm, index),
        };

        let top = if pool >= self.settings.parallel_score_min {
            members
                .par_iter()
                .copied()
                .filter(|&index| index != source)
                .fold(
                    || TopK::new(limit),
                    |mut top, index| {
                        top.push(score(index));
                        top
                    },
                )
                .reduce(|| TopK::new(limit), TopK::merge)
        } else {
            let mut top = TopK::new(limit);
            for &index in members.iter().filter(|&&index| index != source) {
                top.push(score(index));
            }
            top
        };
        Ok(top.into_sorted_vec())
    }

    fn similarity(&self, query: &[f32], query_norm: f64, index: usize) -> f64 {
        match (self.embeddings.row(index), self.embeddings.norm(index)) {
            (Some(row), Some(norm)) => {
                simd::cosine_with_norms(query, query_norm, row, norm, self.settings.simd_enabled)
            }
            _ => 0.0,
        }
    }
}
