pub mod load;
mod slot;

pub use load::{ArtifactPaths, LoadError, LoadReport, ModelConfig, ModelPackage};
pub use slot::{EngineSlot, LoadStatus};

use crate::catalog::{resolve_index, BookRecord, CatalogStore, OutOfRange};
use crate::cluster::ClusterPartition;
use crate::config::Config;
use crate::recommend::{NeighborSearch, RecommendSettings};
use crate::vector::EmbeddingStore;
use serde::Serialize;
use std::sync::Arc;

/// Loaded recommender state. Cheap to clone; immutable once built.
#[derive(Clone)]
pub struct Engine(Arc<Inner>);

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    OutOfRange(#[from] OutOfRange),
    #[error("service not ready")]
    NotReady,
}

struct Inner {
    catalog: CatalogStore,
    embeddings: EmbeddingStore,
    clusters: ClusterPartition,
    settings: RecommendSettings,
    model: ModelInfo,
}

#[derive(Clone, Debug, Serialize)]
pub struct ModelInfo {
    pub books: usize,
    pub dim: usize,
    pub clusters: usize,
    pub config: Option<ModelConfig>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub book: BookRecord,
    pub similarity_score: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Recommendations {
    pub source_book: BookRecord,
    pub recommendations: Vec<Recommendation>,
}

impl Engine {
    /// Reads both artifacts named by `config` and builds the engine.
    pub fn load(config: &Config) -> Result<(Self, LoadReport), LoadError> {
        let settings = RecommendSettings::from_config(config);
        settings.init_rayon();
        load::load_engine(&ArtifactPaths::from_config(config), settings)
    }

    /// Assembles the engine from already-built stores. All three must describe the
    /// same number of books.
    pub fn from_parts(
        catalog: CatalogStore,
        embeddings: EmbeddingStore,
        clusters: ClusterPartition,
        settings: RecommendSettings,
        provenance: Option<ModelConfig>,
    ) -> Result<Self, LoadError> {
        let books = catalog.total();
        if embeddings.len() != books {
            return Err(LoadError::LengthMismatch {
                what: "embeddings",
                expected: books,
                found: embeddings.len(),
            });
        }
        if clusters.len() != books {
            return Err(LoadError::LengthMismatch {
                what: "cluster labels",
                expected: books,
                found: clusters.len(),
            });
        }
        let model = ModelInfo {
            books,
            dim: embeddings.dim(),
            clusters: clusters.cluster_count(),
            config: provenance,
        };
        Ok(Self(Arc::new(Inner {
            catalog,
            embeddings,
            clusters,
            settings,
            model,
        })))
    }

    pub fn total(&self) -> usize {
        self.0.catalog.total()
    }

    pub fn model_info(&self) -> &ModelInfo {
        &self.0.model
    }

    pub fn get(&self, index: i64) -> Result<BookRecord, EngineError> {
        Ok(self.0.catalog.get(index)?.clone())
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<BookRecord> {
        self.0
            .catalog
            .search(query, limit)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn random(&self, count: usize) -> Vec<BookRecord> {
        self.0
            .catalog
            .random_sample(count)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn cluster_of(&self, index: i64) -> Result<u32, EngineError> {
        let index = resolve_index(index, self.total())?;
        // Lengths were checked in from_parts.
        Ok(self.0.clusters.label(index).unwrap_or_default())
    }

    pub fn cluster_population(&self, index: i64) -> Result<usize, EngineError> {
        let cluster = self.cluster_of(index)?;
        Ok(self.0.clusters.population(cluster))
    }

    /// `(cluster id, population)` pairs sorted by cluster id.
    pub fn cluster_sizes(&self) -> Vec<(u32, usize)> {
        self.0.clusters.sizes()
    }

    /// Most similar books from the source's own cluster, best first.
    pub fn recommend(&self, index: i64, top_k: usize) -> Result<Recommendations, EngineError> {
        let source = self.0.catalog.get(index)?;
        let search = NeighborSearch::new(&self.0.embeddings, &self.0.clusters, &self.0.settings);
        let neighbors = search.neighbors(source.index, top_k)?;

        let recommendations = neighbors
            .into_iter()
            .filter_map(|neighbor| {
                let book = self.0.catalog.get_at(neighbor.index)?;
                Some(Recommendation {
                    book: book.clone(),
                    similarity_score: neighbor.reported_score(),
                })
            })
            .collect();

        Ok(Recommendations {
            source_book: source.clone(),
            recommendations,
        })
    }
}
