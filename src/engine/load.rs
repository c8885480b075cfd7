//! Startup bootstrap: reads the catalog and model artifacts, checks that they agree
//! on the number of books, and builds the engine in one step.

use super::Engine;
use crate::catalog::{CatalogStore, CatalogTable, ParsedCatalog, TableError};
use crate::cluster::ClusterPartition;
use crate::config::Config;
use crate::recommend::RecommendSettings;
use crate::vector::{EmbeddingError, EmbeddingStore};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

const SCORING_METRIC: &str = "cosine";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("artifact not found: {}", .0.display())]
    MissingArtifact(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog artifact {}: {source}", path.display())]
    Catalog {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("invalid model artifact {}: {reason}", path.display())]
    Model { path: PathBuf, reason: String },
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error("data mismatch: {found} {what} vs {expected} books in catalog")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("model declares {declared} features but embeddings have {dim}")]
    FeatureMismatch { declared: usize, dim: usize },
}

/// Training-time settings carried in the model artifact for provenance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub n_clusters: Option<usize>,
    pub n_neighbors: Option<usize>,
    pub metric: Option<String>,
    pub algorithm: Option<String>,
}

/// Model artifact contents. Only `embeddings` and `cluster_labels` are needed to
/// serve; the rest is checked when present.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelPackage {
    pub embeddings: Vec<Vec<f32>>,
    pub cluster_labels: Vec<u32>,
    #[serde(default)]
    pub n_books: Option<usize>,
    #[serde(default)]
    pub n_features: Option<usize>,
    #[serde(default)]
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub config: Option<ModelConfig>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelFormat {
    Bincode,
    Json,
}

impl ModelFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ModelFormat::Json,
            _ => ModelFormat::Bincode,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub catalog: PathBuf,
    pub model: PathBuf,
}

impl ArtifactPaths {
    pub fn from_config(config: &Config) -> Self {
        Self {
            catalog: config.catalog_path(),
            model: config.model_path(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct LoadReport {
    pub books: usize,
    pub dim: usize,
    pub clusters: usize,
    pub defaulted_rows: usize,
    pub elapsed_ms: u64,
}

/// Loads both artifacts and builds the engine. Nothing is returned unless every
/// consistency check passes.
pub fn load_engine(
    paths: &ArtifactPaths,
    settings: RecommendSettings,
) -> Result<(Engine, LoadReport), LoadError> {
    let started = Instant::now();
    tracing::info!(
        catalog = %paths.catalog.display(),
        model = %paths.model.display(),
        "loading artifacts"
    );

    let parsed = read_catalog(&paths.catalog)?;
    let model = read_model(&paths.model)?;
    let books = parsed.books.len();

    if let Some(declared) = model.n_books {
        if declared != books {
            return Err(LoadError::LengthMismatch {
                what: "declared books",
                expected: books,
                found: declared,
            });
        }
    }
    if model.embeddings.len() != books {
        return Err(LoadError::LengthMismatch {
            what: "embeddings",
            expected: books,
            found: model.embeddings.len(),
        });
    }
    if model.cluster_labels.len() != books {
        return Err(LoadError::LengthMismatch {
            what: "cluster labels",
            expected: books,
            found: model.cluster_labels.len(),
        });
    }

    let embeddings = EmbeddingStore::from_rows(model.embeddings, settings.simd_enabled)?;
    if let Some(declared) = model.n_features {
        if books > 0 && declared != embeddings.dim() {
            return Err(LoadError::FeatureMismatch {
                declared,
                dim: embeddings.dim(),
            });
        }
    }
    if let Some(metric) = model.config.as_ref().and_then(|c| c.metric.as_deref()) {
        if !metric.eq_ignore_ascii_case(SCORING_METRIC) {
            tracing::warn!(metric, "model was fit with a non-cosine metric; serving with cosine");
        }
    }
    if parsed.defaulted_rows > 0 {
        tracing::warn!(
            rows = parsed.defaulted_rows,
            "catalog rows with missing fields were filled with defaults"
        );
    }

    let clusters = ClusterPartition::new(model.cluster_labels);
    let engine = Engine::from_parts(
        CatalogStore::new(parsed.books),
        embeddings,
        clusters,
        settings,
        model.config,
    )?;

    let info = engine.model_info();
    let report = LoadReport {
        books: info.books,
        dim: info.dim,
        clusters: info.clusters,
        defaulted_rows: parsed.defaulted_rows,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    tracing::info!(
        books = report.books,
        dim = report.dim,
        clusters = report.clusters,
        elapsed_ms = report.elapsed_ms,
        "recommender loaded"
    );
    Ok((engine, report))
}

pub fn read_catalog(path: &Path) -> Result<ParsedCatalog, LoadError> {
    let reader = open_artifact(path)?;
    let table: CatalogTable =
        serde_json::from_reader(reader).map_err(|source| LoadError::Catalog {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(table.into_catalog()?)
}

pub fn read_model(path: &Path) -> Result<ModelPackage, LoadError> {
    let reader = open_artifact(path)?;
    let invalid = |reason: String| LoadError::Model {
        path: path.to_path_buf(),
        reason,
    };
    match ModelFormat::from_path(path) {
        ModelFormat::Json => {
            serde_json::from_reader(reader).map_err(|err| invalid(err.to_string()))
        }
        ModelFormat::Bincode => {
            bincode::deserialize_from(reader).map_err(|err| invalid(err.to_string()))
        }
    }
}

fn open_artifact(path: &Path) -> Result<BufReader<File>, LoadError> {
    if !path.exists() {
        return Err(LoadError::MissingArtifact(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}
