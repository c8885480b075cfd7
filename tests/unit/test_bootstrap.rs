use readnext::catalog::TableError;
use readnext::engine::load::{load_engine, read_catalog};
use readnext::engine::{ArtifactPaths, LoadError, ModelConfig, ModelPackage};
use readnext::recommend::RecommendSettings;
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_catalog(dir: &Path, value: serde_json::Value) -> PathBuf {
    let path = dir.join("cat_data.json");
    std::fs::write(&path, value.to_string()).unwrap();
    path
}

fn write_bincode_model(dir: &Path, package: &ModelPackage) -> PathBuf {
    let path = dir.join("model.bin");
    std::fs::write(&path, bincode::serialize(package).unwrap()).unwrap();
    path
}

fn write_json_model(dir: &Path, package: &ModelPackage) -> PathBuf {
    let path = dir.join("model.json");
    std::fs::write(&path, serde_json::to_vec(package).unwrap()).unwrap();
    path
}

fn three_books() -> serde_json::Value {
    json!([
        {"Book": "Dune", "Author": "Frank Herbert", "Description": "Desert planet",
         "Genres": "Science Fiction, Classics"},
        {"Book": "Dune Messiah", "Author": "Frank Herbert", "Description": "Sequel",
         "Genres": ["Science Fiction"]},
        {"Book": "Emma", "Author": "Jane Austen", "Description": "Matchmaking",
         "Genres": null}
    ])
}

fn three_book_model() -> ModelPackage {
    ModelPackage {
        embeddings: vec![vec![1.0, 0.0, 0.0], vec![0.9, 0.1, 0.0], vec![0.0, 0.0, 1.0]],
        cluster_labels: vec![0, 0, 1],
        n_books: Some(3),
        n_features: Some(3),
        feature_names: vec!["a".into(), "b".into(), "c".into()],
        config: Some(ModelConfig {
            n_clusters: Some(2),
            n_neighbors: Some(6),
            metric: Some("cosine".into()),
            algorithm: Some("brute".into()),
        }),
    }
}

fn settings() -> RecommendSettings {
    RecommendSettings::default()
}

#[test]
fn test_load_bincode_model() {
    let dir = tempdir().unwrap();
    let paths = ArtifactPaths {
        catalog: write_catalog(dir.path(), three_books()),
        model: write_bincode_model(dir.path(), &three_book_model()),
    };
    let (engine, report) = load_engine(&paths, settings()).unwrap();
    assert_eq!(report.books, 3);
    assert_eq!(report.dim, 3);
    assert_eq!(report.clusters, 2);
    assert_eq!(report.defaulted_rows, 0);
    assert_eq!(engine.total(), 3);

    let dune = engine.get(0).unwrap();
    assert_eq!(dune.genres, vec!["Science Fiction", "Classics"]);
    assert!(engine.get(2).unwrap().genres.is_empty());

    let recs = engine.recommend(0, 5).unwrap();
    assert_eq!(recs.recommendations.len(), 1);
    assert_eq!(recs.recommendations[0].book.title, "Dune Messiah");

    let info = engine.model_info();
    assert_eq!(info.config.as_ref().unwrap().n_neighbors, Some(6));
}

#[test]
fn test_load_json_model_and_split_catalog() {
    let dir = tempdir().unwrap();
    let catalog = json!({
        "columns": ["Title", "Author", "Description", "Genres"],
        "data": [
            ["Dune", "Frank Herbert", "Desert planet", "Science Fiction"],
            ["Dune Messiah", "Frank Herbert", "Sequel", "Science Fiction"],
            ["Emma", "Jane Austen", "Matchmaking", "Romance"]
        ]
    });
    let paths = ArtifactPaths {
        catalog: write_catalog(dir.path(), catalog),
        model: write_json_model(dir.path(), &three_book_model()),
    };
    let (engine, _) = load_engine(&paths, settings()).unwrap();
    assert_eq!(engine.get(2).unwrap().title, "Emma");
    assert_eq!(engine.search("dune", 10).len(), 2);
}

#[test]
fn test_missing_artifact_is_reported() {
    let dir = tempdir().unwrap();
    let paths = ArtifactPaths {
        catalog: write_catalog(dir.path(), three_books()),
        model: dir.path().join("absent.bin"),
    };
    let err = load_engine(&paths, settings()).err().unwrap();
    assert!(matches!(err, LoadError::MissingArtifact(ref p) if p.ends_with("absent.bin")));
}

#[test]
fn test_embedding_count_mismatch_is_rejected() {
    let dir = tempdir().unwrap();
    let mut model = three_book_model();
    model.embeddings.pop();
    model.n_books = None;
    let paths = ArtifactPaths {
        catalog: write_catalog(dir.path(), three_books()),
        model: write_bincode_model(dir.path(), &model),
    };
    let err = load_engine(&paths, settings()).err().unwrap();
    assert!(matches!(
        err,
        LoadError::LengthMismatch {
            what: "embeddings",
            expected: 3,
            found: 2
        }
    ));
}

#[test]
fn test_label_count_mismatch_is_rejected() {
    let dir = tempdir().unwrap();
    let mut model = three_book_model();
    model.cluster_labels.push(4);
    let paths = ArtifactPaths {
        catalog: write_catalog(dir.path(), three_books()),
        model: write_bincode_model(dir.path(), &model),
    };
    let err = load_engine(&paths, settings()).err().unwrap();
    assert!(matches!(
        err,
        LoadError::LengthMismatch {
            what: "cluster labels",
            ..
        }
    ));
}

#[test]
fn test_declared_book_count_must_match() {
    let dir = tempdir().unwrap();
    let mut model = three_book_model();
    model.n_books = Some(10);
    let paths = ArtifactPaths {
        catalog: write_catalog(dir.path(), three_books()),
        model: write_bincode_model(dir.path(), &model),
    };
    assert!(matches!(
        load_engine(&paths, settings()).err().unwrap(),
        LoadError::LengthMismatch { found: 10, .. }
    ));
}

#[test]
fn test_ragged_embeddings_are_rejected() {
    let dir = tempdir().unwrap();
    let mut model = three_book_model();
    model.embeddings[1] = vec![1.0, 2.0];
    let paths = ArtifactPaths {
        catalog: write_catalog(dir.path(), three_books()),
        model: write_bincode_model(dir.path(), &model),
    };
    assert!(matches!(
        load_engine(&paths, settings()).err().unwrap(),
        LoadError::Embedding(_)
    ));
}

#[test]
fn test_declared_feature_count_must_match() {
    let dir = tempdir().unwrap();
    let mut model = three_book_model();
    model.n_features = Some(384);
    let paths = ArtifactPaths {
        catalog: write_catalog(dir.path(), three_books()),
        model: write_bincode_model(dir.path(), &model),
    };
    assert!(matches!(
        load_engine(&paths, settings()).err().unwrap(),
        LoadError::FeatureMismatch {
            declared: 384,
            dim: 3
        }
    ));
}

#[test]
fn test_catalog_without_title_column_is_rejected() {
    let dir = tempdir().unwrap();
    let path = write_catalog(dir.path(), json!([{"Name": "Dune", "Author": "Frank Herbert"}]));
    assert!(matches!(
        read_catalog(&path).err().unwrap(),
        LoadError::Table(TableError::MissingColumn("title"))
    ));
}

#[test]
fn test_corrupt_model_is_rejected() {
    let dir = tempdir().unwrap();
    let model = dir.path().join("model.bin");
    std::fs::write(&model, b"not a model").unwrap();
    let paths = ArtifactPaths {
        catalog: write_catalog(dir.path(), three_books()),
        model,
    };
    assert!(matches!(
        load_engine(&paths, settings()).err().unwrap(),
        LoadError::Model { .. }
    ));
}

#[test]
fn test_missing_fields_are_default_filled() {
    let dir = tempdir().unwrap();
    let path = write_catalog(
        dir.path(),
        json!([
            {"title": "Dune"},
            {"title": "Emma", "author": null, "description": "Matchmaking", "genres": "Romance"}
        ]),
    );
    let parsed = read_catalog(&path).unwrap();
    assert_eq!(parsed.defaulted_rows, 2);
    let dune = &parsed.books[0];
    assert_eq!(dune.author, "Unknown");
    assert_eq!(dune.description, "");
    assert!(dune.genres.is_empty());
    assert_eq!(parsed.books[1].author, "Unknown");
    assert_eq!(parsed.books[1].genres, vec!["Romance"]);
}
