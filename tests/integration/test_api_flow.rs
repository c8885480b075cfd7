use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use readnext::api::router;
use readnext::catalog::{BookRecord, CatalogStore};
use readnext::cluster::ClusterPartition;
use readnext::config::Config;
use readnext::engine::{Engine, EngineSlot};
use readnext::recommend::RecommendSettings;
use readnext::vector::EmbeddingStore;
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

fn library() -> Engine {
    let titles = [
        ("Dune", "Frank Herbert"),
        ("Dune Messiah", "Frank Herbert"),
        ("Children of Dune", "Frank Herbert"),
        ("Emma", "Jane Austen"),
        ("Persuasion", "Jane Austen"),
        ("The Hobbit", "J.R.R. Tolkien"),
    ];
    let books = titles
        .iter()
        .map(|(title, author)| BookRecord {
            index: 0,
            title: title.to_string(),
            author: author.to_string(),
            description: format!("{title} by {author}"),
            genres: vec!["Fiction".to_string()],
        })
        .collect();
    let rows = vec![
        vec![1.0, 0.0, 0.0],
        vec![0.9, 0.1, 0.0],
        vec![0.8, 0.3, 0.0],
        vec![0.0, 1.0, 0.1],
        vec![0.1, 0.9, 0.0],
        vec![0.0, 0.0, 1.0],
    ];
    Engine::from_parts(
        CatalogStore::new(books),
        EmbeddingStore::from_rows(rows, true).unwrap(),
        ClusterPartition::new(vec![0, 0, 0, 1, 1, 2]),
        RecommendSettings::default(),
        None,
    )
    .unwrap()
}

fn app() -> Router {
    router(EngineSlot::ready(library()), Config::default())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_recommend(app: Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/recommend")
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health_reports_catalog_size() {
    let (status, body) = get_json(app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["total_books"], 6);
}

#[tokio::test]
async fn test_search_flow() {
    let app = app();
    let (status, body) = get_json(app.clone(), "/books/search?q=dune").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "dune");
    assert_eq!(body["count"], 3);
    let indices: Vec<u64> = body["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["index"].as_u64().unwrap())
        .collect();
    assert_eq!(indices, vec![0, 1, 2]);

    let (_, body) = get_json(app.clone(), "/books/search?q=DUNE&limit=1").await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["books"][0]["title"], "Dune");

    let (_, body) = get_json(app, "/books/search?q=zebra").await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_search_validation() {
    let app = app();
    for uri in [
        "/books/search",
        "/books/search?q=",
        "/books/search?q=dune&limit=0",
        "/books/search?q=dune&limit=51",
        "/books/search?q=dune&limit=ten",
    ] {
        let (status, body) = get_json(app.clone(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "invalid_argument", "{uri}");
    }
    let long = "a".repeat(101);
    let (status, _) = get_json(app, &format!("/books/search?q={long}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_random_flow() {
    let app = app();
    let (status, body) = get_json(app.clone(), "/books/random?count=4").await;
    assert_eq!(status, StatusCode::OK);
    let books = body.as_array().unwrap();
    assert_eq!(books.len(), 4);
    let mut seen: Vec<u64> = books.iter().map(|b| b["index"].as_u64().unwrap()).collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 4);

    let (_, body) = get_json(app.clone(), "/books/random/").await;
    assert_eq!(body.as_array().unwrap().len(), 6);

    let (status, _) = get_json(app, "/books/random?count=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_book_flow() {
    let app = app();
    let (status, body) = get_json(app.clone(), "/books/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["index"], 3);
    assert_eq!(body["title"], "Emma");
    assert_eq!(body["author"], "Jane Austen");
    assert_eq!(body["genres"], json!(["Fiction"]));

    let (status, body) = get_json(app.clone(), "/books/6").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "out_of_range");

    let (status, _) = get_json(app.clone(), "/books/-1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get_json(app, "/books/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommend_flow() {
    let app = app();
    let (status, body) = post_recommend(app.clone(), json!({"book_index": 0, "top_k": 5})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source_book"]["title"], "Dune");
    let recs = body["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0]["index"], 1);
    assert_eq!(recs[1]["index"], 2);
    let first = recs[0]["similarity_score"].as_f64().unwrap();
    let second = recs[1]["similarity_score"].as_f64().unwrap();
    assert!(first >= second);
    assert!((0.0..=1.0).contains(&second));

    let (status, body) = post_recommend(app.clone(), json!({"book_index": 5})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recommendations"], json!([]));

    let (status, body) = post_recommend(app.clone(), json!({"book_index": 3, "top_k": 0})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 1);
    assert_eq!(body["recommendations"][0]["title"], "Persuasion");

    let (status, body) = post_recommend(app, json!({"book_index": 99})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "out_of_range");
}
