use rand::rngs::StdRng;
use rand::SeedableRng;
use readnext::catalog::{BookRecord, CatalogStore, OutOfRange};
use std::collections::HashSet;

fn book(title: &str, author: &str) -> BookRecord {
    BookRecord {
        index: 0,
        title: title.to_string(),
        author: author.to_string(),
        description: format!("About {title}"),
        genres: vec!["Fiction".to_string()],
    }
}

fn store() -> CatalogStore {
    CatalogStore::new(vec![
        book("Dune", "Frank Herbert"),
        book("Children of Dune", "Frank Herbert"),
        book("Emma", "Jane Austen"),
        book("Dune Messiah", "Frank Herbert"),
        book("The Hobbit", "J.R.R. Tolkien"),
    ])
}

#[test]
fn test_get_returns_book_at_its_own_index() {
    let store = store();
    assert_eq!(store.total(), 5);
    for i in 0..store.total() {
        let book = store.get(i as i64).unwrap();
        assert_eq!(book.index, i);
    }
    assert_eq!(store.get(2).unwrap().title, "Emma");
}

#[test]
fn test_get_rejects_negative_and_past_end() {
    let store = store();
    assert_eq!(
        store.get(-1).unwrap_err(),
        OutOfRange {
            index: -1,
            total: 5
        }
    );
    assert!(store.get(5).is_err());
    assert!(store.get(i64::MAX).is_err());
}

#[test]
fn test_search_is_case_insensitive_and_in_dataset_order() {
    let store = store();
    let titles: Vec<&str> = store
        .search("DUNE", 10)
        .iter()
        .map(|b| b.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Dune", "Children of Dune", "Dune Messiah"]);
}

#[test]
fn test_search_respects_limit() {
    let store = store();
    let hits = store.search("dune", 2);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].index, 0);
    assert_eq!(hits[1].index, 1);
}

#[test]
fn test_search_blank_query_matches_nothing() {
    let store = store();
    assert!(store.search("", 10).is_empty());
    assert!(store.search("   ", 10).is_empty());
    assert!(store.search("zzz", 10).is_empty());
}

#[test]
fn test_search_matches_substring_inside_title() {
    let store = store();
    let hits = store.search("hob", 10);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "The Hobbit");
}

#[test]
fn test_random_sample_is_distinct_and_bounded() {
    let store = store();
    let sample = store.random_sample(3);
    assert_eq!(sample.len(), 3);
    let unique: HashSet<usize> = sample.iter().map(|b| b.index).collect();
    assert_eq!(unique.len(), 3);
    assert!(unique.iter().all(|i| *i < store.total()));

    let everything = store.random_sample(50);
    assert_eq!(everything.len(), store.total());
    let unique: HashSet<usize> = everything.iter().map(|b| b.index).collect();
    assert_eq!(unique.len(), store.total());
}

#[test]
fn test_random_sample_with_seeded_rng_is_reproducible() {
    let store = store();
    let first: Vec<usize> = store
        .random_sample_with(&mut StdRng::seed_from_u64(9), 4)
        .iter()
        .map(|b| b.index)
        .collect();
    let second: Vec<usize> = store
        .random_sample_with(&mut StdRng::seed_from_u64(9), 4)
        .iter()
        .map(|b| b.index)
        .collect();
    assert_eq!(first, second);
}

#[test]
fn test_empty_catalog() {
    let store = CatalogStore::new(Vec::new());
    assert!(store.is_empty());
    assert!(store.random_sample(10).is_empty());
    assert!(store.search("dune", 10).is_empty());
    assert!(store.get(0).is_err());
}
