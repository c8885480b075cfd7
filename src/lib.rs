//! Book recommendations from a precomputed content-similarity model.
//!
//! Every book has a dense catalog index shared by three read-only stores: metadata
//! ([`catalog`]), embeddings ([`vector`]) and the offline cluster assignment
//! ([`cluster`]). [`recommend`] ranks a book's cluster-mates by cosine similarity and
//! [`engine::Engine`] ties the stores together once they have been loaded.

pub mod api;
pub mod catalog;
pub mod cluster;
pub mod config;
pub mod engine;
pub mod recommend;
pub mod server;
pub mod vector;
