pub mod resolve;

use anyhow::Context;
use resolve::{resolve, resolve_bool, resolve_opt};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Root holding `data/cat_data.json` and `training/model.bin`.
    pub ml_data_dir: String,
    pub catalog_path: Option<String>,
    pub model_path: Option<String>,
    pub default_top_k: usize,
    pub max_top_k: usize,
    pub default_search_limit: usize,
    pub max_search_limit: usize,
    pub max_query_len: usize,
    pub default_random_count: usize,
    pub max_random_count: usize,
    pub simd_enabled: bool,
    pub parallel_score_min: usize,
    /// 0 keeps rayon's default thread count.
    pub search_threads: usize,
    /// Origins allowed by CORS; `*` allows any.
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            ml_data_dir: "ml".to_string(),
            catalog_path: None,
            model_path: None,
            default_top_k: 5,
            max_top_k: 20,
            default_search_limit: 10,
            max_search_limit: 50,
            max_query_len: 100,
            default_random_count: 10,
            max_random_count: 50,
            simd_enabled: true,
            parallel_score_min: 4_096,
            search_threads: 0,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let bind_addr = match resolve_opt::<String>(Some("--bind"), "BIND_ADDR") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid bind address `{raw}`"))?,
            None => defaults.bind_addr,
        };

        let max_top_k = resolve(Some("--max-top-k"), "MAX_TOP_K", defaults.max_top_k).max(1);
        let max_search_limit = resolve(
            Some("--max-search-limit"),
            "MAX_SEARCH_LIMIT",
            defaults.max_search_limit,
        )
        .max(1);
        let max_random_count = resolve(
            Some("--max-random-count"),
            "MAX_RANDOM_COUNT",
            defaults.max_random_count,
        )
        .max(1);

        let default_top_k = resolve(
            Some("--default-top-k"),
            "DEFAULT_TOP_K",
            defaults.default_top_k,
        );
        let default_search_limit =
            resolve(None, "DEFAULT_SEARCH_LIMIT", defaults.default_search_limit);
        let default_random_count =
            resolve(None, "DEFAULT_RANDOM_COUNT", defaults.default_random_count);

        Ok(Self {
            bind_addr,
            port: resolve(Some("--port"), "PORT", defaults.port),
            ml_data_dir: resolve(Some("--ml-dir"), "ML_DATA_DIR", defaults.ml_data_dir),
            catalog_path: resolve_opt(Some("--catalog"), "CATALOG_PATH"),
            model_path: resolve_opt(Some("--model"), "MODEL_PATH"),
            default_top_k: default_top_k.clamp(1, max_top_k),
            max_top_k,
            default_search_limit: default_search_limit.clamp(1, max_search_limit),
            max_search_limit,
            max_query_len: resolve(None, "MAX_QUERY_LEN", defaults.max_query_len).max(1),
            default_random_count: default_random_count.clamp(1, max_random_count),
            max_random_count,
            simd_enabled: resolve_bool(None, "SIMD_ENABLED", defaults.simd_enabled),
            parallel_score_min: resolve(
                Some("--parallel-score-min"),
                "PARALLEL_SCORE_MIN",
                defaults.parallel_score_min,
            ),
            search_threads: resolve(Some("--search-threads"), "SEARCH_THREADS", 0),
            cors_origins: resolve_opt::<String>(Some("--cors-origins"), "CORS_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .filter(|origins| !origins.is_empty())
                .unwrap_or(defaults.cors_origins),
        })
    }

    pub fn catalog_path(&self) -> PathBuf {
        match &self.catalog_path {
            Some(path) => PathBuf::from(path),
            None => Path::new(&self.ml_data_dir).join("data").join("cat_data.json"),
        }
    }

    pub fn model_path(&self) -> PathBuf {
        match &self.model_path {
            Some(path) => PathBuf::from(path),
            None => Path::new(&self.ml_data_dir).join("training").join("model.bin"),
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
