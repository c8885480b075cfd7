use anyhow::Context;
use clap::Parser;
use rand::{rngs::StdRng, Rng, SeedableRng};
use readnext::catalog::{BookRecord, CatalogStore};
use readnext::cluster::ClusterPartition;
use readnext::engine::Engine;
use readnext::recommend::RecommendSettings;
use readnext::vector::EmbeddingStore;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(
    name = "readnext bench",
    version,
    about = "Latency benchmark for cluster-restricted recommendations"
)]
struct BenchCli {
    /// Embedding dimensions to benchmark, comma-separated (e.g. 128,384)
    #[arg(long, default_value = "128,384")]
    dims: String,
    /// Number of synthetic books
    #[arg(long, default_value_t = 10_000)]
    books: usize,
    /// Number of clusters the books are spread over
    #[arg(long, default_value_t = 100)]
    clusters: u32,
    /// Number of recommend calls per mode
    #[arg(long, default_value_t = 2_000)]
    queries: usize,
    /// Neighbors requested per call
    #[arg(long, default_value_t = 10)]
    top_k: usize,
    /// Scoring modes to execute
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values_t = [BenchMode::Scalar, BenchMode::Simd, BenchMode::Parallel]
    )]
    modes: Vec<BenchMode>,
    /// Random seed for reproducible data and query order
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
enum BenchMode {
    Scalar,
    Simd,
    Parallel,
}

impl BenchMode {
    fn label(self) -> &'static str {
        match self {
            BenchMode::Scalar => "scalar",
            BenchMode::Simd => "simd",
            BenchMode::Parallel => "parallel",
        }
    }

    fn settings(self) -> RecommendSettings {
        RecommendSettings {
            simd_enabled: !matches!(self, BenchMode::Scalar),
            parallel_score_min: match self {
                BenchMode::Parallel => 2,
                _ => usize::MAX,
            },
            search_threads: None,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = BenchCli::parse();
    anyhow::ensure!(cli.books > 0, "--books must be > 0");
    anyhow::ensure!(cli.clusters > 0, "--clusters must be > 0");
    let dims = parse_dims(&cli.dims)?;

    let bench_start = Instant::now();
    let mode_labels: Vec<&str> = cli.modes.iter().map(|m| m.label()).collect();
    println!(
        "starting bench: dims={:?} books={} clusters={} queries={} top_k={} modes={:?}",
        dims, cli.books, cli.clusters, cli.queries, cli.top_k, mode_labels
    );

    for dim in dims {
        run_single_dimension(dim, &cli)?;
    }

    println!(
        "bench completed: elapsed={:.2}s",
        bench_start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn run_single_dimension(dim: usize, cli: &BenchCli) -> anyhow::Result<()> {
    let dataset = generate_dataset(dim, cli.books, cli.clusters, cli.seed);
    let queries = generate_queries(cli.books, cli.queries, cli.seed ^ dim as u64);
    println!("--- dimension {dim} ---");

    let mut baseline: Option<Vec<Vec<usize>>> = None;
    for mode in &cli.modes {
        let engine = build_engine(&dataset, mode.settings())
            .with_context(|| format!("build engine for mode {}", mode.label()))?;
        let (stats, ranked) = execute_queries(&engine, &queries, cli.top_k)?;
        let agreement = baseline.as_deref().map(|base| agreement(base, &ranked));
        print_mode_report(*mode, &stats, agreement, cli.top_k);
        if baseline.is_none() {
            baseline = Some(ranked);
        }
    }
    Ok(())
}

struct Dataset {
    embeddings: Vec<Vec<f32>>,
    labels: Vec<u32>,
}

// Each book sits near its cluster's center, so cluster-mates are genuinely similar.
fn generate_dataset(dim: usize, books: usize, clusters: u32, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(dim as u64));
    let centers: Vec<Vec<f32>> = (0..clusters)
        .map(|_| (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect();
    let mut embeddings = Vec::with_capacity(books);
    let mut labels = Vec::with_capacity(books);
    for _ in 0..books {
        let label = rng.gen_range(0..clusters);
        let center = &centers[label as usize];
        embeddings.push(
            center
                .iter()
                .map(|c| c + rng.gen_range(-0.25..0.25))
                .collect(),
        );
        labels.push(label);
    }
    Dataset { embeddings, labels }
}

fn build_engine(dataset: &Dataset, settings: RecommendSettings) -> anyhow::Result<Engine> {
    let books = (0..dataset.labels.len())
        .map(|index| BookRecord {
            index,
            title: format!("Synthetic Book {index}"),
            author: "Bench".to_string(),
            description: String::new(),
            genres: Vec::new(),
        })
        .collect();
    let embeddings = EmbeddingStore::from_rows(dataset.embeddings.clone(), settings.simd_enabled)?;
    let engine = Engine::from_parts(
        CatalogStore::new(books),
        embeddings,
        ClusterPartition::new(dataset.labels.clone()),
        settings,
        None,
    )?;
    Ok(engine)
}

fn generate_queries(books: usize, count: usize, seed: u64) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| rng.gen_range(0..books) as i64).collect()
}

fn execute_queries(
    engine: &Engine,
    queries: &[i64],
    top_k: usize,
) -> anyhow::Result<(LatencyStats, Vec<Vec<usize>>)> {
    let mut latencies = Vec::with_capacity(queries.len());
    let mut ranked = Vec::with_capacity(queries.len());
    for &index in queries {
        let start = Instant::now();
        let result = engine
            .recommend(index, top_k)
            .map_err(|err| anyhow::anyhow!("recommend {index} failed: {err}"))?;
        latencies.push(start.elapsed());
        ranked.push(
            result
                .recommendations
                .iter()
                .map(|r| r.book.index)
                .collect(),
        );
    }
    Ok((LatencyStats::from_samples(&latencies), ranked))
}

fn agreement(baseline: &[Vec<usize>], current: &[Vec<usize>]) -> f32 {
    if baseline.is_empty() || baseline.len() != current.len() {
        return 0.0;
    }
    let same = baseline
        .iter()
        .zip(current)
        .filter(|(a, b)| a == b)
        .count();
    same as f32 / baseline.len() as f32
}

fn parse_dims(raw: &str) -> anyhow::Result<Vec<usize>> {
    let mut dims = Vec::new();
    for part in raw.split(',') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        let dim = trimmed
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("invalid dimension `{trimmed}`"))?;
        anyhow::ensure!(dim > 0, "dimension must be > 0");
        dims.push(dim);
    }
    anyhow::ensure!(!dims.is_empty(), "at least one dimension is required");
    Ok(dims)
}

fn print_mode_report(mode: BenchMode, stats: &LatencyStats, agreement: Option<f32>, k: usize) {
    println!(
        "# mode={} p50={}us p95={}us p99={}us qps={:.2}",
        mode.label(),
        stats.p50,
        stats.p95,
        stats.p99,
        stats.throughput
    );
    match agreement {
        Some(value) => println!("top-{k} lists identical to first mode: {:.2}%", value * 100.0),
        None => println!("top-{k} agreement: n/a (first mode)"),
    }
}

#[derive(Clone, Copy)]
struct LatencyStats {
    p50: u128,
    p95: u128,
    p99: u128,
    throughput: f64,
}

impl LatencyStats {
    fn from_samples(samples: &[Duration]) -> Self {
        if samples.is_empty() {
            return Self {
                p50: 0,
                p95: 0,
                p99: 0,
                throughput: 0.0,
            };
        }
        let mut micros: Vec<u128> = samples.iter().map(|d| d.as_micros()).collect();
        micros.sort_unstable();
        let total: Duration = samples.iter().sum();
        let throughput = if total.as_secs_f64() > 0.0 {
            samples.len() as f64 / total.as_secs_f64()
        } else {
            0.0
        };
        Self {
            p50: percentile(&micros, 50.0),
            p95: percentile(&micros, 95.0),
            p99: percentile(&micros, 99.0),
            throughput,
        }
    }
}

fn percentile(sorted_micros: &[u128], p: f64) -> u128 {
    if sorted_micros.is_empty() {
        return 0;
    }
    let idx = ((p / 100.0) * (sorted_micros.len() as f64 - 1.0)).round() as usize;
    sorted_micros[idx.min(sorted_micros.len() - 1)]
}
