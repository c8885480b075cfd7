use anyhow::Context;
use readnext::config::Config;
use readnext::engine::Engine;

const SIZE_BINS: [usize; 8] = [0, 50, 75, 100, 125, 150, 200, 500];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Serve,
    Inspect,
    Recommend { index: i64, top_k: Option<usize> },
}

pub fn parse_command() -> anyhow::Result<Command> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    parse_args(&args)
}

fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let Some(first) = args.first() else {
        return Ok(Command::Serve);
    };
    match first.as_str() {
        "serve" => Ok(Command::Serve),
        "inspect" => Ok(Command::Inspect),
        "recommend" => parse_recommend(&args[1..]),
        _ => Ok(Command::Serve),
    }
}

// Unrecognized flags are left for Config::from_env.
fn parse_recommend(args: &[String]) -> anyhow::Result<Command> {
    let mut index = None;
    let mut top_k = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--index" => {
                let raw = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--index requires a value"))?;
                index = Some(
                    raw.parse()
                        .with_context(|| format!("invalid book index `{raw}`"))?,
                );
            }
            "--top-k" => {
                let raw = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--top-k requires a value"))?;
                top_k = Some(raw.parse().with_context(|| format!("invalid top-k `{raw}`"))?);
            }
            _ => {}
        }
    }
    let index = index.ok_or_else(|| anyhow::anyhow!("recommend requires --index <n>"))?;
    Ok(Command::Recommend { index, top_k })
}

pub fn run_inspect(config: &Config) -> anyhow::Result<()> {
    let (engine, report) = Engine::load(config).context("load artifacts")?;
    let info = engine.model_info();
    println!("books:          {}", info.books);
    println!("dimensions:     {}", info.dim);
    println!("clusters:       {}", info.clusters);
    println!("defaulted rows: {}", report.defaulted_rows);
    println!("load time:      {} ms", report.elapsed_ms);
    if let Some(model) = &info.config {
        println!(
            "trained with:   n_clusters={:?} n_neighbors={:?} metric={:?} algorithm={:?}",
            model.n_clusters, model.n_neighbors, model.metric, model.algorithm
        );
    }

    let sizes: Vec<usize> = engine.cluster_sizes().into_iter().map(|(_, n)| n).collect();
    println!("cluster size distribution:");
    for window in SIZE_BINS.windows(2) {
        let (low, high) = (window[0], window[1]);
        let count = sizes.iter().filter(|&&n| n >= low && n < high).count();
        println!("  {low:3}-{high:3} books: {count:2} clusters");
    }
    let last = SIZE_BINS[SIZE_BINS.len() - 1];
    let count = sizes.iter().filter(|&&n| n >= last).count();
    println!("  {last:3}+    books: {count:2} clusters");
    let singletons = sizes.iter().filter(|&&n| n == 1).count();
    println!("singleton clusters (no recommendations): {singletons}");
    Ok(())
}

pub fn run_recommend(config: &Config, index: i64, top_k: Option<usize>) -> anyhow::Result<()> {
    let (engine, _) = Engine::load(config).context("load artifacts")?;
    let top_k = top_k.unwrap_or(config.default_top_k);
    let result = engine
        .recommend(index, top_k)
        .map_err(|err| anyhow::anyhow!("recommend failed: {err}"))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
