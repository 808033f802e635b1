use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use interlink::engine::Analyzer;
use interlink::ops::telemetry;
use interlink::persistence::{export_report, DatasetLoader};
use interlink::EngineConfig;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Parser, Debug)]
#[command(
    name = "interlink",
    about = "Scores pages for internal-link priority and proposes source -> target links"
)]
struct Cli {
    /// Crawl export (CSV)
    #[arg(long)]
    crawl: PathBuf,

    /// Search performance export (CSV)
    #[arg(long)]
    gsc: Option<PathBuf>,

    /// Existing internal links export (CSV)
    #[arg(long)]
    inlinks: Option<PathBuf>,

    /// Engine configuration overrides (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory receiving priority.csv, opportunities.csv and statistics.json
    #[arg(long, default_value = "interlink-report")]
    out_dir: PathBuf,

    #[arg(long)]
    top_n: Option<usize>,

    #[arg(long)]
    top_k: Option<usize>,

    #[arg(long)]
    min_similarity: Option<f64>,

    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,

    /// Write Prometheus metrics to this file after the run
    #[arg(long)]
    metrics_out: Option<PathBuf>,
}

impl Cli {
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => EngineConfig::default(),
        };
        if let Some(n) = self.top_n {
            config.top_n_targets = n;
        }
        if let Some(k) = self.top_k {
            config.top_k_per_target = k;
        }
        if let Some(s) = self.min_similarity {
            config.min_similarity = s;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.log_format {
        LogFormat::Json => telemetry::init_tracing(),
        LogFormat::Pretty => telemetry::init_tracing_pretty(),
    }

    let config = cli.engine_config()?;
    let input = DatasetLoader::new()
        .crawl(&cli.crawl)
        .search(cli.gsc.as_ref())
        .inlinks(cli.inlinks.as_ref())
        .normalize_addresses(config.normalize_addresses)
        .load()
        .context("loading input tables")?;

    let analyzer = Analyzer::new(input, config).context("invalid engine configuration")?;
    let report = analyzer.run()?;

    let written = export_report(&cli.out_dir, &report)
        .with_context(|| format!("writing report to {}", cli.out_dir.display()))?;
    for path in &written {
        tracing::info!(path = %path.display(), "Wrote report file");
    }

    if let Some(path) = &cli.metrics_out {
        std::fs::write(path, telemetry::get_metrics_string())
            .with_context(|| format!("writing metrics to {}", path.display()))?;
    }

    Ok(())
}
