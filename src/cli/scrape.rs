//! Scrape command implementation.

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{Cli, CliError};
use crate::catalog::pkmncards::PkmnCardsSource;
use crate::http::HttpAssetFetcher;
use crate::output::OutputLayout;
use crate::pipeline::config::{
    DEFAULT_CHECKPOINT_EVERY, DEFAULT_MAX_ATTEMPTS, DEFAULT_WORKERS,
};
use crate::pipeline::{Pipeline, PipelineConfig, RetryPolicy, Summary};
use crate::resume::FsResumeIndex;
use crate::scan::ScanPlanner;
use crate::shutdown::SharedShutdown;

/// Maximum allowed worker count to prevent self-inflicted rate limiting
const MAX_WORKERS: usize = 32;

/// Worker count under the fast preset.
const FAST_WORKERS: usize = 8;
/// Request spacing under the fast preset.
const FAST_DELAY_SECS: f64 = 0.05;

/// Parse and validate the worker count.
fn parse_workers(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("workers must be at least 1".to_string());
    }
    if value > MAX_WORKERS {
        return Err(format!("workers {value} exceeds maximum of {MAX_WORKERS}"));
    }
    Ok(value)
}

/// Parse a non-negative delay in seconds.
fn parse_delay(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if !value.is_finite() || value < 0.0 {
        return Err("delay must be a non-negative number of seconds".to_string());
    }
    Ok(value)
}

/// Arguments for the scrape command
#[derive(Parser, Debug)]
pub struct ScrapeArgs {
    /// Minimum delay between request starts, in seconds
    #[arg(long, default_value = "0.1", value_parser = parse_delay)]
    pub delay: f64,

    /// Download with multiple concurrent workers
    #[arg(long, default_value_t = false)]
    pub parallel: bool,

    /// Number of concurrent download workers (max: 32); only used with --parallel
    #[arg(long, default_value_t = DEFAULT_WORKERS, value_parser = parse_workers)]
    pub workers: usize,

    /// Fast preset: parallel with 8 workers and a 0.05s delay
    #[arg(long, default_value_t = false)]
    pub fast: bool,

    /// Skip the counting pass before downloading
    #[arg(long, default_value_t = false)]
    pub skip_scan: bool,

    /// Maximum fetch attempts per card (range: 1-10)
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_attempts: u32,

    /// Checkpoint the metadata catalog every this many cards
    #[arg(long, default_value_t = DEFAULT_CHECKPOINT_EVERY, value_parser = clap::value_parser!(u64).range(1..))]
    pub checkpoint_every: u64,
}

impl ScrapeArgs {
    /// Resolve the effective pipeline configuration, applying the fast
    /// preset and the single-worker fallback for non-parallel runs.
    fn pipeline_config(&self) -> PipelineConfig {
        let (parallel, workers, delay) = if self.fast {
            (true, FAST_WORKERS, FAST_DELAY_SECS)
        } else {
            (self.parallel, self.workers, self.delay)
        };

        PipelineConfig {
            workers: if parallel { workers } else { 1 },
            request_spacing: Duration::from_secs_f64(delay),
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                ..RetryPolicy::default()
            },
            checkpoint_every: self.checkpoint_every,
        }
    }

    /// Execute the scrape command.
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let config = self.pipeline_config();
        let layout = OutputLayout::new(&cli.output);
        let source = Arc::new(PkmnCardsSource::new(&cli.base_url, config.retry));

        let expected_total = if self.skip_scan {
            None
        } else {
            let report = ScanPlanner::scan(&*source).await?;
            println!("{}", report.render());
            Some(report.total_items())
        };

        let resume = Arc::new(FsResumeIndex::build(layout.clone())?);
        let fetcher = Arc::new(HttpAssetFetcher::new());

        info!(
            output = %cli.output.display(),
            workers = config.workers,
            delay_ms = config.request_spacing.as_millis() as u64,
            "scrape starting"
        );

        let mut pipeline =
            Pipeline::new(source, fetcher, resume, layout, config).with_shutdown(shutdown);
        if let Some(total) = expected_total {
            pipeline = pipeline.with_expected_total(total);
        }

        let summary = pipeline.run().await?;
        print_summary(&summary);
        Ok(())
    }
}

fn print_summary(summary: &Summary) {
    println!();
    println!("{}", summary.render());
}
