//! Scan command implementation.

use clap::Parser;

use super::{Cli, CliError};
use crate::catalog::pkmncards::PkmnCardsSource;
use crate::pipeline::RetryPolicy;
use crate::scan::ScanPlanner;

/// Arguments for the scan command
#[derive(Parser, Debug)]
pub struct ScanArgs {}

impl ScanArgs {
    /// Execute the scan command.
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let source = PkmnCardsSource::new(&cli.base_url, RetryPolicy::default());
        let report = ScanPlanner::scan(&source).await?;
        println!("{}", report.render());
        Ok(())
    }
}
