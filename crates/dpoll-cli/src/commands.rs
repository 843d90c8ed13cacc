use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use dpoll_cli::pipeline::{PipelineError, check, outputs_with_progress};
use dpoll_cli::types::{AggregationProgress, CheckSummary, RunSummary};
use dpoll_validate::ValidationReport;

use crate::cli::DatasetArgs;

/// How an `outputs` run ended when nothing unexpected went wrong.
pub enum OutputsOutcome {
    Written(RunSummary),
    /// Stopped at the validation gate; no table was produced.
    Rejected(ValidationReport),
}

pub fn run_outputs(args: &DatasetArgs) -> Result<OutputsOutcome> {
    let bar = progress_bar(args.no_progress);
    let result = outputs_with_progress(&args.dataset, |progress: AggregationProgress| {
        bar.set_length(progress.total as u64);
        bar.set_position(progress.completed as u64);
    });
    bar.finish_and_clear();
    match result {
        Ok(summary) => Ok(OutputsOutcome::Written(summary)),
        Err(PipelineError::Validation(failure)) => Ok(OutputsOutcome::Rejected(failure.report)),
        Err(error) => Err(error).with_context(|| format!("process {}", args.dataset.display())),
    }
}

pub fn run_check(args: &DatasetArgs) -> Result<CheckSummary> {
    check(&args.dataset).with_context(|| format!("check {}", args.dataset.display()))
}

fn progress_bar(hidden: bool) -> ProgressBar {
    if hidden || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len} tables ({elapsed})")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_message("Aggregating");
    bar
}
