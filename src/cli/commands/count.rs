//! Count command - inspect and reset usage counters

use crate::cli::args::{CountAction, CountArgs};
use crate::config::Config;
use crate::counter::UsageCounter;
use crate::error::{RewindError, RewindResult};
use console::style;
use std::path::{Path, PathBuf};

/// Execute the count command
pub async fn execute(args: CountArgs, config: &Config) -> RewindResult<()> {
    match args.action {
        CountAction::Show { path } => {
            let path = resolve_path(path, config)?;
            let usage = UsageCounter::read(&path)?;
            println!("{}", usage.count);
        }
        CountAction::Reset { path } => {
            let path = resolve_path(path, config)?;
            UsageCounter::reset(&path)?;
            println!("{} Reset {}", style("✓").green(), path.display());
        }
    }
    Ok(())
}

fn resolve_path(arg: Option<PathBuf>, config: &Config) -> RewindResult<PathBuf> {
    arg.or_else(|| config.counter.path.clone())
        .filter(|p| p != Path::new(""))
        .ok_or_else(|| {
            RewindError::InvalidInput(
                "no counter file given and counter.path is not configured".to_string(),
            )
        })
}
