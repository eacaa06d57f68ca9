//! Records command - inspect and maintain a cache location

use crate::cli::args::{OutputFormat, RecordsAction, RecordsArgs};
use crate::config::Config;
use crate::error::{RewindError, RewindResult};
use crate::record::Record;
use crate::store::lock::remove_lock_file;
use crate::store::{CacheLocation, StoreHandle};
use console::style;
use std::path::{Path, PathBuf};
use tracing::debug;

const HASH_WIDTH: usize = 12;
const INPUT_WIDTH: usize = 60;

/// Execute the records command
pub async fn execute(args: RecordsArgs, config: &Config) -> RewindResult<()> {
    match args.action {
        RecordsAction::List { location, format } => {
            let location = resolve_location(location.as_deref(), config)?;
            list(&location, format)
        }
        RecordsAction::Show { hash, location } => {
            let location = resolve_location(location.as_deref(), config)?;
            show(&location, &hash)
        }
        RecordsAction::Unlock { location } => {
            let location = resolve_location(location.as_deref(), config)?;
            unlock(&location)
        }
    }
}

/// Argument, then `recording.location`, then the current directory
fn resolve_location(arg: Option<&Path>, config: &Config) -> RewindResult<CacheLocation> {
    let path: PathBuf = match arg.or(config.recording.location.as_deref()) {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()
            .map_err(|e| RewindError::io("getting current directory", e))?,
    };
    let location = CacheLocation::resolve(path)?;
    debug!("Using cache location {}", location);
    Ok(location)
}

fn load_sorted(location: &CacheLocation) -> RewindResult<Vec<Record>> {
    let mut records = StoreHandle::new().read_location(location)?;
    records.sort_by(|a, b| a.hash.cmp(&b.hash));
    Ok(records)
}

fn list(location: &CacheLocation, format: OutputFormat) -> RewindResult<()> {
    let records = load_sorted(location)?;

    if records.is_empty() {
        match format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                println!("{} No records at {}", style("i").blue(), location);
            }
        }
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_table(location, &records),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Plain => {
            for record in &records {
                println!("{}", record.hash);
            }
        }
    }

    Ok(())
}

fn print_table(location: &CacheLocation, records: &[Record]) {
    println!("{}", style(location.to_string()).bold());
    println!();
    println!(
        "{:<14} {:<16} {}",
        style("HASH").bold(),
        style("KIND").bold(),
        style("INPUT").bold()
    );
    println!("{}", "-".repeat(14 + 1 + 16 + 1 + INPUT_WIDTH));

    for record in records {
        let kind = record.output_kind().to_string();
        println!(
            "{:<14} {:<16} {}",
            short_hash(&record.hash),
            kind,
            style(truncate(&record.input.to_string(), INPUT_WIDTH)).dim()
        );
    }

    println!();
    println!("{} record(s)", records.len());
}

fn show(location: &CacheLocation, prefix: &str) -> RewindResult<()> {
    let records = load_sorted(location)?;
    let record = find_by_prefix(&records, prefix).map_err(|matches| {
        if matches == 0 {
            RewindError::RecordItemMissing {
                hash: prefix.to_string(),
                input: String::new(),
                file: location.to_string(),
            }
        } else {
            RewindError::InvalidInput(format!(
                "hash prefix '{}' matches {} records",
                prefix, matches
            ))
        }
    })?;

    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

/// The single record whose hash starts with `prefix`, or the number of matches
fn find_by_prefix<'a>(records: &'a [Record], prefix: &str) -> Result<&'a Record, usize> {
    if let Some(exact) = records.iter().find(|r| r.hash == prefix) {
        return Ok(exact);
    }
    let matches: Vec<_> = records
        .iter()
        .filter(|r| !prefix.is_empty() && r.hash.starts_with(prefix))
        .collect();
    match matches.as_slice() {
        [record] => Ok(record),
        other => Err(other.len()),
    }
}

fn unlock(location: &CacheLocation) -> RewindResult<()> {
    let lock_file = location.lock_file();
    if remove_lock_file(&lock_file)? {
        println!("{} Removed {}", style("✓").green(), lock_file.display());
    } else {
        println!("{} No lock file at {}", style("i").blue(), lock_file.display());
    }
    Ok(())
}

fn short_hash(hash: &str) -> &str {
    hash.get(..HASH_WIDTH).unwrap_or(hash)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
