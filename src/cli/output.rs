// Output formatting and display for CLI

use crate::config::OutputFormat;
use crate::error::{AslError, Result};
use crate::keys::{Level, KEY_TIME};
use crate::search::{Entry, LogFields};
use chrono::{DateTime, Local, Utc};
use colored::*;
use std::io::{self, Write};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

/// Print search results in the requested format
pub fn print_entries(entries: &[Entry], format: OutputFormat) -> Result<()> {
    let stdout = io::stdout();
    write_entries(&mut stdout.lock(), entries, format)
}

/// Write search results to `out`.
///
/// JSON and raw output carry records only; their empty-result notice goes to
/// stderr so the stream stays machine-readable.
fn write_entries<W: Write>(out: &mut W, entries: &[Entry], format: OutputFormat) -> Result<()> {
    if entries.is_empty() {
        match format {
            OutputFormat::Table => writeln!(out, "{}", "No matching records".yellow())?,
            OutputFormat::Json | OutputFormat::Raw => {
                eprintln!("{}", "No matching records".yellow())
            }
        }
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_table(entries),
        OutputFormat::Json => {
            for entry in entries {
                let line = serde_json::to_string(entry)
                    .map_err(|e| AslError::Serialization(e.to_string()))?;
                writeln!(out, "{}", line)?;
            }
        }
        OutputFormat::Raw => {
            for (index, entry) in entries.iter().enumerate() {
                if index > 0 {
                    writeln!(out)?;
                }
                write_raw(out, entry)?;
            }
        }
    }

    Ok(())
}

/// Print every field of one entry as key=value lines
pub fn print_raw(entry: &Entry) -> Result<()> {
    let stdout = io::stdout();
    write_raw(&mut stdout.lock(), entry)
}

fn write_raw<W: Write>(out: &mut W, entry: &Entry) -> Result<()> {
    for (key, value) in entry.iter() {
        writeln!(out, "{}={}", key.bold(), value)?;
    }
    Ok(())
}

/// Print a list of keys
pub fn print_keys(keys: &[String]) {
    if keys.is_empty() {
        println!("{}", "No matching records".yellow());
        return;
    }
    for key in keys {
        println!("{}", key);
    }
    println!(
        "{}",
        format!("Total: {} key(s)", keys.len()).dimmed().italic()
    );
}

/// Print an error message to stderr
pub fn print_error(error: &str) {
    eprintln!("{} {}", "✗ Error:".red().bold(), error);
}

/// Print a formatted table of entries
fn print_table(entries: &[Entry]) {
    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "Time")]
        time: String,
        #[tabled(rename = "Level")]
        level: String,
        #[tabled(rename = "Sender")]
        sender: String,
        #[tabled(rename = "PID")]
        pid: String,
        #[tabled(rename = "Message")]
        message: String,
    }

    let rows: Vec<EntryRow> = entries
        .iter()
        .map(|e| EntryRow {
            time: format_time(e),
            level: format_level_colored(e),
            sender: truncate(&e.sender(), 24),
            pid: match e.pid() {
                0 => "-".to_string(),
                pid => pid.to_string(),
            },
            message: truncate(&e.message(), 72),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    println!("\n{}\n", table);
    println!(
        "{}",
        format!("Total: {} record(s)", entries.len())
            .dimmed()
            .italic()
    );
}

/// Local time of an entry, "-" when it carries no timestamp
fn format_time(entry: &Entry) -> String {
    if entry.get(KEY_TIME).is_none() {
        return "-".to_string();
    }
    let time: DateTime<Utc> = entry.time();
    let local: DateTime<Local> = time.into();
    local.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format a level with color coding
fn format_level_colored(entry: &Entry) -> String {
    match entry.severity() {
        Some(level @ (Level::Emergency | Level::Alert | Level::Critical)) => {
            level.to_string().red().bold().to_string()
        }
        Some(Level::Error) => Level::Error.to_string().red().to_string(),
        Some(Level::Warning) => Level::Warning.to_string().yellow().to_string(),
        Some(Level::Notice) => Level::Notice.to_string().cyan().to_string(),
        Some(Level::Info) => Level::Info.to_string(),
        Some(Level::Debug) => Level::Debug.to_string().bright_black().to_string(),
        None => entry.level().to_string().dimmed().to_string(),
    }
}

/// Truncate a string to a maximum number of characters
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
