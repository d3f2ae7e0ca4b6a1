// CLI module - Search the system log or a fixture from the command line

pub mod output;

use crate::client::Client;
use crate::config::{OutputFormat, SearchConfig};
use crate::error::{AslError, Result};
use crate::keys::{KEY_MSG_ID, KEY_UID};
use crate::query::{PredicateExpr, QueryFilter, QueryOp};
use crate::search::{RecordStream, SearchCursor};
use crate::store::{self, MemoryStore, SharedStore};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Entries buffered between the search worker and the printer
const STREAM_CAPACITY: usize = 64;

/// aslkit - Search structured system logs
#[derive(Parser)]
#[command(name = "aslkit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Search profile (.toml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// JSON fixture to search instead of the system log
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    /// Client identity
    #[arg(long, global = true)]
    ident: Option<String>,

    /// Client facility
    #[arg(long, global = true)]
    facility: Option<String>,

    /// Mirror client messages to stderr
    #[arg(long, global = true)]
    stderr: bool,

    /// Connect to the server immediately
    #[arg(long, global = true)]
    no_delay: bool,

    /// Ignore remote control settings
    #[arg(long, global = true)]
    no_remote: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for records
    Search {
        /// Predicate such as Sender=kernel, Level<=3, Message*=boot or RefPID?
        #[arg(short = 'm', long = "match")]
        matches: Vec<String>,

        /// Compare case-insensitively
        #[arg(short = 'i', long)]
        ignore_case: bool,

        /// Only records sent by the current user
        #[arg(long)]
        mine: bool,

        /// Maximum number of records to print (at least 1)
        #[arg(short = 'n', long)]
        limit: Option<NonZeroUsize>,

        /// Output format: table, json or raw
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Show every field of one record
    Show {
        /// Server-assigned message ID
        id: i64,
    },

    /// List the distinct keys of matching records
    Keys {
        /// Predicate such as Sender=kernel
        #[arg(short = 'm', long = "match")]
        matches: Vec<String>,
    },
}

impl Cli {
    /// Run the CLI application
    pub async fn run() -> Result<()> {
        let cli = Cli::parse();
        cli.execute().await
    }

    /// Execute the parsed command
    async fn execute(&self) -> Result<()> {
        let config = self.load_config()?;
        let store = open_store(config.fixture.as_deref())?;
        let client = Client::open(
            &store,
            &config.ident,
            &config.facility,
            config.client_options()?,
        )?;

        let result = match &self.command {
            Commands::Search {
                matches,
                ignore_case,
                mine,
                limit,
                format,
            } => {
                let mut exprs = config.predicate_exprs()?;
                exprs.extend(parse_exprs(matches, *ignore_case || config.ignore_case)?);
                if *mine {
                    exprs.push(current_user_predicate()?);
                }
                let limit = limit.map_or(config.limit, NonZeroUsize::get);
                let format = format.unwrap_or(config.format);
                search(&store, &client, &exprs, limit, format).await
            }

            Commands::Show { id } => show(&store, &client, *id),

            Commands::Keys { matches } => {
                let mut exprs = config.predicate_exprs()?;
                exprs.extend(parse_exprs(matches, config.ignore_case)?);
                list_keys(&store, &client, &exprs)
            }
        };

        client.close();
        result
    }

    /// Load the profile, if any, and apply command-line overrides
    fn load_config(&self) -> Result<SearchConfig> {
        let mut config = match &self.config {
            Some(path) => SearchConfig::from_file(path)?,
            None => SearchConfig::default(),
        };

        if let Some(ref fixture) = self.fixture {
            config.fixture = Some(fixture.clone());
        }
        if let Some(ref ident) = self.ident {
            config.ident = ident.clone();
        }
        if let Some(ref facility) = self.facility {
            config.facility = facility.clone();
        }
        for (enabled, name) in [
            (self.stderr, "stderr"),
            (self.no_delay, "no_delay"),
            (self.no_remote, "no_remote"),
        ] {
            if enabled && !config.options.iter().any(|o| o == name) {
                config.options.push(name.to_string());
            }
        }

        debug!("Effective search config: {:?}", config);
        Ok(config)
    }
}

/// The system log, or an in-memory store loaded from `fixture`
fn open_store(fixture: Option<&Path>) -> Result<SharedStore> {
    match fixture {
        Some(path) => {
            let memory = MemoryStore::from_json_file(path)?;
            debug!("Searching {} fixture records from {}", memory.len(), path.display());
            Ok(Arc::new(memory))
        }
        None => store::system(),
    }
}

/// Parse predicate expressions from the command line
fn parse_exprs(texts: &[String], ignore_case: bool) -> Result<Vec<PredicateExpr>> {
    texts
        .iter()
        .map(|text| {
            let expr: PredicateExpr = text.parse()?;
            Ok(if ignore_case {
                expr.with_casefold()
            } else {
                expr
            })
        })
        .collect()
}

#[cfg(unix)]
fn current_user_predicate() -> Result<PredicateExpr> {
    let uid = nix::unistd::getuid().as_raw();
    Ok(PredicateExpr::new(KEY_UID, uid, QueryOp::EQUAL))
}

#[cfg(not(unix))]
fn current_user_predicate() -> Result<PredicateExpr> {
    Err(AslError::Other(
        "--mine is only supported on Unix".to_string(),
    ))
}

/// Build a filter, run it, and release the filter
fn run_search(store: &SharedStore, client: &Client, exprs: &[PredicateExpr]) -> Result<SearchCursor> {
    let filter = QueryFilter::new(store)?;
    for expr in exprs {
        filter.add(expr);
    }
    let cursor = client.search(&filter);
    filter.release();
    Ok(cursor)
}

async fn search(
    store: &SharedStore,
    client: &Client,
    exprs: &[PredicateExpr],
    limit: usize,
    format: OutputFormat,
) -> Result<()> {
    let cursor = run_search(store, client, exprs)?;
    let mut stream = RecordStream::spawn(cursor, STREAM_CAPACITY.min(limit));

    let mut entries = Vec::new();
    while entries.len() < limit {
        match stream.next().await {
            Some(entry) => entries.push(entry),
            None => break,
        }
    }
    stream.close().await;

    output::print_entries(&entries, format)
}

fn show(store: &SharedStore, client: &Client, id: i64) -> Result<()> {
    let expr = PredicateExpr::new(KEY_MSG_ID, id, QueryOp::EQUAL);
    let cursor = run_search(store, client, std::slice::from_ref(&expr))?;
    let entry = cursor.advance().map(|record| record.to_entry());
    cursor.release();

    match entry {
        Some(entry) => output::print_raw(&entry),
        None => Err(AslError::Other(format!("No record with ID {}", id))),
    }
}

fn list_keys(store: &SharedStore, client: &Client, exprs: &[PredicateExpr]) -> Result<()> {
    let cursor = run_search(store, client, exprs)?;

    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for record in cursor.records() {
        for key in record.keys() {
            if seen.insert(key.clone()) {
                keys.push(key);
            }
        }
    }
    cursor.release();

    output::print_keys(&keys);
    Ok(())
}
