use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gdata_calendar::config::Config;
use gdata_calendar::data::{BatchInfo, BatchOperation, Feed};
use gdata_calendar::xml::QuickXmlEngine;
use gdata_calendar::{
    CalendarParserFactory, Entries, Entity, EntryKind, GDataParser, GDataParserFactory,
    GDataSerializer, ParserKind, SerializeFormat,
};

/// Get the config file path (~/.config/gdata-calendar/config.toml)
fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("gdata-calendar")
            .join("config.toml"),
    )
}

#[derive(Parser, Debug)]
#[command(name = "gcal", about = "Parse and write GData calendar feeds")]
struct Args {
    /// Config file (defaults to ~/.config/gdata-calendar/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a feed (or a single entry) and print it as JSON
    Parse {
        /// Entry type: calendar, calendar-feed or event
        #[arg(long = "type", value_name = "TAG", default_value = "event")]
        kind: EntryKind,

        /// The document is a single <entry> rather than a feed
        #[arg(long)]
        standalone: bool,

        file: PathBuf,
    },

    /// Read a single event entry and write it back in the given format
    Convert {
        /// create, update or full
        #[arg(long, value_name = "FORMAT", default_value = "full")]
        format: SerializeFormat,

        file: PathBuf,
    },

    /// Turn an events feed into a batch request on stdout
    Batch {
        /// Operation for entries that do not carry one (insert, update, delete, query)
        #[arg(long, value_name = "OP", value_parser = parse_operation)]
        operation: Option<BatchOperation>,

        file: PathBuf,
    },
}

fn parse_operation(value: &str) -> Result<BatchOperation, String> {
    BatchOperation::from_wire(value).ok_or_else(|| format!("unknown batch operation '{}'", value))
}

#[derive(Serialize)]
struct ParsedFeed {
    kind: ParserKind,
    feed: Feed,
    entries: Vec<Entity>,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays a clean document
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match args.config.or_else(default_config_path) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load config from '{}'", path.display()))?,
        None => Config::default(),
    };
    let factory = CalendarParserFactory::new(Arc::new(QuickXmlEngine::from_config(&config)));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match args.command {
        Command::Parse {
            kind,
            standalone,
            file,
        } => {
            let mut parser = factory.create_parser(kind, open(&file)?)?;
            if standalone {
                let entity = parser
                    .parse_standalone_entry()
                    .with_context(|| format!("Failed to parse entry '{}'", file.display()))?;
                serde_json::to_writer_pretty(&mut out, &entity)?;
            } else {
                let feed = parser
                    .parse_feed_envelope()
                    .with_context(|| format!("Failed to parse feed '{}'", file.display()))?;
                let entries = Entries::new(parser.as_mut())
                    .collect::<Result<Vec<_>, _>>()
                    .with_context(|| format!("Failed to parse entries of '{}'", file.display()))?;
                let parsed = ParsedFeed {
                    kind: parser.kind(),
                    feed,
                    entries,
                };
                serde_json::to_writer_pretty(&mut out, &parsed)?;
            }
            writeln!(out)?;
        }
        Command::Convert { format, file } => {
            convert(&factory, open(&file)?, format, &mut out)
                .with_context(|| format!("Failed to convert '{}'", file.display()))?;
            writeln!(out)?;
        }
        Command::Batch { operation, file } => {
            let mut parser = factory.create_default_feed_parser(open(&file)?)?;
            let mut entries = Entries::new(&mut parser)
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Failed to parse entries of '{}'", file.display()))?;
            for (index, entity) in entries.iter_mut().enumerate() {
                if let Entity::Event(event) = entity {
                    assign_batch_info(&mut event.base.batch, operation, index);
                }
            }

            factory
                .create_batch_serializer(&entries)?
                .serialize(&mut out, SerializeFormat::Batch)
                .context("Failed to write batch feed")?;
            writeln!(out)?;
        }
    }

    Ok(())
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open '{}': check the path", path.display()))?;
    Ok(BufReader::new(file))
}

/// Read one standalone event entry and write it back in `format`.
fn convert<R: BufRead>(
    factory: &CalendarParserFactory,
    reader: R,
    format: SerializeFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let entity = factory
        .create_default_feed_parser(reader)?
        .parse_standalone_entry()
        .context("Failed to parse entry")?;
    factory
        .create_serializer(&entity)?
        .serialize(out, format)
        .context("Failed to write entry")?;
    Ok(())
}

/// Entries keep an operation they already carry; `operation` fills the gaps.
fn assign_batch_info(batch: &mut Option<BatchInfo>, operation: Option<BatchOperation>, index: usize) {
    let info = batch.get_or_insert_with(BatchInfo::default);
    if info.operation.is_none() {
        info.operation = operation;
    }
    if info.id.is_none() {
        info.id = Some(format!("item-{}", index + 1));
    }
    // Request documents never carry a response status
    info.status = None;
}
