//! catalog-export: Convert the local JSON mirror into a SQL script
//!
//! Usage:
//!   # Export ./db/v1/data into ./db/v1/data/sql/hawapi.sql
//!   catalog-export
//!
//!   # Use another mirror and print the script instead of writing it
//!   catalog-export --db-folder ./mirror --version-tag v2 --stdout
//!
//!   # Allow one more level of child tables
//!   catalog-export --max-child-depth 2

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use catalog_mirror::config::parse_list;
use catalog_mirror::sql::{Exporter, ScriptWriter};
use catalog_mirror::CatalogConfig;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "catalog-export")]
#[command(about = "Convert the local JSON mirror into SQL INSERT statements", long_about = None)]
struct Args {
    /// Root folder of the local mirror
    #[arg(long, env = "DB_FOLDER", default_value = "db")]
    db_folder: String,

    /// API version tag (directory under the mirror root)
    #[arg(long, env = "VERSION", default_value = "v1")]
    version_tag: String,

    /// Script file name inside <data>/sql
    #[arg(long, short = 'o')]
    output: Option<String>,

    /// Print the script to stdout instead of writing the output file
    #[arg(long)]
    stdout: bool,

    /// Comma-separated tables that have a translations table
    #[arg(long)]
    translation_tables: Option<String>,

    /// Comma-separated field names emitted as quoted identifiers
    #[arg(long)]
    special_names: Option<String>,

    /// How many levels of array-of-object fields may become child tables (default: 1)
    #[arg(long)]
    max_child_depth: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    // Build config
    let mut config = CatalogConfig {
        db_folder: args.db_folder.into(),
        version: args.version_tag,
        ..CatalogConfig::default()
    };
    if let Some(name) = args.output {
        config.script_name = name;
    }
    if let Some(tables) = args.translation_tables {
        config.translation_tables = parse_list(&tables);
    }
    if let Some(names) = args.special_names {
        config.special_names = parse_list(&names);
    }
    if let Some(depth) = args.max_child_depth {
        config.max_child_depth = depth;
    }

    let exporter = Exporter::new(config);

    if args.stdout {
        let statements = exporter.render().context("Failed to convert mirror")?;
        let stdout = std::io::stdout();
        let mut writer = ScriptWriter::new(stdout.lock());
        writer.write_statements(&statements)?;
        writer.flush()?;
        return Ok(());
    }

    let stats = exporter.export().context("Failed to convert mirror")?;
    println!(
        "Converted {} table(s), {} record(s) into {} statement(s) (Output: '{}')",
        stats.tables,
        stats.records,
        stats.statements,
        stats.output_path.display()
    );
    Ok(())
}

fn init_tracing(verbose: u8) {
    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
