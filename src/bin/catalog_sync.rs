//! catalog-sync: Replay queued mutations against the remote catalog API
//!
//! Reads `./requests/requests.json` (or `<db-folder>/requests.json` with
//! `--dev`), sends every request, mirrors accepted changes into the local
//! JSON store, writes the outcomes next to it and empties the queue.
//!
//! Usage:
//!   API_URL=https://example.com/api TOKEN=... catalog-sync
//!   catalog-sync --dev --api-url http://localhost:8080/api --token dev

use anyhow::{Context, Result};
use catalog_mirror::sync::{ping, sync_files, HttpRemote};
use catalog_mirror::{CatalogConfig, LocalStore, RemoteConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "catalog-sync")]
#[command(about = "Replay queued catalog mutations against the remote API", long_about = None)]
struct Args {
    /// Base URL of the remote API
    #[arg(long, env = "API_URL")]
    api_url: String,

    /// Bearer token for mutations
    #[arg(long, env = "TOKEN", hide_env_values = true)]
    token: String,

    /// Root folder of the local mirror
    #[arg(long, env = "DB_FOLDER", default_value = "db")]
    db_folder: String,

    /// API version tag
    #[arg(long, env = "VERSION", default_value = "v1")]
    version_tag: String,

    /// Read requests from and write outcomes to the mirror folder
    #[arg(long)]
    dev: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = CatalogConfig {
        db_folder: PathBuf::from(&args.db_folder),
        version: args.version_tag.clone(),
        ..CatalogConfig::default()
    };
    let remote = HttpRemote::new(RemoteConfig::new(args.api_url, args.token, args.version_tag));

    let pong = ping(&remote).await.context("Remote API is not reachable")?;
    println!(
        "[{}] {}",
        pong.status,
        pong.body.map(|b| b.to_string()).unwrap_or_default()
    );

    let store = LocalStore::new(config);
    store.init().context("Failed to scaffold local mirror")?;

    let (requests_path, output_path) = if args.dev {
        let root = &store.config().db_folder;
        (root.join("requests.json"), root.join("output.json"))
    } else {
        (
            PathBuf::from("requests/requests.json"),
            PathBuf::from("requests/output.json"),
        )
    };

    let version = remote.config().version.clone();
    let report = sync_files(&remote, &store, &version, &requests_path, &output_path)
        .await
        .with_context(|| format!("Failed to replay {}", requests_path.display()))?;

    println!(
        "Sent {} request(s), {} failed (Output: '{}')",
        report.len(),
        report.failures(),
        output_path.display()
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
            2 => EnvFilter::new("debug,reqwest=info,hyper=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
