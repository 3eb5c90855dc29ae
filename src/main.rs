// vecto-ingest — main.rs
// Binary entry point: batch ingestion and queries against a Vecto space.
// Author: d65v <https://github.com/d65v>

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};

use vingest::client::DEFAULT_TOP_K;
use vingest::dataset::{load_csv, IngestRecord};
use vingest::toolbelt::{ingest_images, ingest_items};
use vingest::{IngestOptions, IngestionReport, Item, Modality, VectoClient, VectoConfig};

fn main() {
    // Initialize logger — respects RUST_LOG env var
    env_logger::init();

    // Load .env if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let args: Vec<String> = env::args().skip(1).collect();
    let mode = args.first().map(|s| s.as_str()).unwrap_or("help");

    let result = match mode {
        "ingest-csv" => run_ingest_csv(&args[1..]),
        "ingest-images" => run_ingest_images(&args[1..]),
        "lookup" => run_lookup(&args[1..]),
        "delete-all" => run_delete_all(),
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        unknown => {
            eprintln!("[vecto-ingest] Unknown mode: '{}'. Try --help.", unknown);
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        eprintln!("[vecto-ingest] error: {:#}", e);
        std::process::exit(1);
    }
}

fn connect() -> anyhow::Result<VectoClient> {
    let config = VectoConfig::from_env().context("loading Vecto config")?;
    log::info!(
        "Config: base_url={}, vector_space_id={}",
        config.base_url,
        config.vector_space_id
    );
    Ok(VectoClient::new(config)?)
}

fn run_ingest_csv(args: &[String]) -> anyhow::Result<()> {
    let (path, data_col, attr_col) = match args {
        [path, data, attr, ..] => (path, data, attr),
        _ => bail!("usage: vecto-ingest ingest-csv <file> <data-column> <attribute-column> [delimiter]"),
    };
    let delimiter = match args.get(3).map(|d| d.as_bytes()) {
        None => b',',
        Some([b]) => *b,
        Some(_) => bail!("delimiter must be a single byte"),
    };

    let options = IngestOptions::from_env()?;
    let records = load_csv(path, data_col, attr_col, delimiter)
        .with_context(|| format!("reading {}", path))?;
    let (items, attributes) = IngestRecord::split_text(records);

    let client = connect()?;
    let report = ingest_items(&client, Modality::Text, &items, Some(&attributes), options)?;
    print_report(&report)
}

fn run_ingest_images(args: &[String]) -> anyhow::Result<()> {
    if args.is_empty() {
        bail!("usage: vecto-ingest ingest-images <path>...");
    }
    let paths: Vec<PathBuf> = args.iter().map(PathBuf::from).collect();

    let options = IngestOptions::from_env()?;
    let client = connect()?;
    let report = ingest_images(&client, &paths, None, options)?;
    print_report(&report)
}

fn run_lookup(args: &[String]) -> anyhow::Result<()> {
    let Some(query) = args.first() else {
        bail!("usage: vecto-ingest lookup <text> [top_k]");
    };
    let top_k = match args.get(1) {
        Some(k) => k.parse().with_context(|| format!("top_k '{}' is not a number", k))?,
        None => DEFAULT_TOP_K,
    };

    let client = connect()?;
    let response = client.lookup(&Item::text(query.as_str()), top_k, None)?;

    println!("\n[vecto-ingest] Top-{} results for '{}':", top_k, query);
    for r in &response.results {
        println!("  id={:8}  similarity={:.6}  attributes={}", r.id, r.similarity, r.attributes);
    }
    Ok(())
}

fn run_delete_all() -> anyhow::Result<()> {
    let client = connect()?;
    let body = client.delete_vector_space_entries()?;
    println!("[vecto-ingest] vector space cleared: {}", body);
    Ok(())
}

fn print_report(report: &IngestionReport) -> anyhow::Result<()> {
    println!(
        "[vecto-ingest] {}/{} batches ok, {} items ingested ({:?})",
        report.outcomes.iter().filter(|o| o.is_success()).count(),
        report.total_batches,
        report.items_ingested(),
        report.termination
    );
    for (index, err) in report.failures() {
        println!("  batch {} => {}", index, err);
    }
    if !report.is_success() {
        bail!("ingestion finished with failures");
    }
    Ok(())
}

fn print_help() {
    println!(
        r#"
vecto-ingest — Batched ingestion for Vecto vector spaces

USAGE:
  vecto-ingest [MODE] [ARGS]

MODES:
  ingest-csv <file> <data-col> <attr-col> [delim]   Ingest a CSV column as text
  ingest-images <path>...                           Ingest image files
  lookup <text> [top_k]                             Text lookup (default top_k: 5)
  delete-all                                        Delete every entry in the space
  help                                              Show this message

ENVIRONMENT:
  user_token              Vecto API token (required)
  vector_space_id         Target vector space id (required)
  vecto_base_url          Service URL (default: https://api.vecto.ai)
  VECTO_BATCH_SIZE        Items per upload call (default: 64)
  VECTO_DELETE_EXISTING   Clear the space before ingesting (default: true)
  VECTO_SKIP_INGESTION    Do nothing, report nothing (default: false)
  VECTO_FAIL_FAST         Stop after the first failed batch (default: false)
  RUST_LOG                Log level: info | debug | warn | error

AUTHOR:
  d65v <https://github.com/d65v>
"#
    );
}
