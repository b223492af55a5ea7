#![forbid(unsafe_code)]

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ripple_batch::{forward, Accumulator, LogGateway};
use ripple_core::ChangeRecord;
use ripple_translate::{op::render_bulk_body, Registry};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ripplectl", version, about = "Ripple CDC forwarder CLI")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output {
    Human,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline over a JSON file of change records (dry-run
    /// gateway: bulk bodies go to the log, nothing leaves the machine)
    Forward {
        /// File containing a JSON array of change records
        file: PathBuf,
    },
    /// Translate records without batching and print the bulk NDJSON per
    /// record
    Translate {
        /// File containing a JSON array of change records
        file: PathBuf,
    },
}

fn init_tracing() {
    let env = std::env::var("RIPPLE_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("RIPPLE_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid RIPPLE_METRICS_ADDR; expected host:port");
        }
    }
}

fn load_records(file: &PathBuf) -> Result<Vec<ChangeRecord>> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let records: Vec<ChangeRecord> = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parsing change records from {}", file.display()))?;
    Ok(records)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();

    match cli.command {
        Commands::Forward { file } => {
            let records = load_records(&file)?;
            info!(records = records.len(), file = %file.display(), "forward invoked");

            let registry = Registry::with_default_processors();
            let mut accumulator = Accumulator::new();
            let gateway = LogGateway;
            let report = forward(records, &registry, &mut accumulator, &gateway).await;

            match cli.output {
                Output::Human => {
                    println!("invocation   {}", report.invocation);
                    println!("records      {}", report.records);
                    println!("translated   {}", report.translated);
                    println!("unrouted     {}", report.unrouted);
                    println!("untranslated {}", report.untranslated);
                    println!("flushes      {}", report.flushes);
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        Commands::Translate { file } => {
            let records = load_records(&file)?;
            info!(records = records.len(), file = %file.display(), "translate invoked");

            let registry = Registry::with_default_processors();
            for (i, record) in records.iter().enumerate() {
                let Some(processor) = registry.route(record) else {
                    eprintln!("# record {i}: unrouted");
                    continue;
                };
                match processor.prepare(record).operation {
                    Some(op) => print!("{}", render_bulk_body(std::slice::from_ref(&op))?),
                    None => eprintln!("# record {i}: no operation"),
                }
            }
        }
    }

    Ok(())
}
