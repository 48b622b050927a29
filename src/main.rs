use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use vigil::config::Config;
use vigil::embedding::onnx::SentenceEmbedder;
use vigil::signal::summary::summarize_clusters;
use vigil::signal::{engine, SignalError};
use vigil::store::ArtifactStore;

/// Vigil: safety-signal detection for adverse-event reports.
///
/// Ingests a tabular adverse-event export, clusters semantically similar
/// reports, and ranks the clusters by a composite signal score so the
/// most likely drug-safety signals surface first.
#[derive(Parser)]
#[command(name = "vigil", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline over a delimited report file
    Process {
        /// Path to the CSV file of adverse-event reports
        file: PathBuf,

        /// How many top clusters to summarize (default: 5)
        #[arg(long, default_value = "5")]
        top_n: usize,
    },

    /// Recompute and display signals from the persisted artifacts
    Signals {
        /// How many top clusters to summarize (default: 5)
        #[arg(long, default_value = "5")]
        top_n: usize,
    },

    /// Print the accumulated metrics document
    Metrics,

    /// Show artifact status (dataset, clusters, signals, metrics)
    Status,

    /// Delete all persisted artifacts
    Reset,

    /// Download the ONNX embedding model (~90 MB)
    DownloadModel,

    /// Start the HTTP API server
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on (default: 5001)
        #[arg(long, default_value = "5001")]
        port: u16,

        /// Address to bind (default: 0.0.0.0)
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("vigil=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process { file, top_n } => {
            let config = Config::load()?;
            config.require_model()?;
            let store = ArtifactStore::new(config.data_dir.clone());

            println!("Processing {}...", file.display());

            let embedder = SentenceEmbedder::load(&config.model_dir)?;
            let outcome = vigil::pipeline::run(&config, &store, &embedder, &file).await?;

            vigil::output::terminal::display_signal_table(&outcome.stats);

            let summaries = if top_n == vigil::signal::summary::DEFAULT_TOP_N {
                outcome.summaries
            } else {
                // Re-derive when the caller asked for a non-default count
                let (stats, labeled) = engine::detect_signals(&store)?;
                summarize_clusters(&stats, &labeled, top_n)
            };
            vigil::output::terminal::display_summaries(&summaries);

            println!("{}", "Processing complete.".bold());
            println!("  Reports analyzed: {}", outcome.rows);
            println!("  Clusters found: {}", outcome.n_clusters);
            println!("  Noise points: {}", outcome.n_noise);
        }

        Commands::Signals { top_n } => {
            let config = Config::load()?;
            let store = ArtifactStore::new(config.data_dir.clone());

            let (stats, labeled) = match engine::detect_signals(&store) {
                Ok(result) => result,
                Err(e @ (SignalError::ClusterDataMissing | SignalError::DatasetMissing)) => {
                    println!("{e}");
                    println!("Run `vigil process <file>` to build the artifacts.");
                    return Ok(());
                }
                Err(SignalError::Other(e)) => return Err(e),
            };

            vigil::output::terminal::display_signal_table(&stats);
            let summaries = summarize_clusters(&stats, &labeled, top_n);
            vigil::output::terminal::display_summaries(&summaries);
        }

        Commands::Metrics => {
            let config = Config::load()?;
            let store = ArtifactStore::new(config.data_dir.clone());

            match vigil::metrics::load(&store.metrics_path()) {
                Some(document) => {
                    println!("{}", serde_json::to_string_pretty(&document)?);
                }
                None => {
                    println!("No metrics recorded yet.");
                    println!("Run `vigil process <file>` to generate them.");
                }
            }
        }

        Commands::Status => {
            let config = Config::load()?;
            let store = ArtifactStore::new(config.data_dir.clone());
            show_status(&store)?;
        }

        Commands::Reset => {
            let config = Config::load()?;
            let store = ArtifactStore::new(config.data_dir.clone());

            let deleted = store.reset()?;
            if deleted.is_empty() {
                println!("Nothing to delete — no artifacts present.");
            } else {
                println!("Deleted: {}", deleted.join(", "));
            }
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading ONNX embedding model...");
            println!("  Destination: {}", model_dir.display());

            vigil::embedding::download::download_model(model_dir).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("You can now run `vigil process <file>`.");
        }

        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            let config = Config::load()?;
            vigil::web::run_server(config, port, &bind).await?;
        }
    }

    Ok(())
}

/// Print artifact presence and sizes.
fn show_status(store: &ArtifactStore) -> Result<()> {
    let describe = |label: &str, path: &std::path::Path| {
        if path.exists() {
            let size = std::fs::metadata(path)
                .map(|m| format_bytes(m.len()))
                .unwrap_or_else(|_| "unknown".to_string());
            println!("{label}: {} ({size})", path.display());
        } else {
            println!("{label}: not present");
        }
    };

    describe("Dataset", &store.dataset_path());
    describe("Cluster labels", &store.clusters_path());
    describe("Signals table", &store.signals_path());
    describe("Metrics", &store.metrics_path());

    match store.load_signals()? {
        Some(stats) if !stats.is_empty() => {
            println!(
                "\n{} clusters ranked; top signal score {:.2} (cluster {})",
                stats.len(),
                stats[0].signal_score,
                stats[0].cluster
            );
        }
        _ => {
            println!("\nNo ranked signals yet. Run `vigil process <file>` first.");
        }
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
