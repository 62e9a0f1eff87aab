/// groq-typegen: generate TypeScript types for GROQ queries
///
/// Commands:
/// - generate: one-shot generation, or `--watch` to regenerate on change
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use groq_typegen::host::WorkerHost;
use groq_typegen::watch::{ShutdownGuard, WatchOptions, run_watch};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "groq-typegen")]
#[command(about = "Generate TypeScript types from GROQ queries and a schema", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate types from the schema and the project's queries
    Generate {
        /// Keep running and regenerate when queries or the schema change
        #[arg(short, long)]
        watch: bool,

        /// Config file (sanity.cli.toml or sanity-typegen.json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Project directory
        #[arg(short = 'd', long, default_value = ".")]
        work_dir: PathBuf,

        /// Quiet period before a change triggers regeneration
        #[arg(long, default_value_t = 1000)]
        debounce_ms: u64,

        /// Optional log file path for debug logging
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Increase log verbosity (-v info, -vv debug)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            watch,
            config,
            work_dir,
            debounce_ms,
            log,
            verbose,
        } => {
            init_logging(log.as_ref(), verbose)?;

            let work_dir = work_dir
                .canonicalize()
                .with_context(|| format!("Working directory not found: {}", work_dir.display()))?;
            let host = WorkerHost::default();

            if watch {
                let resolved = host.load_config(&work_dir, config.as_deref()).await?;
                let options = WatchOptions {
                    debounce: Duration::from_millis(debounce_ms),
                    handle_signals: true,
                };
                let stats = run_watch(host, &work_dir, resolved, options, ShutdownGuard::new()).await?;
                info!("Watch stopped after {} runs", stats.runs);
            } else {
                let stats = host.run_single(&work_dir, config.as_deref()).await?;
                info!(
                    "Generated {} schema types and {} query types",
                    stats.schema_types_count, stats.queries_count
                );
            }
        }
    }

    Ok(())
}

/// Initialize logging with optional file output
///
/// Human status output goes to stderr separately; these are diagnostics.
fn init_logging(log_path: Option<&PathBuf>, verbose: u8) -> Result<()> {
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    if let Some(log_file) = log_path {
        // With log file: at least info to file, warn+ to stderr
        let level = if verbose == 0 { "info" } else { default_level };
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

        let file_appender = tracing_appender::rolling::never(
            log_file
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new(".")),
            log_file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("groq-typegen.log"),
        );

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(file_appender.and(std::io::stderr.with_max_level(tracing::Level::WARN)))
            .with_ansi(false)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    } else {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    }

    Ok(())
}
