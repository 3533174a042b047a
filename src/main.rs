//! Mediaflow CLI
//!
//! Diagnostic front end for the media delivery pipeline.
//!
//! ```text
//! mediaflow preload https://cdn.example.com/a.jpg https://cdn.example.com/b.jpg
//! mediaflow candidates "https://drive.google.com/file/d/F123/view"
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::future::join_all;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mediaflow::adapters::{HttpFetcher, LoggingEventSink, PrometheusExporter};
use mediaflow::{
    build_candidates, LoadEventSink, LoadState, MediaConfig, MediaContext, MediaDescriptor,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Mediaflow - media delivery pipeline diagnostics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON", global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load URLs through the pipeline and print a performance report
    Preload {
        /// Resource URLs
        #[arg(required = true)]
        urls: Vec<String>,

        /// YAML configuration file
        #[arg(long, env = "MEDIAFLOW_CONFIG")]
        config: Option<PathBuf>,

        /// Cache budget in MiB (overrides the config file)
        #[arg(long, env = "MEDIAFLOW_MAX_CACHE_MB")]
        max_cache_mb: Option<u64>,

        /// Fetch timeout in seconds (overrides the config file)
        #[arg(long, env = "MEDIAFLOW_TIMEOUT_SECS")]
        timeout_secs: Option<u64>,

        /// Print Prometheus text instead of the report
        #[arg(long)]
        prometheus: bool,
    },

    /// Print the fallback URLs for a video
    Candidates {
        /// Video URL as given by the content author
        url: String,

        /// Video host file id, if not part of the URL
        #[arg(long)]
        file_id: Option<String>,

        /// Drop duplicate candidates
        #[arg(long)]
        dedupe: bool,

        /// YAML configuration file (host templates)
        #[arg(long, env = "MEDIAFLOW_CONFIG")]
        config: Option<PathBuf>,
    },
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    match args.command {
        Command::Preload {
            urls,
            config,
            max_cache_mb,
            timeout_secs,
            prometheus,
        } => {
            let mut config = load_config(config.as_ref())?;
            if let Some(mb) = max_cache_mb {
                config.cache.max_cache_size = mb * 1024 * 1024;
            }
            if let Some(secs) = timeout_secs {
                config.pipeline.fetch_timeout = Some(Duration::from_secs(secs));
            }
            run_preload(config, urls, prometheus).await
        }
        Command::Candidates {
            url,
            file_id,
            dedupe,
            config,
        } => {
            let mut config = load_config(config.as_ref())?;
            config.video.dedupe |= dedupe;

            let descriptor = match file_id {
                Some(id) => MediaDescriptor::new(url).with_file_id(id),
                None => MediaDescriptor::new(url),
            };
            for (i, candidate) in build_candidates(&descriptor, &config.video).iter().enumerate() {
                println!("{}. {}", i + 1, candidate);
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<MediaConfig> {
    match path {
        Some(path) => MediaConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(MediaConfig::default()),
    }
}

async fn run_preload(config: MediaConfig, urls: Vec<String>, prometheus: bool) -> anyhow::Result<()> {
    info!("Starting preload of {} resources", urls.len());
    info!("  Cache budget: {} bytes", config.cache.max_cache_size);
    info!("  Fetch timeout: {:?}", config.pipeline.fetch_timeout);

    let exporter = Arc::new(PrometheusExporter::new()?);
    let fetcher = Arc::new(HttpFetcher::with_timeout(config.pipeline.fetch_timeout)?);
    let sinks: Vec<Arc<dyn LoadEventSink>> = vec![
        Arc::new(LoggingEventSink::debug_level()) as Arc<dyn LoadEventSink>,
        exporter.clone() as Arc<dyn LoadEventSink>,
    ];
    let ctx = MediaContext::with_sinks(config, fetcher, sinks)?;

    let resources: Vec<_> = urls.iter().map(|url| ctx.track(url.clone())).collect();
    let outcomes = join_all(resources.iter().map(|resource| resource.force_load())).await;

    for (resource, outcome) in resources.iter().zip(outcomes) {
        match outcome {
            Ok(LoadState::Loaded) => info!(
                url = %resource.url(),
                bytes = resource.data().map(|d| d.len()).unwrap_or(0),
                "Loaded"
            ),
            Ok(state) => warn!(
                url = %resource.url(),
                state = %state,
                error = %resource.last_error().unwrap_or_default(),
                "Not loaded"
            ),
            Err(e) => error!(url = %resource.url(), "Load rejected: {}", e),
        }
    }

    if prometheus {
        exporter.observe(&ctx.metrics().summary(), &ctx.cache().stats());
        print!("{}", exporter.render()?);
    } else {
        print!("{}", ctx.metrics().report());
    }

    ctx.teardown();
    Ok(())
}

// =============================================================================
// Logging
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "reqwest=warn", "rustls=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
