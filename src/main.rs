//! CLI entry point for diet_insights.
//!
//! Analyzes a recipe dataset from a local file, an HTTP(S) URL, or an object
//! in an S3-compatible blob store, prints a report, and writes JSON results,
//! optional charts and an optional processed-dataset export.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use diet_insights::analyzers::analyzer::analyze;
use diet_insights::analyzers::publish::publish_results;
use diet_insights::config::BlobConnection;
use diet_insights::output::{EmitOptions, emit, print_pretty, render_report};
use diet_insights::source::{
    BasicClient, BlobSource, DataSource, HttpSource, LocalFile, blob_client, is_http_url,
};
use tracing::{error, info};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "diet_insights")]
#[command(about = "Nutritional statistics over a recipe dataset grouped by diet type", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a dataset from a local file or URL
    Analyze {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        #[command(flatten)]
        emit: EmitArgs,
    },
    /// Analyze a dataset stored in a blob container
    AnalyzeBlob {
        /// Container (bucket) holding the dataset
        #[arg(long, default_value = "datasets")]
        container: String,

        /// Name of the dataset object
        #[arg(long, default_value = "All_Diets.csv")]
        blob: String,

        #[command(flatten)]
        emit: EmitArgs,
    },
}

#[derive(Args)]
struct EmitArgs {
    /// Directory for JSON results, charts and exports (created if absent)
    #[arg(short, long, default_value = "simulated_nosql")]
    output_dir: PathBuf,

    /// Skip writing results.json and avg_macros.json
    #[arg(long, default_value_t = false)]
    no_json: bool,

    /// Render PNG charts
    #[arg(long, default_value_t = false)]
    charts: bool,

    /// Write the cleaned dataset with ratio columns as CSV
    #[arg(long, default_value_t = false)]
    export_processed: bool,

    /// Gzip compress the processed-dataset export
    #[arg(long, default_value_t = false)]
    gzip: bool,

    /// Optional: also upload the JSON results to this blob container
    #[arg(long)]
    publish_container: Option<String>,

    /// Key prefix for uploaded results
    #[arg(long, default_value = "results/")]
    publish_prefix: String,

    /// Blob store connection string (falls back to BLOB_CONNECTION_STRING)
    #[arg(long)]
    connection_string: Option<String>,

    /// Do not print the report to stdout
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

impl EmitArgs {
    fn options(&self) -> EmitOptions {
        EmitOptions {
            output_dir: self.output_dir.clone(),
            json: !self.no_json,
            charts: self.charts,
            export_processed: self.export_processed,
            gzip: self.gzip,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/diet_insights.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("diet_insights.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse::<Directive>()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse::<Directive>()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Analyze { source, emit } => {
            let data_source: Box<dyn DataSource> = if is_http_url(&source) {
                Box::new(HttpSource::new(BasicClient::new(), source))
            } else {
                Box::new(LocalFile::new(source))
            };
            run(data_source.as_ref(), &emit, None).await
        }
        Commands::AnalyzeBlob {
            container,
            blob,
            emit,
        } => {
            let conn = BlobConnection::resolve(emit.connection_string.as_deref())?;
            let client = blob_client(&conn).await;
            let data_source = BlobSource::new(client.clone(), container, blob);
            run(&data_source, &emit, Some(client)).await
        }
    };

    if let Err(e) = &outcome {
        error!(error = %e, aborted = e.aborts_run(), "Run failed");
    }
    outcome?;
    Ok(())
}

/// Analyzes one source and writes the requested artifacts.
#[tracing::instrument(skip_all, fields(source = %source.id()))]
async fn run(
    source: &dyn DataSource,
    args: &EmitArgs,
    client: Option<aws_sdk_s3::Client>,
) -> Result<(), diet_insights::error::PipelineError> {
    let analysis = analyze(source).await?;

    print_pretty(&analysis.result);
    if !args.quiet {
        print!("{}", render_report(&analysis));
    }

    let written = emit(&analysis, &args.options())?;
    for path in &written {
        info!(path = %path.display(), "Wrote artifact");
    }

    if let Some(container) = &args.publish_container {
        let client = match client {
            Some(client) => client,
            None => blob_client(&BlobConnection::resolve(args.connection_string.as_deref())?).await,
        };
        publish_results(&client, container, &args.publish_prefix, &analysis.result).await?;
    }

    info!(
        rows = analysis.result.meta.rows_processed,
        highest_avg_protein = analysis
            .result
            .diet_type_with_highest_avg_protein
            .as_deref()
            .unwrap_or("none"),
        "Run complete"
    );
    Ok(())
}
