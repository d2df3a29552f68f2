//! CLI entry point for the NPS Pulse survey analyzer.
//!
//! Provides subcommands for running an analysis pass over a survey export,
//! listing the brands it contains, and requesting a qualitative analysis of
//! its comments.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use nps_pulse::analyzers::types::Module;
use nps_pulse::config::AnalysisConfig;
use nps_pulse::insight::GeminiClient;
use nps_pulse::output::{print_pretty, render_insight, render_text, to_json, write_segments_csv};
use nps_pulse::parser::load_dataset;
use nps_pulse::session::Session;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "nps_pulse")]
#[command(about = "Net Promoter Score analytics and alerts for survey exports", long_about = None)]
struct Cli {
    /// JSON file with thresholds and column names
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute KPIs, alerts, segment tables and trend for a survey export
    Analyze {
        /// Survey export (CSV)
        #[arg(short, long)]
        file: PathBuf,

        /// Only analyze this brand ("all" for every brand)
        #[arg(short, long)]
        brand: Option<String>,

        /// Business line label for the report
        #[arg(short, long, value_enum, default_value_t = Module::Sales)]
        module: Module,

        /// Print the report as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Optional: write the dealership table to this CSV file
        #[arg(long)]
        segments_csv: Option<PathBuf>,
    },
    /// List the brands present in a survey export
    Brands {
        /// Survey export (CSV)
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Summarize survey comments into topics with Gemini
    Insights {
        /// Survey export (CSV)
        #[arg(short, long)]
        file: PathBuf,

        /// Only use comments of this brand
        #[arg(short, long)]
        brand: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/nps_pulse.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("nps_pulse.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = AnalysisConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            file,
            brand,
            module,
            json,
            segments_csv,
        } => {
            let mut session = Session::new();
            session.load(load_dataset(&file, &config.columns)?);
            session.select_brand(brand.as_deref());
            session.select_module(module);

            let Some(report) = session.run(&config) else {
                return Ok(());
            };
            print_pretty(&report);

            if json {
                println!("{}", to_json(&report)?);
            } else {
                print!(
                    "{}",
                    render_text(&report, config.thresholds.volume_threshold_fraction)
                );
            }

            if let Some(path) = segments_csv {
                write_segments_csv(&path, &report.dealerships)?;
                info!(path = %path.display(), "Dealership table written");
            }
        }
        Commands::Brands { file } => {
            let dataset = load_dataset(&file, &config.columns)?;
            let brands = dataset.brands();
            info!(total = brands.len(), "Brands listed");
            for brand in brands {
                println!("{brand}");
            }
        }
        Commands::Insights { file, brand } => {
            let mut session = Session::new();
            session.load(load_dataset(&file, &config.columns)?);
            session.select_brand(brand.as_deref());

            session.set_api_key(GeminiClient::api_key_from_env());
            if session.api_key().is_none() {
                warn!("No API key; set GEMINI_API_KEY to enable insights");
            }

            let insight = session.gemini_insights(&config).await;
            print!("{}", render_insight(insight.as_ref()));
        }
    }

    Ok(())
}
