//! Tracklab CLI - Command-line interface for the Tracklab engine
//!
//! Commands:
//! - experiment: Compute experiment results from a dataset document
//! - chart: Build a dual-metric chart series from a dataset document
//! - correlate: Pearson correlation of two comma-separated series
//! - schema: Describe the JSON documents Tracklab reads and writes

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use tracklab::pipeline::{
    all_experiment_results_json, dual_series_json_with_limit, experiment_results_json,
};
use tracklab::series::Selection;
use tracklab::{pearson_correlation, AnalysisError, Settings, TRACKLAB_VERSION};

/// Tracklab - experiment analysis and dual-metric charts for self-tracking data
#[derive(Parser)]
#[command(name = "tracklab")]
#[command(version = TRACKLAB_VERSION)]
#[command(about = "Analyse self-tracking experiments and chart metric pairs", long_about = None)]
struct Cli {
    /// Settings file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "tracklab=debug"
    #[arg(long, global = true, env = "TRACKLAB_LOG")]
    log_level: Option<String>,

    /// Pretty-print JSON output (default: only when stdout is a terminal)
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute experiment results
    Experiment {
        /// Dataset file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Experiment id (all experiments when omitted)
        #[arg(long)]
        id: Option<String>,
    },

    /// Build a dual-metric chart series
    Chart {
        /// Dataset file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Primary (output) metric id
        #[arg(long)]
        primary: Uuid,

        /// Comparison (input) metric id
        #[arg(long)]
        comparison: Option<Uuid>,

        /// Last day shown, YYYY-MM-DD (default: today, UTC)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Number of days shown (default from settings)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Pearson correlation of two equal-length series
    Correlate {
        /// First series, comma separated
        #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
        xs: Vec<f64>,

        /// Second series, comma separated
        #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
        ys: Vec<f64>,
    },

    /// Describe a JSON document
    Schema {
        #[arg(value_enum)]
        document: DocumentType,
    },
}

#[derive(Clone, ValueEnum)]
enum DocumentType {
    /// Dataset input (items, entries, experiments)
    Dataset,
    /// Chart selection input
    Selection,
    /// Experiment results output
    Results,
    /// Chart series output
    Series,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), TrackCliError> {
    let settings = Settings::load_or_default(cli.config.as_deref())?;
    setup_logging(cli.log_level.as_deref().unwrap_or(&settings.log_level));
    debug!(config = ?cli.config, "settings loaded");

    let pretty = cli.pretty || settings.pretty.unwrap_or_else(|| atty::is(atty::Stream::Stdout));

    match cli.command {
        Commands::Experiment { input, id } => cmd_experiment(&input, id.as_deref(), pretty),

        Commands::Chart {
            input,
            primary,
            comparison,
            end,
            days,
        } => {
            let selection = Selection {
                primary_item_id: primary,
                comparison_item_id: comparison,
                end_date: end.unwrap_or_else(|| Utc::now().date_naive()),
                days: days.unwrap_or(settings.default_window_days),
            };
            cmd_chart(&input, &selection, settings.max_window_days, pretty)
        }

        Commands::Correlate { xs, ys } => cmd_correlate(&xs, &ys),

        Commands::Schema { document } => {
            cmd_schema(document);
            Ok(())
        }
    }
}

/// Install the stderr subscriber; stdout carries JSON results only
fn setup_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = fmt::layer()
        .with_target(false)
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .init();
}

fn cmd_experiment(input: &Path, id: Option<&str>, pretty: bool) -> Result<(), TrackCliError> {
    let dataset = read_input(input)?;
    let json = match id {
        Some(id) => experiment_results_json(&dataset, id)?,
        None => all_experiment_results_json(&dataset)?,
    };
    println!("{}", format_output(&json, pretty)?);
    Ok(())
}

fn cmd_chart(
    input: &Path,
    selection: &Selection,
    max_window_days: u32,
    pretty: bool,
) -> Result<(), TrackCliError> {
    let dataset = read_input(input)?;
    let selection_json = serde_json::to_string(selection)?;
    let json = dual_series_json_with_limit(&dataset, &selection_json, max_window_days)?;
    println!("{}", format_output(&json, pretty)?);
    Ok(())
}

fn cmd_correlate(xs: &[f64], ys: &[f64]) -> Result<(), TrackCliError> {
    if xs.len() != ys.len() {
        return Err(TrackCliError::LengthMismatch(xs.len(), ys.len()));
    }

    let report = CorrelationReport {
        pairs: xs.len(),
        correlation: pearson_correlation(xs, ys),
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

fn cmd_schema(document: DocumentType) {
    match document {
        DocumentType::Dataset => {
            println!("Dataset document");
            println!();
            println!("- user_id: UUID of the acting user");
            println!("- items: [{{ id, user_id, name, category: INPUT|OUTPUT, type }}]");
            println!("    type: NUMERIC | SCALE_1_10 | BOOLEAN | TEXT");
            println!("- entries: [{{ id, user_id, item_id, date: YYYY-MM-DD, value, created_at }}]");
            println!("    value: number, boolean or string; latest created_at wins per day");
            println!("- experiments: [{{ id, user_id, independent_item_id, dependent_item_id,");
            println!("    hypothesis, start_date, end_date, status: ACTIVE|COMPLETED, threshold? }}]");
        }
        DocumentType::Selection => {
            println!("Selection document");
            println!();
            println!("- primary_item_id: output metric (NUMERIC or SCALE_1_10)");
            println!("- comparison_item_id: optional input metric (NUMERIC, SCALE_1_10 or BOOLEAN)");
            println!("- end_date: last day shown, YYYY-MM-DD");
            println!("- days: number of days shown, at most max_window_days (default 366)");
        }
        DocumentType::Results => {
            println!("Experiment results");
            println!();
            println!("- experiment_id");
            println!("- split_basis: {{ kind: BOOLEAN|SCALE_MIDPOINT|NUMERIC_THRESHOLD|UNSPLIT, threshold? }}");
            println!("- positive_condition_average / negative_condition_average: number or null");
            println!("- positive_condition_count / negative_condition_count");
            println!("- total_days, days_with_data");
            println!("- correlation: Pearson r in [-1, 1] or null");
            println!("- difference: positive minus negative average, or null");
        }
        DocumentType::Series => {
            println!("Dual-metric series");
            println!();
            println!("- points: [{{ date, primary, comparison, comparison_raw }}]");
            println!("- axis: {{ scenario, left, right?, comparison_transform }}");
            println!("    side: {{ domain: {{ min, max }}, ticks?, format }}");
            println!("    boolean comparisons on a scale chart are drawn at 2.5 (No) and 7.5 (Yes)");
        }
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, TrackCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn format_output(json: &str, pretty: bool) -> Result<String, TrackCliError> {
    if pretty {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Ok(serde_json::to_string_pretty(&value)?)
    } else {
        Ok(json.to_string())
    }
}

#[derive(serde::Serialize)]
struct CorrelationReport {
    pairs: usize,
    correlation: Option<f64>,
}

// Error handling

#[derive(Debug)]
enum TrackCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    LengthMismatch(usize, usize),
}

impl From<io::Error> for TrackCliError {
    fn from(e: io::Error) -> Self {
        TrackCliError::Io(e)
    }
}

impl From<AnalysisError> for TrackCliError {
    fn from(e: AnalysisError) -> Self {
        TrackCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for TrackCliError {
    fn from(e: serde_json::Error) -> Self {
        TrackCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TrackCliError> for CliError {
    fn from(e: TrackCliError) -> Self {
        match e {
            TrackCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TrackCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            TrackCliError::LengthMismatch(xs, ys) => CliError {
                code: "LENGTH_MISMATCH".to_string(),
                message: format!("xs has {xs} values but ys has {ys}"),
                hint: Some("Pass one y value per x value".to_string()),
            },
            TrackCliError::Analysis(e) => {
                let (code, hint) = match &e {
                    AnalysisError::ParseError(_) | AnalysisError::JsonError(_) => {
                        ("PARSE_ERROR", "Run 'tracklab schema dataset' for the expected layout")
                    }
                    AnalysisError::UnknownItem(_) | AnalysisError::UnknownExperiment(_) => {
                        ("NOT_FOUND", "Check the ids against the dataset")
                    }
                    AnalysisError::NotOwner(_) => {
                        ("NOT_OWNER", "Items and experiments must belong to the dataset user")
                    }
                    AnalysisError::InvalidMetricRole(_) => (
                        "INVALID_METRIC_ROLE",
                        "Outputs must be NUMERIC or SCALE_1_10; inputs may also be BOOLEAN",
                    ),
                    AnalysisError::InvalidDateRange(_) => {
                        (
                            "INVALID_DATE_RANGE",
                            "start_date must not be after end_date; --days must not exceed max_window_days",
                        )
                    }
                    AnalysisError::InvalidTransition(_) => {
                        ("INVALID_TRANSITION", "Check the experiment status")
                    }
                    AnalysisError::InvalidFinding(_) => ("INVALID_FINDING", "Check the finding draft"),
                    AnalysisError::FetchError(_) => ("FETCH_ERROR", "Retry the request"),
                    AnalysisError::ConfigError(_) => ("CONFIG_ERROR", "Check the --config file"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
        }
    }
}
