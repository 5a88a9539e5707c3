use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use cohort_dashboard::client::SchemaQuery;
use cohort_dashboard::commands::{self, AnalyzeOptions, ShowOptions};
use cohort_dashboard::config::get_config;
use cohort_dashboard::logging::init_logging;
use cohort_dashboard::models::MetricKind;
use cohort_dashboard::request::{
    AnalysisRequest, CleaningMethod, DataSourceType, NullHandlingStrategy, PreprocessingOptions,
};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "cohort-dashboard")]
#[command(about = "Terminal dashboard for cohort retention and revenue analysis")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a saved analysis result
    Show {
        /// Analysis response or result JSON file
        path: PathBuf,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Metric plotted in the trend chart
        #[arg(long)]
        metric: Option<MetricKind>,
        /// Sections to expand (comma separated)
        #[arg(long, value_delimiter = ',')]
        expand: Vec<MetricKind>,
        /// Sections to collapse (comma separated)
        #[arg(long, value_delimiter = ',')]
        collapse: Vec<MetricKind>,
    },
    /// Upload a CSV dataset
    Upload {
        file: PathBuf,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// List tables and columns of a data source
    Schema {
        /// Previously uploaded file
        #[arg(long)]
        filename: Option<String>,
        /// Database connection URL
        #[arg(long)]
        db_url: Option<String>,
        /// Table to describe
        #[arg(long)]
        table: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Run a cohort analysis on an uploaded CSV or a database table
    Analyze(AnalyzeArgs),
    /// Check an export job
    Status {
        job_id: String,
        /// Keep polling until the job is ready or failed
        #[arg(long)]
        watch: bool,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// csv, sql or db
    #[arg(long, default_value = "csv")]
    data_source: DataSourceType,
    /// Uploaded CSV file name (csv source)
    #[arg(long)]
    filename: Option<String>,
    /// Database connection URL (sql/db source)
    #[arg(long)]
    db_url: Option<String>,
    /// Table to analyze (sql/db source)
    #[arg(long)]
    table: Option<String>,
    /// Columns to include (comma separated)
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,
    #[arg(long)]
    user_id: String,
    #[arg(long)]
    cohort_grouping: String,
    #[arg(long)]
    event_column: String,
    #[arg(long)]
    revenue_column: Option<String>,
    #[arg(long)]
    metric: MetricKind,
    /// daily, weekly, monthly or quarterly
    #[arg(long)]
    interval: String,
    /// Start date filter (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<String>,
    /// End date filter (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<String>,
    /// Outlier treatment: capping or remove
    #[arg(long, default_value = "capping")]
    cleaning: CleaningMethod,
    /// Leave null values as they are
    #[arg(long)]
    no_null_handling: bool,
    /// Fill strategy for categorical nulls
    #[arg(long, default_value = "most_frequent")]
    null_categorical: String,
    /// Fill strategy for numerical nulls
    #[arg(long, default_value = "mean")]
    null_numerical: String,
    /// Keep column types as uploaded
    #[arg(long)]
    no_type_conversion: bool,
    /// Skip generated observations
    #[arg(long)]
    no_insights: bool,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
    /// Wait for the export job and print its download link
    #[arg(long)]
    wait: bool,
}

impl AnalyzeArgs {
    fn into_options(self) -> AnalyzeOptions {
        let mut request = AnalysisRequest::new(
            self.user_id,
            self.cohort_grouping,
            self.event_column,
            self.metric.as_str(),
            self.interval,
        );
        request.data_source_type = self.data_source;
        request.filename = self.filename;
        // connection details only travel with database sources
        if self.data_source.is_database() {
            request.db_url = self.db_url;
            request.selected_table = self.table;
        }
        request.columns = self.columns;
        request.revenue_column = self.revenue_column;
        request.start_date = self.start_date;
        request.end_date = self.end_date;

        let fill = (!self.no_null_handling).then(|| NullHandlingStrategy {
            categorical: self.null_categorical,
            numerical: self.null_numerical,
        });
        request.preprocessing = Some(PreprocessingOptions::new(
            self.cleaning,
            fill,
            !self.no_type_conversion,
        ));
        request.llm_insights = !self.no_insights;

        AnalyzeOptions {
            request,
            json: self.json,
            wait: self.wait,
        }
    }
}

impl Commands {
    fn json(&self) -> bool {
        match self {
            Commands::Show { json, .. }
            | Commands::Upload { json, .. }
            | Commands::Schema { json, .. }
            | Commands::Analyze(AnalyzeArgs { json, .. }) => *json,
            Commands::Status { .. } => false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = get_config();
    let guard = init_logging(&config.logging, &config.paths.log_directory);
    let json = cli.command.json();

    let outcome = match cli.command {
        Commands::Show {
            path,
            json,
            metric,
            expand,
            collapse,
        } => commands::run_show(
            &ShowOptions {
                path,
                json,
                metric,
                expand,
                collapse,
            },
            config,
        ),
        Commands::Upload { file, json } => commands::run_upload(&file, json, config).await,
        Commands::Schema {
            filename,
            db_url,
            table,
            json,
        } => {
            let query = SchemaQuery {
                filename,
                db_url,
                table,
            };
            commands::run_schema(&query, json, config).await
        }
        Commands::Analyze(args) => commands::run_analyze(args.into_options(), config).await,
        Commands::Status { job_id, watch } => commands::run_status(&job_id, watch, config).await,
    };

    if let Err(e) = outcome {
        handle_error(&e, json);
        drop(guard);
        process::exit(1);
    }
    Ok(())
}

fn handle_error(e: &anyhow::Error, json: bool) {
    if json {
        println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
    } else {
        eprintln!("Error: {:#}", e);
    }
}
