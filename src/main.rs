use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use tcpr_pipeline::app::clean_use_case::CleanUseCase;
use tcpr_pipeline::config::Config;
use tcpr_pipeline::constants;
use tcpr_pipeline::infra::read_case_rows;
use tcpr_pipeline::logging::init_logging;
use tcpr_pipeline::metrics::init_metrics;
use tcpr_pipeline::pipeline::Pipeline;
use tcpr_pipeline::report::pdf::{render_pdf, ReportContext};
use tcpr_pipeline::report::{print_summary, CohortSummary};

#[derive(Parser)]
#[command(name = "tcpr_pipeline")]
#[command(about = "Cleans out-of-hospital cardiac arrest registry exports for telephone-CPR analysis")]
#[command(version)]
struct Cli {
    /// TOML configuration file (default: $TCPR_CONFIG, then tcpr.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a registry export and write the configured outputs
    Run {
        /// Semicolon-delimited registry export
        #[arg(long)]
        input: Option<PathBuf>,
        /// Directory for the cleaned table and audit files
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Also render the PDF report
        #[arg(long)]
        pdf: bool,
        /// Skip diagnostics.ndjson
        #[arg(long)]
        no_diagnostics: bool,
    },
    /// Print the cohort summary of an existing cleaned table
    Report {
        #[arg(long)]
        cases: PathBuf,
        /// Write the PDF report here as well
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
}

fn config_path(cli_value: Option<PathBuf>) -> PathBuf {
    cli_value
        .or_else(|| std::env::var("TCPR_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_CONFIG_FILE))
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config_path = config_path(cli.config);
    let mut config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    let _guard = init_logging(&config.logging.dir);
    init_metrics();
    if config_path.exists() {
        info!("Loaded configuration from {}", config_path.display());
    } else {
        println!(
            "⚙️  No config file at {}, using built-in defaults",
            config_path.display()
        );
    }

    match cli.command {
        Commands::Run {
            input,
            output_dir,
            pdf,
            no_diagnostics,
        } => {
            if let Some(input) = input {
                config.input.path = input;
            }
            if let Some(dir) = output_dir {
                config.output.dir = dir;
            }
            config.output.write_pdf |= pdf;
            config.output.write_diagnostics &= !no_diagnostics;

            println!("🔄 Cleaning {}...", config.input.path.display());
            let use_case = CleanUseCase::new(
                Pipeline::from_config(&config),
                CleanUseCase::outputs_for(&config.output),
            );
            let report = use_case.execute(&config.input)?;
            let output = &report.output;

            print_summary(
                &CohortSummary::compute(&output.cases),
                Some(&output.merge_stats),
                Some(&output.exclusion_stats),
            );

            let flagged = output.review_flags().count();
            if flagged > 0 {
                println!("\n⚠️  {} cases flagged for manual review", flagged);
            }
            println!("\n📁 Outputs:");
            for path in &report.written {
                println!("   {}", path.display());
            }
            println!("✅ Run {} completed", output.run.run_id);
        }
        Commands::Report { cases, pdf } => {
            let rows = read_case_rows(&cases)
                .with_context(|| format!("Failed to read cleaned table {}", cases.display()))?;
            info!("Loaded {} cases from {}", rows.len(), cases.display());

            let summary = CohortSummary::compute(&rows);
            print_summary(&summary, None, None);

            if let Some(pdf_path) = pdf {
                let context = ReportContext {
                    source: &cases,
                    run: None,
                    merge: None,
                    exclusions: None,
                };
                let bytes = render_pdf(&summary, &context)?;
                fs::write(&pdf_path, bytes)
                    .with_context(|| format!("Failed to write {}", pdf_path.display()))?;
                println!("\n📄 PDF report saved to {}", pdf_path.display());
            }
        }
    }

    Ok(())
}
