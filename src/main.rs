use anyhow::Result;
use clap::{error::ErrorKind, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use sheet_analyzer::{
    config, logging, routes,
    services::{encoding, file_processor},
    AppState,
};

const LOW_SCORE_THRESHOLD: f64 = 70.0;

/// Excel Data Analyzer
///
/// Profiles every sheet of a workbook and writes a markdown quality report.
#[derive(Parser)]
#[command(name = "sheet_analyzer")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    analyze: AnalyzeArgs,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Path to the workbook (.xlsx, .xlsm, .xls, .ods)
    file: Option<PathBuf>,
    /// Output path for the markdown report (default: <filename>_analysis.md)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the analysis API over HTTP
    Serve,
    /// Report which script files lack a UTF-8 BOM
    CheckEncoding {
        /// Script file or directory to scan recursively
        target: PathBuf,
        /// Extension to look for (default from SHEET_ANALYZER_SCRIPT_EXT or ps1)
        #[arg(long)]
        ext: Option<String>,
    },
    /// Prepend a UTF-8 BOM to script files that lack one
    FixEncoding {
        /// Script file or directory to scan recursively
        target: PathBuf,
        /// Extension to look for (default from SHEET_ANALYZER_SCRIPT_EXT or ps1)
        #[arg(long)]
        ext: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging() {
        eprintln!("Error: failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = config::load_config()?;

    match cli.command {
        Some(Commands::Serve) => serve(config).await,
        Some(Commands::CheckEncoding { target, ext }) => {
            let ext = ext.unwrap_or_else(|| config.script_extension.clone());
            check_encoding(&target, &ext)
        }
        Some(Commands::FixEncoding { target, ext }) => {
            let ext = ext.unwrap_or_else(|| config.script_extension.clone());
            fix_encoding(&target, &ext)
        }
        None => analyze(cli.analyze).await,
    }
}

async fn analyze(args: AnalyzeArgs) -> Result<ExitCode> {
    let Some(file) = args.file else {
        eprintln!("Error: Excel file path is required");
        eprintln!("Usage: sheet_analyzer <excel-file-path> [--output <path>]");
        return Ok(ExitCode::FAILURE);
    };

    if !file.exists() {
        eprintln!("Error: File not found: {}", file.display());
        return Ok(ExitCode::FAILURE);
    }

    let output = args
        .output
        .unwrap_or_else(|| file_processor::default_output_path(&file));

    let report = file_processor::analyze_file_to_report(&file, &output).await?;

    println!("Analysis complete!");
    println!("Overall Quality Score: {:.1}/100", report.overall_score);
    println!("Report saved to: {}", output.display());

    if report.overall_score < LOW_SCORE_THRESHOLD {
        println!();
        println!("Data quality issues detected. Review the report for details.");
    }

    Ok(ExitCode::SUCCESS)
}

async fn serve(config: config::Config) -> Result<ExitCode> {
    let addr = config.bind_addr;
    let state = Arc::new(AppState::new(config));
    let app = routes::app(state);

    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(ExitCode::SUCCESS)
}

fn ensure_exists(target: &Path) -> bool {
    if target.exists() {
        true
    } else {
        eprintln!("Error: {} does not exist", target.display());
        false
    }
}

fn check_encoding(target: &Path, ext: &str) -> Result<ExitCode> {
    if !ensure_exists(target) {
        return Ok(ExitCode::FAILURE);
    }

    println!("Checking: {}", target.display());
    println!("{}", "=".repeat(80));

    let (outcomes, summary) = encoding::check_path(target, ext)?;
    for outcome in &outcomes {
        let status = match &outcome.result {
            Ok(kind) => kind.status().to_string(),
            Err(e) => format!("✗ Error: {}", e),
        };
        println!("{:<40} {}", status, outcome.path.display());
    }

    if target.is_file() {
        return Ok(ExitCode::SUCCESS);
    }

    if outcomes.is_empty() {
        println!("No .{} files found.", ext);
    }

    println!("{}", "=".repeat(80));
    println!("\nSummary:");
    println!("  ✓ UTF-8 with BOM:    {}", summary.utf8_bom);
    println!("  ⚠ UTF-8 without BOM: {} (should be fixed)", summary.utf8_no_bom);
    println!("  ⚠ UTF-16 LE:         {}", summary.utf16_le);
    println!("  ⚠ UTF-16 BE:         {}", summary.utf16_be);
    println!("  ✗ Unknown:           {}", summary.unknown);
    println!("  ✗ Errors:            {}", summary.errors);

    if summary.needs_fix() {
        println!("\nRun `sheet_analyzer fix-encoding` to add a UTF-8 BOM to files without it.");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn fix_encoding(target: &Path, ext: &str) -> Result<ExitCode> {
    if !ensure_exists(target) {
        return Ok(ExitCode::FAILURE);
    }

    println!("Processing: {}", target.display());
    println!("{}", "-".repeat(60));

    let (outcomes, summary) = encoding::fix_path(target, ext)?;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(encoding::FixAction::Fixed) => {
                println!("✓ {} - Added UTF-8 BOM", outcome.path.display())
            }
            Ok(encoding::FixAction::Skipped) => {
                println!("✓ {} - Already has UTF-8 BOM", outcome.path.display())
            }
            Err(e) => println!("✗ {} - Failed to add BOM: {}", outcome.path.display(), e),
        }
    }

    if target.is_dir() {
        println!("{}", "-".repeat(60));
        println!(
            "Summary: {} fixed, {} skipped, {} errors",
            summary.fixed, summary.skipped, summary.errors
        );
    }

    if summary.errors > 0 {
        return Ok(ExitCode::FAILURE);
    }

    println!("\n✓ Done!");
    Ok(ExitCode::SUCCESS)
}
