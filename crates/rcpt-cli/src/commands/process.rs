//! Process command - extract data from a single receipt file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use rcpt_core::{create_recognizer, MimeType, ReceiptPipeline, TextRecognizer};

use super::load_config;
use super::output::{format_result, OutputFormat};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PNG, JPEG or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Declared MIME type (default: guessed from the file extension)
    #[arg(long)]
    mime: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Print review warnings to stderr
    #[arg(long)]
    show_warnings: bool,
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let mime = match &args.mime {
        Some(mime) => mime.clone(),
        None => mime_for_path(&args.input)?.as_str().to_string(),
    };

    let config = load_config(config_path)?;

    info!("Processing file: {} ({})", args.input.display(), mime);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);

    pb.set_message("Loading OCR engine...");
    let recognizer = create_recognizer(&config.ocr)
        .map_err(|e| anyhow::anyhow!("Failed to create OCR engine: {}", e))?;

    pb.set_message(format!("Recognizing text with {}...", recognizer.name()));
    let data = fs::read(&args.input)?;
    let pipeline = ReceiptPipeline::from_config(recognizer, &config);
    let result = pipeline.process(&data, &mime);

    pb.finish_and_clear();
    let result = result?;

    if args.show_warnings && !result.warnings.is_empty() {
        eprintln!("{}", style("Review warnings:").yellow());
        for warning in &result.warnings {
            eprintln!("  - {}", warning);
        }
    }

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// MIME type implied by a file's extension.
pub fn mime_for_path(path: &Path) -> anyhow::Result<MimeType> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match MimeType::from_extension(&extension) {
        Some(mime) => Ok(mime),
        None => anyhow::bail!("Unsupported file format: {}", extension),
    }
}
