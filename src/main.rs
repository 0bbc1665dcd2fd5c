//! `omr`: render answer sheets, extract answers from scans, grade results.
//!
//! Every command prints exactly one JSON document to stdout. Logs go to
//! stderr and follow `RUST_LOG`.
//!
//! # Usage
//!
//! ```bash
//! omr render --output-dir public/generated-sheets exam.json
//! omr render '{"title": "Algebra", "questions": [{}, {}]}'
//! omr extract scans.zip page.png
//! omr grade --key key.json extraction.json
//! ```

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use omr_sheet::batch::{BatchAggregator, ExtractResponse};
use omr_sheet::core::{DEFAULT_DOCUMENT_DPI, OmrResult};
use omr_sheet::domain::{LayoutParams, SheetLayout, compute_layout};
use omr_sheet::extract::{
    BlankRecognizer, ExtractorConfig, FieldExtractor, TesseractRecognizer, TextRecognizer,
};
use omr_sheet::grading::{AnswerKey, grade_all};
use omr_sheet::ingest::{IngestConfig, PageIngestor};
use omr_sheet::render::{ExamDefinition, RenderConfig, SheetRenderer};
use omr_sheet::utils::init_tracing;

#[derive(Parser)]
#[command(name = "omr")]
#[command(about = "Generate OMR answer sheets and read them back from scans")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render answer sheets for an exam definition.
    Render(RenderArgs),
    /// Extract fields and answers from images, PDFs and archives.
    Extract(ExtractArgs),
    /// Grade an extraction response against an answer key.
    Grade(GradeArgs),
}

#[derive(Args)]
struct LayoutArgs {
    /// JSON file overriding the default sheet geometry.
    ///
    /// Sheets must be extracted with the same layout they were rendered with.
    #[arg(long)]
    layout: Option<PathBuf>,
}

impl LayoutArgs {
    fn build(&self) -> OmrResult<Arc<SheetLayout>> {
        let params = match &self.layout {
            Some(path) => LayoutParams::from_json_file(path)?,
            None => LayoutParams::default(),
        };
        Ok(Arc::new(compute_layout(params)?))
    }
}

#[derive(Args)]
struct RenderArgs {
    #[command(flatten)]
    layout: LayoutArgs,

    /// Directory the sheets are written to.
    #[arg(long, default_value = "public/generated-sheets")]
    output_dir: PathBuf,

    /// Prefix of the URLs returned for the written documents.
    #[arg(long, default_value = "/generated-sheets")]
    url_prefix: String,

    /// TrueType/OpenType font for sheet text. System fonts are tried when unset.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Exam definition: inline JSON, a JSON file, or `-` for stdin.
    payload: String,
}

#[derive(Args)]
struct ExtractArgs {
    #[command(flatten)]
    layout: LayoutArgs,

    /// Skip text recognition; only answers are read.
    #[arg(long)]
    no_ocr: bool,

    /// The tesseract executable.
    #[arg(long, default_value = "tesseract")]
    tesseract: PathBuf,

    /// Tesseract language, e.g. `eng` or `fra`.
    #[arg(long)]
    lang: Option<String>,

    /// Rasterisation density for PDF pages.
    #[arg(long, default_value_t = DEFAULT_DOCUMENT_DPI)]
    dpi: f32,

    /// The program used to unpack RAR archives.
    #[arg(long, default_value = "unar")]
    unar: PathBuf,

    /// Resample pages that are not the size of the layout's page.
    #[arg(long)]
    resize_to_layout: bool,

    /// Images (png, jpg, jpeg), PDFs and ZIP/RAR archives.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Args)]
struct GradeArgs {
    /// Answer key JSON: `{"exam_id": ..., "answers": {"Q1": "B", ...}}`.
    #[arg(long)]
    key: PathBuf,

    /// Output of `omr extract`.
    extraction: PathBuf,
}

/// The render payload: `-` reads stdin, an argument starting with `{` is the
/// JSON itself, anything else is a path.
fn read_payload(arg: &str) -> OmrResult<String> {
    if arg == "-" {
        Ok(std::io::read_to_string(std::io::stdin())?)
    } else if arg.trim_start().starts_with('{') {
        Ok(arg.to_string())
    } else {
        Ok(std::fs::read_to_string(Path::new(arg))?)
    }
}

fn render(args: &RenderArgs) -> OmrResult<serde_json::Value> {
    let payload = read_payload(&args.payload)?;
    let exam: ExamDefinition = serde_json::from_str(&payload)?;

    let config = RenderConfig {
        output_dir: args.output_dir.clone(),
        url_prefix: args.url_prefix.clone(),
        font_path: args.font.clone(),
    };
    let renderer = SheetRenderer::new(args.layout.build()?, config);
    let outcome = renderer.render(&exam)?;
    info!(
        "Rendered {} sheet(s) for exam {}",
        outcome.sheets.len(),
        outcome.exam_id
    );
    to_json(&outcome.response())
}

fn extract(args: &ExtractArgs) -> OmrResult<serde_json::Value> {
    let recognizer: Box<dyn TextRecognizer> = if args.no_ocr {
        Box::new(BlankRecognizer)
    } else {
        let tesseract = TesseractRecognizer::new(&args.tesseract);
        Box::new(match &args.lang {
            Some(lang) => tesseract.with_language(lang),
            None => tesseract,
        })
    };
    let config = ExtractorConfig {
        resize_to_layout: args.resize_to_layout,
        ..ExtractorConfig::default()
    };
    let extractor = FieldExtractor::new(args.layout.build()?, recognizer, config)?;
    let ingestor = PageIngestor::new(IngestConfig {
        dpi: args.dpi,
        unar_program: args.unar.clone(),
    })?;

    let response = BatchAggregator::new(ingestor, extractor).run_response(&args.inputs)?;
    info!("Extracted {} page(s)", response.extracted_data.len());
    to_json(&response)
}

fn grade(args: &GradeArgs) -> OmrResult<serde_json::Value> {
    let key = AnswerKey::from_json_file(&args.key)?;
    let extraction: ExtractResponse =
        serde_json::from_str(&std::fs::read_to_string(&args.extraction)?)?;
    to_json(&grade_all(&extraction, &key))
}

fn to_json<T: Serialize>(value: &T) -> OmrResult<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}

/// The single stdout line of a command and whether it succeeded.
struct Reply {
    line: String,
    success: bool,
}

fn run(cli: &Cli) -> Reply {
    let outcome = match &cli.command {
        Command::Render(args) => render(args),
        Command::Extract(args) => extract(args),
        Command::Grade(args) => grade(args),
    };

    match outcome {
        Ok(response) => Reply {
            line: response.to_string(),
            success: true,
        },
        Err(e) => {
            let message = e.to_report_string();
            error!("{message}");
            Reply {
                line: serde_json::json!({ "error": message }).to_string(),
                success: false,
            }
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let reply = run(&cli);
    println!("{}", reply.line);
    if reply.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
