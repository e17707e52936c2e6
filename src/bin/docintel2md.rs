//! CLI binary for docintel2md.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig`, runs the batch and prints the report.

use anyhow::{Context, Result};
use clap::Parser;
use docintel2md::convert::batch_dirs;
use docintel2md::{
    BatchReport, ConversionConfig, ConversionProgressCallback, Converter, FigureRegionPolicy,
    ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch, one log line per file.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the file currently being converted.
    current: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Scanning source directory…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            current: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.current
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_files as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Converting");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_files} document(s)…"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, name: &str) {
        if let Ok(mut t) = self.current.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(name.to_string());
    }

    fn on_file_complete(&self, index: usize, total: usize, name: &str, markdown_len: usize) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            green("✓"),
            index,
            total,
            name,
            dim(&format!("{markdown_len:>6} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let secs = self.elapsed_secs();
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Keep the log line to the first line of the error, truncated.
        let first = error.lines().next().unwrap_or_default();
        let msg: String = if first.chars().count() > 80 {
            format!("{}…", first.chars().take(79).collect::<String>())
        } else {
            first.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            red("✗"),
            index,
            total,
            name,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if failed == 0 && success_count == total_files {
            eprintln!(
                "{} {} documents converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents converted  ({} failed)",
                if success_count == 0 { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert ./source/*.pdf|*.docx into ./output/*.md
  docintel2md

  # Explicit directories
  docintel2md ~/reports ~/reports-md

  # Summarise every region of multi-page figures, stop on first failure
  docintel2md --all-figure-regions --fail-fast

  # Use a specific vision model
  docintel2md --provider openai --model gpt-4.1 ./source ./output

  # Machine-readable batch report
  docintel2md --json > report.json

ENVIRONMENT VARIABLES:
  DI_ENDPOINT             Document Intelligence endpoint (required)
  DI_KEY                  Document Intelligence key (required)
  OPENAI_API_KEY          OpenAI API key (figure summaries)
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium used to crop figures
  RUST_LOG                Log filter, overrides --verbose / --quiet

SETUP:
  1. export DI_ENDPOINT=https://<resource>.cognitiveservices.azure.com
  2. export DI_KEY=...  OPENAI_API_KEY=sk-...
  3. Install LibreOffice for DOCX input (`soffice` on PATH)
  4. docintel2md ./source ./output
"#;

/// Convert a directory of PDF and DOCX documents to Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "docintel2md",
    version,
    about = "Convert PDF and DOCX documents to Markdown via layout analysis",
    long_about = "Analyse every PDF and DOCX file in SOURCE_DIR with Azure AI Document \
Intelligence, rebuild headings, paragraphs and HTML tables in reading order, replace figures \
with vision-model summaries, and write one Markdown file per document to OUTPUT_DIR.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory holding the documents to convert. Default: ./source
    source_dir: Option<PathBuf>,

    /// Directory the Markdown files are written to. Default: ./output
    output_dir: Option<PathBuf>,

    /// Document Intelligence endpoint.
    #[arg(long, env = "DI_ENDPOINT")]
    endpoint: Option<String>,

    /// Document Intelligence key.
    #[arg(long, env = "DI_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Analysis model.
    #[arg(long, env = "DOCINTEL2MD_MODEL_ID", default_value = "prebuilt-layout")]
    model_id: String,

    /// Analysis REST API version.
    #[arg(long, env = "DOCINTEL2MD_API_VERSION", default_value = "2024-11-30")]
    api_version: String,

    /// Delay between analysis status polls, in milliseconds.
    #[arg(long, env = "DOCINTEL2MD_POLL_INTERVAL_MS", default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Give up on one document's analysis after this many seconds.
    #[arg(long, env = "DOCINTEL2MD_ANALYSIS_TIMEOUT", default_value_t = 600)]
    analysis_timeout: u64,

    /// Vision model ID for figure summaries (e.g. gpt-4.1-nano, gpt-4.1).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Vision provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Sampling temperature for summaries (0.0–2.0).
    #[arg(long, env = "DOCINTEL2MD_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max output tokens per figure summary.
    #[arg(long, env = "DOCINTEL2MD_MAX_TOKENS", default_value_t = 1024)]
    max_tokens: usize,

    /// Path to a text file containing a custom summariser system prompt.
    #[arg(long, env = "DOCINTEL2MD_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// DPI figure crops are rendered at (72–600).
    #[arg(long, env = "DOCINTEL2MD_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Summarise every bounding region of a figure, not just the first.
    #[arg(long, env = "DOCINTEL2MD_ALL_FIGURE_REGIONS")]
    all_figure_regions: bool,

    /// Office binary used for DOCX → PDF.
    #[arg(long, env = "DOCINTEL2MD_SOFFICE", default_value = "soffice")]
    soffice: String,

    /// Kill the DOCX → PDF conversion after this many seconds.
    #[arg(long, env = "DOCINTEL2MD_CONVERT_TIMEOUT")]
    convert_timeout: Option<u64>,

    /// Abort the batch on the first failing document.
    #[arg(long, env = "DOCINTEL2MD_FAIL_FAST")]
    fail_fast: bool,

    /// Print the batch report as JSON on stdout.
    #[arg(long, env = "DOCINTEL2MD_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCINTEL2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCINTEL2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCINTEL2MD_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level logs unless --verbose is given.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb).await?;
    let (source_dir, output_dir) = batch_dirs(cli.source_dir.clone(), cli.output_dir.clone());

    // ── Run batch ────────────────────────────────────────────────────────
    let converter = Converter::new(&config).context("Failed to set up converter")?;
    let report = converter
        .convert_dir(&source_dir, &output_dir)
        .await
        .context("Batch conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&report, &output_dir, show_progress);
    }

    if !report.is_success() {
        anyhow::bail!("{} document(s) failed to convert", report.failed().count());
    }
    Ok(())
}

/// Per-file lines when no progress bar printed them, then the totals.
fn print_summary(report: &BatchReport, output_dir: &std::path::Path, show_progress: bool) {
    if !show_progress {
        for f in &report.files {
            match (&f.output, &f.error) {
                (Some(out), None) => eprintln!(
                    "{} {} → {}",
                    green("✓"),
                    f.input.display(),
                    out.display()
                ),
                (_, Some(e)) => eprintln!("{} {}: {}", red("✗"), f.input.display(), e),
                _ => {}
            }
        }
    }

    let (figures, omitted) = report
        .files
        .iter()
        .filter_map(|f| f.stats.as_ref())
        .fold((0, 0), |(s, o), st| {
            (s + st.elements.figures_summarized, o + st.elements.figures_omitted)
        });
    eprintln!(
        "   {} converted, {} failed  —  {} figures summarised, {} omitted  —  {}ms  →  {}",
        report.succeeded().count(),
        report.failed().count(),
        dim(&figures.to_string()),
        dim(&omitted.to_string()),
        report.total_duration_ms,
        bold(&output_dir.display().to_string()),
    );
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .model_id(cli.model_id.clone())
        .api_version(cli.api_version.clone())
        .poll_interval_ms(cli.poll_interval_ms)
        .analysis_timeout_secs(cli.analysis_timeout)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .dpi(cli.dpi)
        .figure_regions(if cli.all_figure_regions {
            FigureRegionPolicy::All
        } else {
            FigureRegionPolicy::First
        })
        .converter_program(cli.soffice.clone())
        .fail_fast(cli.fail_fast);

    if let Some(ref endpoint) = cli.endpoint {
        builder = builder.endpoint(endpoint.clone());
    }
    if let Some(ref key) = cli.key {
        builder = builder.key(key.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(secs) = cli.convert_timeout {
        builder = builder.converter_timeout_secs(secs);
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
