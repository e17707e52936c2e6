//! Conversion entry points: one document, or a whole source directory.
//!
//! [`Converter`] owns the four collaborators. Files are processed one at a
//! time; every intermediate artefact (DOCX → PDF output, figure crops) goes
//! into a scratch [`TempDir`] that lives exactly as long as the batch, and is
//! removed on every exit path when it is dropped.

use crate::analyzer::{AzureDocumentAnalyzer, DocumentAnalyzer};
use crate::config::ConversionConfig;
use crate::converter::{FormatConverter, SofficeConverter};
use crate::creator::MarkdownCreator;
use crate::error::Doc2MdError;
use crate::extractor::{ImageExtractor, PdfiumImageExtractor};
use crate::input;
use crate::output::{BatchReport, ConversionOutput, ConversionStats, FileOutcome};
use crate::pipeline::figure::FigureSubstituter;
use crate::progress::ProgressCallback;
use crate::summarizer::{ImageSummarizer, LlmImageSummarizer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{error, info, warn};

/// Document-to-Markdown converter.
#[derive(Clone)]
pub struct Converter {
    analyzer: Arc<dyn DocumentAnalyzer>,
    format_converter: Arc<dyn FormatConverter>,
    creator: MarkdownCreator,
    converter_timeout: Option<Duration>,
    fail_fast: bool,
    progress: Option<ProgressCallback>,
}

impl Converter {
    /// Build a converter with the production collaborators: the analysis
    /// REST service, pdfium, an `edgequake-llm` vision provider, LibreOffice.
    ///
    /// Fails when the analysis endpoint/key or the vision provider is not
    /// configured.
    pub fn new(config: &ConversionConfig) -> Result<Self, Doc2MdError> {
        let analyzer = AzureDocumentAnalyzer::from_config(config)?;
        let summarizer = LlmImageSummarizer::from_config(config)?;
        Ok(Self::with_collaborators(
            config,
            Arc::new(analyzer),
            Arc::new(PdfiumImageExtractor::new(config.dpi)),
            Arc::new(summarizer),
            Arc::new(SofficeConverter::new(config.converter_program.clone())),
        ))
    }

    /// Build a converter from caller-supplied collaborators.
    pub fn with_collaborators(
        config: &ConversionConfig,
        analyzer: Arc<dyn DocumentAnalyzer>,
        extractor: Arc<dyn ImageExtractor>,
        summarizer: Arc<dyn ImageSummarizer>,
        format_converter: Arc<dyn FormatConverter>,
    ) -> Self {
        let figures = FigureSubstituter::new(extractor, summarizer, config.figure_regions);
        Self {
            analyzer,
            format_converter,
            creator: MarkdownCreator::new(figures),
            converter_timeout: config.converter_timeout_secs.map(Duration::from_secs),
            fail_fast: config.fail_fast,
            progress: config.progress_callback.clone(),
        }
    }

    /// Convert one PDF or DOCX file to Markdown.
    ///
    /// Intermediate files are written into `scratch_dir`, which the caller
    /// owns and cleans up.
    pub async fn convert_file(
        &self,
        path: &Path,
        scratch_dir: &Path,
    ) -> Result<ConversionOutput, Doc2MdError> {
        let total_start = Instant::now();
        info!("Starting conversion: {}", path.display());

        // ── Step 1: Resolve to a PDF ─────────────────────────────────────
        let format_start = Instant::now();
        let pdf = input::prepare_pdf(
            path,
            self.format_converter.as_ref(),
            scratch_dir,
            self.converter_timeout,
        )
        .await?;
        let format_conversion_ms = if pdf == path {
            0
        } else {
            format_start.elapsed().as_millis() as u64
        };

        // ── Step 2: Analyse ──────────────────────────────────────────────
        let analysis_start = Instant::now();
        let bytes = tokio::fs::read(&pdf).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => Doc2MdError::PermissionDenied { path: pdf.clone() },
            _ => Doc2MdError::FileNotFound { path: pdf.clone() },
        })?;
        let result = self.analyzer.analyze(bytes).await?;
        let analysis_duration_ms = analysis_start.elapsed().as_millis() as u64;

        // ── Step 3: Render Markdown ──────────────────────────────────────
        let render_start = Instant::now();
        let (markdown, elements) = self.creator.create(&result, &pdf, scratch_dir).await?;
        let render_duration_ms = render_start.elapsed().as_millis() as u64;

        let stats = ConversionStats {
            elements,
            format_conversion_ms,
            analysis_duration_ms,
            render_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };
        info!(
            "Converted {}: {} paragraphs, {} tables, {}/{} figures in {}ms",
            path.display(),
            elements.paragraphs,
            elements.tables,
            elements.figures_summarized,
            elements.figures_summarized + elements.figures_omitted,
            stats.total_duration_ms
        );

        Ok(ConversionOutput { markdown, stats })
    }

    /// Convert `path` and write the Markdown to `output_path`.
    pub async fn convert_to_file(
        &self,
        path: &Path,
        output_path: &Path,
        scratch_dir: &Path,
    ) -> Result<ConversionOutput, Doc2MdError> {
        let output = self.convert_file(path, scratch_dir).await?;
        write_atomic(output_path, &output.markdown).await?;
        Ok(output)
    }

    /// Convert every PDF and DOCX file in `source_dir` into
    /// `{output_dir}/{base}.md`.
    ///
    /// Inputs sharing a base name (`a.pdf`, `a.docx`) share a target; the
    /// first in sorted order claims it and the rest are recorded as
    /// [`Doc2MdError::DuplicateOutput`] failures.
    ///
    /// Returns `Err` only when the source directory is missing or empty, the
    /// output or scratch directory cannot be created, or (with `fail_fast`)
    /// for the first failing file. Otherwise per-file failures are recorded
    /// in the report.
    pub async fn convert_dir(
        &self,
        source_dir: &Path,
        output_dir: &Path,
    ) -> Result<BatchReport, Doc2MdError> {
        let batch_start = Instant::now();

        let files = input::eligible_files(source_dir)?;
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| Doc2MdError::OutputWriteFailed {
                path: output_dir.to_path_buf(),
                source: e,
            })?;
        let scratch = TempDir::new().map_err(Doc2MdError::ScratchDir)?;

        let total = files.len();
        if let Some(ref cb) = self.progress {
            cb.on_batch_start(total);
        }

        let mut report = BatchReport::default();
        let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
        for (i, path) in files.iter().enumerate() {
            let index = i + 1;
            let name = display_name(path);
            if let Some(ref cb) = self.progress {
                cb.on_file_start(index, total, &name);
            }

            let target = input::output_path(output_dir, path);
            let result = match claimed.get(&target) {
                Some(first) => {
                    warn!(
                        "{} and {} both map to {}",
                        first.display(),
                        path.display(),
                        target.display()
                    );
                    Err(Doc2MdError::DuplicateOutput {
                        path: target.clone(),
                        first: first.clone(),
                    })
                }
                None => {
                    claimed.insert(target.clone(), path.clone());
                    self.convert_to_file(path, &target, scratch.path()).await
                }
            };
            match result {
                Ok(output) => {
                    if let Some(ref cb) = self.progress {
                        cb.on_file_complete(index, total, &name, output.markdown.len());
                    }
                    report.files.push(FileOutcome {
                        input: path.clone(),
                        output: Some(target),
                        stats: Some(output.stats),
                        error: None,
                    });
                }
                Err(e) => {
                    error!("Failed to convert {}: {}", path.display(), e);
                    if let Some(ref cb) = self.progress {
                        cb.on_file_error(index, total, &name, &e.to_string());
                    }
                    if self.fail_fast {
                        if let Some(ref cb) = self.progress {
                            cb.on_batch_complete(total, report.files.len());
                        }
                        return Err(e);
                    }
                    report.files.push(FileOutcome {
                        input: path.clone(),
                        output: None,
                        stats: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        report.total_duration_ms = batch_start.elapsed().as_millis() as u64;
        let succeeded = report.succeeded().count();
        if let Some(ref cb) = self.progress {
            cb.on_batch_complete(total, succeeded);
        }
        info!(
            "Batch complete: {}/{} converted in {}ms",
            succeeded, total, report.total_duration_ms
        );
        Ok(report)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Write to a sibling temp file, then rename over the target.
async fn write_atomic(path: &Path, contents: &str) -> Result<(), Doc2MdError> {
    let fail = |e: std::io::Error| Doc2MdError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }
    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, contents).await.map_err(fail)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(fail)?;
    Ok(())
}

/// Convert a single file with the production collaborators.
///
/// A scratch directory is created for the call and removed afterwards.
///
/// # Example
///
/// ```rust,no_run
/// use docintel2md::{convert_file, ConversionConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     // Endpoint and key from DI_ENDPOINT / DI_KEY; vision provider from OPENAI_API_KEY etc.
///     let config = ConversionConfig::from_env();
///     let output = convert_file("report.pdf", &config).await?;
///     println!("{}", output.markdown);
///     Ok(())
/// }
/// ```
pub async fn convert_file(
    path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Doc2MdError> {
    let converter = Converter::new(config)?;
    let scratch = TempDir::new().map_err(Doc2MdError::ScratchDir)?;
    converter.convert_file(path.as_ref(), scratch.path()).await
}

/// Convert a source directory with the production collaborators.
pub async fn convert_dir(
    source_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<BatchReport, Doc2MdError> {
    Converter::new(config)?
        .convert_dir(source_dir.as_ref(), output_dir.as_ref())
        .await
}

/// Synchronous wrapper around [`convert_dir`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_dir_sync(
    source_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<BatchReport, Doc2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Doc2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_dir(source_dir, output_dir, config))
}

/// Synchronous wrapper around [`convert_file`].
pub fn convert_sync(
    path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Doc2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Doc2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_file(path, config))
}

/// Default batch directories.
pub const DEFAULT_SOURCE_DIR: &str = "./source";
pub const DEFAULT_OUTPUT_DIR: &str = "./output";

/// The `(source, output)` pair, falling back to the defaults.
pub fn batch_dirs(source: Option<PathBuf>, output: Option<PathBuf>) -> (PathBuf, PathBuf) {
    (
        source.unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_DIR)),
        output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
    )
}
