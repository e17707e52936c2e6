//! Error types for the docintel2md library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Doc2MdError`] — **Fatal**: the file (or the whole batch) cannot
//!   proceed: a collaborator is not configured, the source directory is
//!   missing, the analysis service rejected the document. Returned as
//!   `Err(Doc2MdError)` from the `convert*` functions.
//!
//! * [`ExtractionError`] — **Non-fatal**: one figure could not be cropped out
//!   of its page. The figure is dropped from the Markdown and the document
//!   carries on.
//!
//! Section references of an unknown kind are not errors at all; the
//! linearizer skips them.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docintel2md library.
#[derive(Debug, Error)]
pub enum Doc2MdError {
    // ── Configuration errors ─────────────────────────────────────────────
    /// The document-analysis endpoint or key is missing.
    #[error("Document analysis service is not configured: {missing} is not set.\nSet DI_ENDPOINT and DI_KEY, or pass --endpoint / --key.")]
    AnalyzerNotConfigured { missing: &'static str },

    /// The configured LLM provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ─────────────────────────────────────────────────────
    /// The batch source directory does not exist or is not a directory.
    #[error("Source directory '{path}' does not exist")]
    SourceDirNotFound { path: PathBuf },

    /// The batch source directory contains no files.
    #[error("Source directory '{path}' has no files")]
    SourceDirEmpty { path: PathBuf },

    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file extension is neither `.pdf` nor `.docx`.
    #[error("Unsupported input format: '{path}' (expected .pdf or .docx)")]
    UnsupportedFormat { path: PathBuf },

    /// The file claims to be a PDF but does not start with `%PDF`.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Analysis errors ──────────────────────────────────────────────────
    /// The analysis service rejected the request or reported a failed operation.
    #[error("Document analysis failed: {detail}")]
    AnalysisFailed { detail: String },

    /// The analysis operation did not finish within the configured timeout.
    #[error("Document analysis timed out after {secs}s")]
    AnalysisTimeout { secs: u64 },

    /// The service answered, but the body is not a usable analysis result.
    #[error("Invalid analysis result: {0}")]
    InvalidAnalysisResult(String),

    // ── Collaborator errors ──────────────────────────────────────────────
    /// The vision model could not summarise a cropped figure.
    #[error("Image summarisation failed for '{path}': {detail}")]
    SummarizationFailed { path: PathBuf, detail: String },

    /// The external format converter exited unsuccessfully or produced nothing.
    #[error("Converting '{path}' to PDF failed: {detail}")]
    ConversionFailed { path: PathBuf, detail: String },

    /// The external format converter ran past its timeout and was killed.
    #[error("Converting '{path}' to PDF timed out after {secs}s")]
    ConversionTimeout { path: PathBuf, secs: u64 },

    // ── I/O errors ───────────────────────────────────────────────────────
    /// Could not create or write an output Markdown file or directory.
    #[error("Failed to write output '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two inputs in one batch map to the same Markdown file.
    #[error("Output '{path}' is already produced by '{first}'")]
    DuplicateOutput { path: PathBuf, first: PathBuf },

    /// The per-batch scratch directory could not be created.
    #[error("Failed to create scratch directory: {0}")]
    ScratchDir(#[source] std::io::Error),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure to crop a figure out of its source page.
///
/// The figure is omitted from the output; conversion continues.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ExtractionError {
    /// The source PDF or the output directory could not be accessed.
    #[error("cannot access '{path}': {detail}")]
    FileAccess { path: PathBuf, detail: String },

    /// pdfium could not be bound or could not parse the document.
    #[error("pdfium: {0}")]
    Pdfium(String),

    /// The page number is 0 or beyond the end of the document.
    #[error("page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: u32, total: u32 },

    /// The crop rectangle has no area once clamped to the rendered page.
    #[error("crop rectangle is empty on page {page}")]
    EmptyCrop { page: u32 },

    /// The polygon does not carry the corners needed for a crop rectangle.
    #[error("bounding polygon has {len} coordinates, need at least 6")]
    BadPolygon { len: usize },

    /// PNG encoding or writing failed.
    #[error("failed to write PNG: {0}")]
    Encode(String),
}
