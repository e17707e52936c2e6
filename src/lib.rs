//! # docintel2md
//!
//! Convert PDF and DOCX documents to Markdown from a layout analysis.
//!
//! ## Why this crate?
//!
//! A layout-analysis service already knows where the titles, headings,
//! tables and figures of a document are, but hands them back as flat arrays
//! plus a reading-order tree. This crate re-linearizes that result into
//! Markdown: headings by paragraph role, HTML tables with their row and
//! column spans, and each figure replaced by a vision-model summary of the
//! cropped page region.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / DOCX
//!  │
//!  ├─ 1. Input      DOCX → PDF through LibreOffice (scratch dir)
//!  ├─ 2. Analyse    layout analysis REST call, poll until done
//!  ├─ 3. Linearize  sections → paragraphs / tables / figures, in order
//!  │     └─ Figure  crop via pdfium (spawn_blocking) → vision summary
//!  └─ 4. Assemble   join fragments → Markdown + stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docintel2md::{convert_dir, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // DI_ENDPOINT / DI_KEY for analysis; OPENAI_API_KEY (or similar) for summaries
//!     let config = ConversionConfig::from_env();
//!     let report = convert_dir("./source", "./output", &config).await?;
//!     eprintln!("{} converted, {} failed",
//!         report.succeeded().count(),
//!         report.failed().count());
//!     Ok(())
//! }
//! ```
//!
//! ## Custom collaborators
//!
//! Each external dependency sits behind a trait ([`DocumentAnalyzer`],
//! [`ImageExtractor`], [`ImageSummarizer`], [`FormatConverter`]). Pass your
//! own implementations to [`Converter::with_collaborators`]; the
//! [`testing`] module has offline stubs.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docintel2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docintel2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyzer;
pub mod config;
pub mod convert;
pub mod converter;
pub mod creator;
pub mod error;
pub mod extractor;
pub mod geometry;
pub mod input;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod summarizer;
pub mod testing;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyzer::{AzureDocumentAnalyzer, DocumentAnalyzer};
pub use config::{ConversionConfig, ConversionConfigBuilder, FigureRegionPolicy};
pub use convert::{convert_dir, convert_dir_sync, convert_file, convert_sync, Converter};
pub use converter::{FormatConverter, SofficeConverter};
pub use creator::MarkdownCreator;
pub use error::{Doc2MdError, ExtractionError};
pub use extractor::{ImageExtractor, PdfiumImageExtractor};
pub use geometry::CropRect;
pub use model::AnalyzeResult;
pub use output::{BatchReport, ConversionOutput, ConversionStats, ElementStats, FileOutcome};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use summarizer::{ImageSummarizer, LlmImageSummarizer};
