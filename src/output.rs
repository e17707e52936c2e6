//! Output types: converted Markdown, per-document statistics, batch report.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How many of each element kind made it into the Markdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementStats {
    pub paragraphs: usize,
    pub tables: usize,
    pub figures_summarized: usize,
    /// Figures with no bounding region or whose crop failed.
    pub figures_omitted: usize,
    /// Section references of an unknown kind or pointing past the end of
    /// their array.
    pub skipped_elements: usize,
}

/// Statistics for one converted document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    #[serde(flatten)]
    pub elements: ElementStats,
    /// Time spent in DOCX → PDF conversion (0 for PDF input).
    pub format_conversion_ms: u64,
    pub analysis_duration_ms: u64,
    /// Time spent linearising, including figure crops and summaries.
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Result of converting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub markdown: String,
    pub stats: ConversionStats,
}

/// Outcome of one file in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub input: PathBuf,
    /// The Markdown file written, if the conversion succeeded.
    pub output: Option<PathBuf>,
    pub stats: Option<ConversionStats>,
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a batch over a source directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub files: Vec<FileOutcome>,
    pub total_duration_ms: u64,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| !f.is_success())
    }

    /// True when every file converted.
    pub fn is_success(&self) -> bool {
        self.files.iter().all(FileOutcome::is_success)
    }
}
