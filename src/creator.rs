//! Markdown creation for one analysed document.

use crate::error::Doc2MdError;
use crate::model::AnalyzeResult;
use crate::output::ElementStats;
use crate::pipeline::assemble::assemble;
use crate::pipeline::figure::FigureSubstituter;
use crate::pipeline::linearize::linearize;
use std::path::Path;
use tracing::debug;

/// Turns an [`AnalyzeResult`] into Markdown.
///
/// The same creator can be reused across documents; it holds no
/// per-document state.
#[derive(Clone)]
pub struct MarkdownCreator {
    figures: FigureSubstituter,
}

impl MarkdownCreator {
    pub fn new(figures: FigureSubstituter) -> Self {
        Self { figures }
    }

    /// Render `result`, cropping figures from `source_pdf` into `scratch_dir`.
    ///
    /// `source_pdf` must be the same document that produced `result`.
    pub async fn create(
        &self,
        result: &AnalyzeResult,
        source_pdf: &Path,
        scratch_dir: &Path,
    ) -> Result<(String, ElementStats), Doc2MdError> {
        let linearized = linearize(result, &self.figures, source_pdf, scratch_dir).await?;
        let markdown = assemble(&linearized.fragments);
        debug!(
            "{}: {} fragments → {} bytes of Markdown",
            source_pdf.display(),
            linearized.fragments.len(),
            markdown.len()
        );
        Ok((markdown, linearized.stats))
    }
}
