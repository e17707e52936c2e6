//! In-memory collaborators for tests and offline runs.
//!
//! Each stub implements one collaborator trait without touching the
//! network, pdfium, or an office suite. Stubs that can be asserted on
//! record their calls behind an `Arc<Mutex<_>>` handle obtained before the
//! stub is moved into a [`crate::Converter`].

use crate::analyzer::DocumentAnalyzer;
use crate::converter::FormatConverter;
use crate::error::{Doc2MdError, ExtractionError};
use crate::extractor::ImageExtractor;
use crate::geometry::CropRect;
use crate::model::AnalyzeResult;
use crate::summarizer::ImageSummarizer;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded `(page_number, rect)` pairs.
pub type ExtractCalls = Arc<Mutex<Vec<(u32, CropRect)>>>;

/// Returns a fixed [`AnalyzeResult`], or fails.
#[derive(Debug, Clone)]
pub struct StubAnalyzer {
    result: Option<AnalyzeResult>,
    calls: Arc<Mutex<usize>>,
}

impl StubAnalyzer {
    pub fn new(result: AnalyzeResult) -> Self {
        Self {
            result: Some(result),
            calls: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: None,
            calls: Arc::default(),
        }
    }

    /// Number of documents analysed so far.
    pub fn calls(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl DocumentAnalyzer for StubAnalyzer {
    async fn analyze(&self, _document: Vec<u8>) -> Result<AnalyzeResult, Doc2MdError> {
        if let Ok(mut n) = self.calls.lock() {
            *n += 1;
        }
        self.result.clone().ok_or_else(|| Doc2MdError::AnalysisFailed {
            detail: "stub analyzer failure".to_string(),
        })
    }
}

/// Pretends to crop: returns a fresh path in the output directory without
/// writing it.
#[derive(Debug, Clone, Default)]
pub struct StubExtractor {
    fail: bool,
    calls: ExtractCalls,
}

impl StubExtractor {
    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> ExtractCalls {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl ImageExtractor for StubExtractor {
    async fn extract(
        &self,
        _pdf_path: &Path,
        page_number: u32,
        out_dir: &Path,
        rect: CropRect,
    ) -> Result<PathBuf, ExtractionError> {
        let n = match self.calls.lock() {
            Ok(mut calls) => {
                calls.push((page_number, rect));
                calls.len()
            }
            Err(_) => 0,
        };
        if self.fail {
            return Err(ExtractionError::Pdfium("stub extractor failure".to_string()));
        }
        Ok(out_dir.join(format!("figure_{n}.png")))
    }
}

/// Answers every image with the same summary, or fails.
#[derive(Debug, Clone)]
pub struct StubSummarizer {
    summary: Option<String>,
}

impl StubSummarizer {
    pub fn fixed(summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
        }
    }

    pub fn failing() -> Self {
        Self { summary: None }
    }
}

#[async_trait]
impl ImageSummarizer for StubSummarizer {
    async fn summarize(&self, image_path: &Path) -> Result<String, Doc2MdError> {
        self.summary
            .clone()
            .ok_or_else(|| Doc2MdError::SummarizationFailed {
                path: image_path.to_path_buf(),
                detail: "stub summarizer failure".to_string(),
            })
    }
}

/// Writes a minimal `%PDF` file named after the source, or fails.
#[derive(Debug, Clone, Default)]
pub struct StubConverter {
    fail: bool,
}

impl StubConverter {
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl FormatConverter for StubConverter {
    async fn convert(
        &self,
        source: &Path,
        out_dir: &Path,
        _timeout: Option<Duration>,
    ) -> Result<PathBuf, Doc2MdError> {
        if self.fail {
            return Err(Doc2MdError::ConversionFailed {
                path: source.to_path_buf(),
                detail: "stub converter failure".to_string(),
            });
        }
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let pdf = out_dir.join(format!("{stem}.pdf"));
        let fail = |e: std::io::Error| Doc2MdError::ConversionFailed {
            path: source.to_path_buf(),
            detail: e.to_string(),
        };
        tokio::fs::create_dir_all(out_dir).await.map_err(fail)?;
        tokio::fs::write(&pdf, b"%PDF-1.7\n%%EOF\n")
            .await
            .map_err(fail)?;
        Ok(pdf)
    }
}
