//! Figure cropping: render a PDF page region to a PNG file.
//!
//! pdfium is not async-safe, so [`PdfiumImageExtractor`] does its work inside
//! `tokio::task::spawn_blocking`. The page is rendered at `dpi / 72` pixels
//! per point and the crop rectangle (in points) is scaled the same way, so
//! the crop is as sharp as the chosen DPI allows.
//!
//! Every failure here is an [`ExtractionError`]: the caller drops the figure
//! and carries on.

use crate::error::ExtractionError;
use crate::geometry::{render_scale, CropRect};
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Crops a region of a PDF page into an image file.
#[async_trait]
pub trait ImageExtractor: Send + Sync {
    /// Render `rect` (points, top-left origin) of page `page_number`
    /// (1-based) of `pdf_path` into a new PNG inside `out_dir`.
    ///
    /// Returns the path of the written file.
    async fn extract(
        &self,
        pdf_path: &Path,
        page_number: u32,
        out_dir: &Path,
        rect: CropRect,
    ) -> Result<PathBuf, ExtractionError>;
}

/// [`ImageExtractor`] backed by pdfium.
#[derive(Debug, Clone)]
pub struct PdfiumImageExtractor {
    dpi: u32,
}

impl PdfiumImageExtractor {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }
}

impl Default for PdfiumImageExtractor {
    fn default() -> Self {
        Self::new(crate::geometry::RENDER_DPI)
    }
}

#[async_trait]
impl ImageExtractor for PdfiumImageExtractor {
    async fn extract(
        &self,
        pdf_path: &Path,
        page_number: u32,
        out_dir: &Path,
        rect: CropRect,
    ) -> Result<PathBuf, ExtractionError> {
        let pdf = pdf_path.to_path_buf();
        let target = out_dir.join(unique_png_name(pdf_path));
        let dir = out_dir.to_path_buf();
        let dpi = self.dpi;

        tokio::task::spawn_blocking(move || {
            extract_blocking(&pdf, page_number, &dir, &target, rect, dpi)
        })
        .await
        .map_err(|e| ExtractionError::Pdfium(format!("render task panicked: {e}")))?
    }
}

/// Blocking implementation of [`PdfiumImageExtractor::extract`].
fn extract_blocking(
    pdf_path: &Path,
    page_number: u32,
    out_dir: &Path,
    target: &Path,
    rect: CropRect,
    dpi: u32,
) -> Result<PathBuf, ExtractionError> {
    std::fs::create_dir_all(out_dir).map_err(|e| ExtractionError::FileAccess {
        path: out_dir.to_path_buf(),
        detail: e.to_string(),
    })?;

    if !pdf_path.is_file() {
        return Err(ExtractionError::FileAccess {
            path: pdf_path.to_path_buf(),
            detail: "not a readable file".to_string(),
        });
    }

    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| ExtractionError::Pdfium(format!("{e:?}")))?;

    let pages = document.pages();
    let total = pages.len() as u32;
    if page_number == 0 || page_number > total {
        return Err(ExtractionError::PageOutOfRange {
            page: page_number,
            total,
        });
    }

    let page = pages
        .get((page_number - 1) as u16)
        .map_err(|e| ExtractionError::Pdfium(format!("{e:?}")))?;

    let scale = render_scale(dpi);
    let render_config = PdfRenderConfig::new().scale_page_by_factor(scale as f32);
    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| ExtractionError::Pdfium(format!("{e:?}")))?;
    let image = bitmap.as_image();

    let px = rect
        .to_pixels(scale, image.width(), image.height())
        .ok_or(ExtractionError::EmptyCrop { page: page_number })?;
    let cropped = image.crop_imm(px.x, px.y, px.width, px.height);

    cropped
        .save_with_format(target, image::ImageFormat::Png)
        .map_err(|e| ExtractionError::Encode(e.to_string()))?;

    debug!(
        "Cropped page {} {:?} → {}x{} px → {}",
        page_number,
        rect.as_array(),
        px.width,
        px.height,
        target.display()
    );
    Ok(target.to_path_buf())
}

/// Bind to `PDFIUM_LIB_PATH` if set, else a library next to the binary,
/// else the system library.
fn bind_pdfium() -> Result<Pdfium, ExtractionError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(path),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ExtractionError::Pdfium(format!("failed to bind pdfium library: {e:?}")))?;

    Ok(Pdfium::new(bindings))
}

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// `{stem}_{unix_nanos}_{seq}.png`, where `stem` is the file name up to its
/// first dot. The sequence number keeps names unique even when two crops
/// land in the same clock tick.
fn unique_png_name(pdf_path: &Path) -> String {
    let stem = crate::input::base_name(pdf_path);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{stem}_{nanos}_{seq}.png")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_names_are_unique() {
        let path = Path::new("/docs/report.final.pdf");
        let a = unique_png_name(path);
        let b = unique_png_name(path);
        assert_ne!(a, b);
        assert!(a.starts_with("report_"));
        assert!(a.ends_with(".png"));
    }

    #[tokio::test]
    async fn missing_pdf_is_file_access_error() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = PdfiumImageExtractor::default();
        let rect = CropRect {
            left: 0.0,
            top: 0.0,
            right: 72.0,
            bottom: 72.0,
        };
        let err = extractor
            .extract(&dir.path().join("absent.pdf"), 1, dir.path(), rect)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::FileAccess { .. }), "got {err:?}");
    }
}
