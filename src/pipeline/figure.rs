//! Figure substitution: replace a figure with a caption summarising it.
//!
//! A figure is cropped out of its page through the [`ImageExtractor`], the
//! crop is described by the [`ImageSummarizer`], and the description is
//! wrapped by [`crate::prompts::figure_caption`]. A figure that cannot be
//! cropped is dropped from the output; a summariser error is fatal.

use crate::config::FigureRegionPolicy;
use crate::error::Doc2MdError;
use crate::extractor::ImageExtractor;
use crate::geometry::region_crop;
use crate::model::{BoundingRegion, Figure};
use crate::prompts::figure_caption;
use crate::summarizer::ImageSummarizer;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Turns figures into captions.
#[derive(Clone)]
pub struct FigureSubstituter {
    extractor: Arc<dyn ImageExtractor>,
    summarizer: Arc<dyn ImageSummarizer>,
    policy: FigureRegionPolicy,
}

impl FigureSubstituter {
    pub fn new(
        extractor: Arc<dyn ImageExtractor>,
        summarizer: Arc<dyn ImageSummarizer>,
        policy: FigureRegionPolicy,
    ) -> Self {
        Self {
            extractor,
            summarizer,
            policy,
        }
    }

    /// Caption for `figure`, or `None` when the figure is omitted.
    ///
    /// Crops are written into `scratch_dir`.
    pub async fn render(
        &self,
        figure: &Figure,
        pdf_path: &Path,
        scratch_dir: &Path,
    ) -> Result<Option<String>, Doc2MdError> {
        let regions: &[BoundingRegion] = match self.policy {
            FigureRegionPolicy::First => figure.bounding_regions.get(..1).unwrap_or(&[]),
            FigureRegionPolicy::All => &figure.bounding_regions,
        };

        let mut captions = Vec::with_capacity(regions.len());
        for region in regions {
            if let Some(caption) = self.render_region(figure, region, pdf_path, scratch_dir).await? {
                captions.push(caption);
            }
        }

        if captions.is_empty() {
            return Ok(None);
        }
        Ok(Some(captions.join("\n")))
    }

    async fn render_region(
        &self,
        figure: &Figure,
        region: &BoundingRegion,
        pdf_path: &Path,
        scratch_dir: &Path,
    ) -> Result<Option<String>, Doc2MdError> {
        let label = figure.id.as_deref().unwrap_or("<unnamed>");

        let (page, rect) = match region_crop(region) {
            Ok(crop) => crop,
            Err(e) => {
                warn!("Figure {label}: {e}; omitted");
                return Ok(None);
            }
        };

        let image = match self.extractor.extract(pdf_path, page, scratch_dir, rect).await {
            Ok(path) => path,
            Err(e) => {
                warn!("Figure {label} on page {page}: {e}; omitted");
                return Ok(None);
            }
        };

        let summary = self.summarizer.summarize(&image).await?;
        debug!("Figure {label} on page {page}: {} chars of summary", summary.len());
        Ok(Some(figure_caption(&summary)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubExtractor, StubSummarizer};

    fn region(page: u32) -> BoundingRegion {
        BoundingRegion {
            page_number: page,
            polygon: vec![1.0, 1.0, 3.0, 1.0, 3.0, 2.0, 1.0, 2.0],
        }
    }

    fn figure(regions: Vec<BoundingRegion>) -> Figure {
        Figure {
            id: Some("1.1".into()),
            bounding_regions: regions,
        }
    }

    fn substituter(
        extractor: StubExtractor,
        summarizer: StubSummarizer,
        policy: FigureRegionPolicy,
    ) -> FigureSubstituter {
        FigureSubstituter::new(Arc::new(extractor), Arc::new(summarizer), policy)
    }

    #[tokio::test]
    async fn first_region_only_by_default() {
        let extractor = StubExtractor::default();
        let calls = extractor.calls();
        let sub = substituter(extractor, StubSummarizer::fixed("X"), FigureRegionPolicy::First);

        let out = sub
            .render(&figure(vec![region(1), region(2)]), Path::new("a.pdf"), Path::new("/tmp"))
            .await
            .unwrap();

        assert_eq!(out.unwrap(), figure_caption("X"));
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, 1);
        assert_eq!(calls[0].1.as_array(), [72.0, 72.0, 216.0, 144.0]);
    }

    #[tokio::test]
    async fn all_regions_one_caption_each() {
        let sub = substituter(
            StubExtractor::default(),
            StubSummarizer::fixed("X"),
            FigureRegionPolicy::All,
        );
        let out = sub
            .render(&figure(vec![region(1), region(2)]), Path::new("a.pdf"), Path::new("/tmp"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(out, format!("{}\n{}", figure_caption("X"), figure_caption("X")));
    }

    #[tokio::test]
    async fn no_regions_is_omitted() {
        let sub = substituter(
            StubExtractor::default(),
            StubSummarizer::fixed("X"),
            FigureRegionPolicy::First,
        );
        let out = sub
            .render(&figure(vec![]), Path::new("a.pdf"), Path::new("/tmp"))
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn failed_crop_is_omitted() {
        let sub = substituter(
            StubExtractor::failing(),
            StubSummarizer::fixed("X"),
            FigureRegionPolicy::First,
        );
        let out = sub
            .render(&figure(vec![region(1)]), Path::new("a.pdf"), Path::new("/tmp"))
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn short_polygon_is_omitted() {
        let sub = substituter(
            StubExtractor::default(),
            StubSummarizer::fixed("X"),
            FigureRegionPolicy::First,
        );
        let bad = BoundingRegion {
            page_number: 1,
            polygon: vec![1.0, 2.0],
        };
        let out = sub
            .render(&figure(vec![bad]), Path::new("a.pdf"), Path::new("/tmp"))
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn summarizer_error_propagates() {
        let sub = substituter(
            StubExtractor::default(),
            StubSummarizer::failing(),
            FigureRegionPolicy::First,
        );
        let err = sub
            .render(&figure(vec![region(1)]), Path::new("a.pdf"), Path::new("/tmp"))
            .await
            .unwrap_err();
        assert!(matches!(err, Doc2MdError::SummarizationFailed { .. }));
    }
}
