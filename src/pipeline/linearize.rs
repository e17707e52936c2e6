//! Section linearizer: walk the reading order and render each element.
//!
//! The only authoritative document order is the concatenation of every
//! section's `elements` list. Each reference is dispatched by prefix to the
//! paragraph renderer, the precomputed table HTML, or figure substitution.
//! Every rendered fragment is followed by one `\n`; an omitted figure
//! contributes nothing at all.

use crate::error::Doc2MdError;
use crate::model::{AnalyzeResult, ElementRef};
use crate::output::ElementStats;
use crate::pipeline::figure::FigureSubstituter;
use crate::pipeline::paragraph::render_paragraph;
use crate::pipeline::table::render_table;
use std::path::Path;
use tracing::{trace, warn};

/// Rendered fragments in reading order, plus what was rendered.
#[derive(Debug, Clone, Default)]
pub struct Linearized {
    pub fragments: Vec<String>,
    pub stats: ElementStats,
}

/// Render `result` in reading order.
///
/// `pdf_path` is the document figures are cropped from; crops are written
/// to `scratch_dir`.
pub async fn linearize(
    result: &AnalyzeResult,
    figures: &FigureSubstituter,
    pdf_path: &Path,
    scratch_dir: &Path,
) -> Result<Linearized, Doc2MdError> {
    // Tables are rendered once up front and emitted as their own block.
    let tables: Vec<String> = result
        .tables
        .iter()
        .map(|t| format!("\n{}", render_table(t)))
        .collect();

    let mut out = Linearized::default();

    for reference in result.section_elements() {
        let fragment = match ElementRef::parse(reference) {
            ElementRef::Paragraph(i) => match result.paragraphs.get(i) {
                Some(p) => {
                    out.stats.paragraphs += 1;
                    Some(render_paragraph(&p.role, &p.content, out.fragments.is_empty()))
                }
                None => dangling(reference, result.paragraphs.len(), &mut out.stats),
            },
            ElementRef::Table(i) => match tables.get(i) {
                Some(html) => {
                    out.stats.tables += 1;
                    Some(html.clone())
                }
                None => dangling(reference, tables.len(), &mut out.stats),
            },
            ElementRef::Figure(i) => match result.figures.get(i) {
                Some(figure) => {
                    let caption = figures.render(figure, pdf_path, scratch_dir).await?;
                    match caption {
                        Some(_) => out.stats.figures_summarized += 1,
                        None => out.stats.figures_omitted += 1,
                    }
                    caption
                }
                None => dangling(reference, result.figures.len(), &mut out.stats),
            },
            ElementRef::Other => {
                trace!("Skipping reference {reference}");
                out.stats.skipped_elements += 1;
                None
            }
        };

        if let Some(mut fragment) = fragment {
            fragment.push('\n');
            out.fragments.push(fragment);
        }
    }

    Ok(out)
}

fn dangling(reference: &str, len: usize, stats: &mut ElementStats) -> Option<String> {
    warn!("Reference {reference} points past the end of its array ({len} entries); skipped");
    stats.skipped_elements += 1;
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FigureRegionPolicy;
    use crate::model::{BoundingRegion, Figure, Paragraph, ParagraphRole, Section, Table};
    use crate::prompts::figure_caption;
    use crate::testing::{StubExtractor, StubSummarizer};
    use std::sync::Arc;

    fn para(role: ParagraphRole, content: &str) -> Paragraph {
        Paragraph {
            content: content.into(),
            role,
            bounding_regions: vec![],
        }
    }

    fn substituter(summary: &str) -> FigureSubstituter {
        FigureSubstituter::new(
            Arc::new(StubExtractor::default()),
            Arc::new(StubSummarizer::fixed(summary)),
            FigureRegionPolicy::First,
        )
    }

    async fn run(result: &AnalyzeResult) -> Linearized {
        linearize(result, &substituter("S"), Path::new("a.pdf"), Path::new("/tmp"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn order_follows_sections_not_arrays() {
        let result = AnalyzeResult {
            paragraphs: vec![
                para(ParagraphRole::Body, "second"),
                para(ParagraphRole::Title, "first"),
            ],
            sections: vec![
                Section {
                    elements: vec!["/paragraphs/1".into()],
                },
                Section {
                    elements: vec!["/paragraphs/0".into()],
                },
            ],
            ..Default::default()
        };
        let out = run(&result).await;
        assert_eq!(out.fragments, vec!["# first\n", "\nsecond\n"]);
    }

    #[tokio::test]
    async fn unknown_and_dangling_references_are_skipped() {
        let result = AnalyzeResult {
            paragraphs: vec![para(ParagraphRole::Title, "T")],
            sections: vec![Section {
                elements: vec![
                    "/sections/1".into(),
                    "/paragraphs/7".into(),
                    "/keyValuePairs/0".into(),
                    "/paragraphs/0".into(),
                ],
            }],
            ..Default::default()
        };
        let out = run(&result).await;
        // Skipped references do not count as the first fragment.
        assert_eq!(out.fragments, vec!["# T\n"]);
        assert_eq!(out.stats.skipped_elements, 3);
        assert_eq!(out.stats.paragraphs, 1);
    }

    #[tokio::test]
    async fn omitted_figure_leaves_no_separator() {
        let result = AnalyzeResult {
            paragraphs: vec![para(ParagraphRole::Body, "a"), para(ParagraphRole::Body, "b")],
            figures: vec![Figure::default()],
            sections: vec![Section {
                elements: vec![
                    "/paragraphs/0".into(),
                    "/figures/0".into(),
                    "/paragraphs/1".into(),
                ],
            }],
            ..Default::default()
        };
        let out = run(&result).await;
        assert_eq!(out.fragments.concat(), "\na\n\nb\n");
        assert_eq!(out.stats.figures_omitted, 1);
    }

    #[tokio::test]
    async fn omitted_first_figure_keeps_title_first() {
        let result = AnalyzeResult {
            paragraphs: vec![para(ParagraphRole::Title, "T")],
            figures: vec![Figure::default()],
            sections: vec![Section {
                elements: vec!["/figures/0".into(), "/paragraphs/0".into()],
            }],
            ..Default::default()
        };
        let out = run(&result).await;
        assert_eq!(out.fragments, vec!["# T\n"]);
    }

    #[tokio::test]
    async fn figure_becomes_caption() {
        let result = AnalyzeResult {
            figures: vec![Figure {
                id: None,
                bounding_regions: vec![BoundingRegion {
                    page_number: 1,
                    polygon: vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
                }],
            }],
            sections: vec![Section {
                elements: vec!["/figures/0".into()],
            }],
            ..Default::default()
        };
        let out = run(&result).await;
        assert_eq!(out.fragments, vec![format!("{}\n", figure_caption("S"))]);
        assert_eq!(out.stats.figures_summarized, 1);
    }

    #[tokio::test]
    async fn table_is_a_block() {
        let result = AnalyzeResult {
            tables: vec![Table::default()],
            sections: vec![Section {
                elements: vec!["/tables/0".into()],
            }],
            ..Default::default()
        };
        let out = run(&result).await;
        assert_eq!(out.fragments, vec!["\n<table>\n<tr>\n</tr>\n</table>\n"]);
        assert_eq!(out.stats.tables, 1);
    }
}
