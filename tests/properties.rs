//! Property tests for the pure renderers.

use docintel2md::config::FigureRegionPolicy;
use docintel2md::model::{
    AnalyzeResult, CellKind, Figure, Paragraph, ParagraphRole, Section, Table, TableCell,
};
use docintel2md::pipeline::assemble::assemble;
use docintel2md::pipeline::figure::FigureSubstituter;
use docintel2md::pipeline::linearize::linearize;
use docintel2md::pipeline::paragraph::render_paragraph;
use docintel2md::pipeline::table::render_table;
use docintel2md::testing::{StubExtractor, StubSummarizer};
use proptest::prelude::*;
use std::path::Path;
use std::sync::Arc;

fn cell_kind() -> impl Strategy<Value = CellKind> {
    prop_oneof![
        Just(CellKind::Content),
        Just(CellKind::ColumnHeader),
        Just(CellKind::RowHeader),
        Just(CellKind::StubHead),
        Just(CellKind::Description),
    ]
}

/// Row-major cells: non-decreasing row indices, at least one cell.
fn table() -> impl Strategy<Value = Table> {
    prop::collection::vec(
        (
            0u32..3,
            cell_kind(),
            prop::option::of(1u32..4),
            prop::option::of(1u32..4),
            "[a-z0-9 ]{0,8}",
        ),
        1..30,
    )
    .prop_map(|raw| {
        let mut row = 0u32;
        let mut col = 0u32;
        let cells = raw
            .into_iter()
            .map(|(step, kind, column_span, row_span, content)| {
                if step > 0 {
                    row += step;
                    col = 0;
                } else {
                    col += 1;
                }
                TableCell {
                    kind,
                    row_index: row,
                    column_index: col,
                    row_span,
                    column_span,
                    content,
                }
            })
            .collect();
        Table {
            cells,
            ..Default::default()
        }
    })
}

fn role() -> impl Strategy<Value = ParagraphRole> {
    prop_oneof![
        Just(ParagraphRole::Title),
        Just(ParagraphRole::SectionHeading),
        Just(ParagraphRole::Body),
        "[a-zA-Z]{1,12}".prop_map(|s| ParagraphRole::from(s.as_str())),
    ]
}

proptest! {
    #[test]
    fn row_groups_match_distinct_row_indices(table in table()) {
        let html = render_table(&table);
        let mut rows: Vec<u32> = table.cells.iter().map(|c| c.row_index).collect();
        rows.dedup();
        prop_assert_eq!(html.matches("<tr>").count(), rows.len());
        prop_assert_eq!(html.matches("</tr>").count(), rows.len());
        prop_assert!(html.starts_with("<table>\n<tr>\n"));
        prop_assert!(html.ends_with("</tr>\n</table>"));
    }

    #[test]
    fn header_kinds_render_as_th(table in table()) {
        let html = render_table(&table);
        let headers = table.cells.iter().filter(|c| c.kind.is_header()).count();
        prop_assert_eq!(html.matches("<th").count(), headers);
        prop_assert_eq!(html.matches("<td").count(), table.cells.len() - headers);
    }

    #[test]
    fn first_title_has_no_leading_blank_line(content in "[^\n]{0,40}") {
        let first = render_paragraph(&ParagraphRole::Title, &content, true);
        let later = render_paragraph(&ParagraphRole::Title, &content, false);
        prop_assert!(first.starts_with("# "));
        prop_assert_eq!(later, format!("\n\n{first}"));
    }

    #[test]
    fn paragraph_content_is_verbatim(role in role(), content in ".{0,40}", first in any::<bool>()) {
        let rendered = render_paragraph(&role, &content, first);
        prop_assert!(rendered.ends_with(content.as_str()));
    }

    #[test]
    fn assemble_is_deterministic(fragments in prop::collection::vec("[a-z\n<>]{0,12}", 0..12)) {
        prop_assert_eq!(assemble(&fragments), assemble(&fragments));
    }

    #[test]
    fn assemble_is_concatenation_without_tables(fragments in prop::collection::vec("[a-z \n]{0,12}", 0..12)) {
        prop_assert_eq!(assemble(&fragments), fragments.concat());
    }

    #[test]
    fn region_less_figures_contribute_nothing(
        contents in prop::collection::vec("[a-z]{1,8}", 1..6),
        figure_at in 0usize..6,
    ) {
        let paragraphs: Vec<Paragraph> = contents
            .iter()
            .map(|c| Paragraph { content: c.clone(), ..Default::default() })
            .collect();
        let mut elements: Vec<String> =
            (0..paragraphs.len()).map(|i| format!("/paragraphs/{i}")).collect();
        let plain = AnalyzeResult {
            paragraphs: paragraphs.clone(),
            sections: vec![Section { elements: elements.clone() }],
            ..Default::default()
        };
        elements.insert(figure_at.min(elements.len()), "/figures/0".to_string());
        let with_figure = AnalyzeResult {
            paragraphs,
            figures: vec![Figure::default()],
            sections: vec![Section { elements }],
            ..Default::default()
        };

        let figures = FigureSubstituter::new(
            Arc::new(StubExtractor::default()),
            Arc::new(StubSummarizer::fixed("S")),
            FigureRegionPolicy::First,
        );
        let run = |result: &AnalyzeResult| {
            tokio_test::block_on(linearize(result, &figures, Path::new("a.pdf"), Path::new("/tmp")))
                .map(|l| assemble(&l.fragments))
        };

        prop_assert_eq!(run(&with_figure).unwrap(), run(&plain).unwrap());
    }
}
