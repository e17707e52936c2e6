//! Table rendering: analysis cells → HTML `<table>`.
//!
//! HTML rather than GFM pipe tables because merged cells (`colspan` /
//! `rowspan`) have no pipe-table equivalent. Cells arrive in row-major
//! order; a change of `row_index` between consecutive cells closes the
//! current `<tr>` and opens the next.

use crate::model::{Table, TableCell};
use std::fmt::Write;

/// Render a table as HTML.
///
/// A table without cells still yields a single empty row:
/// `<table>\n<tr>\n</tr>\n</table>`.
pub fn render_table(table: &Table) -> String {
    let mut html = String::from("<table>\n<tr>\n");
    let mut prev_row: Option<u32> = None;

    for cell in &table.cells {
        if prev_row.is_some_and(|r| r != cell.row_index) {
            html.push_str("</tr>\n<tr>\n");
        }
        push_cell(&mut html, cell);
        prev_row = Some(cell.row_index);
    }

    html.push_str("</tr>\n</table>");
    html
}

fn push_cell(html: &mut String, cell: &TableCell) {
    let tag = if cell.kind.is_header() { "th" } else { "td" };

    html.push('<');
    html.push_str(tag);
    if let Some(span) = cell.column_span {
        let _ = write!(html, " colspan=\"{span}\"");
    }
    if let Some(span) = cell.row_span {
        let _ = write!(html, " rowspan=\"{span}\"");
    }
    let _ = writeln!(html, ">{}</{tag}>", cell.content);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellKind;

    fn cell(row: u32, col: u32, kind: CellKind, content: &str) -> TableCell {
        TableCell {
            kind,
            row_index: row,
            column_index: col,
            row_span: None,
            column_span: None,
            content: content.to_string(),
        }
    }

    #[test]
    fn empty_table() {
        assert_eq!(
            render_table(&Table::default()),
            "<table>\n<tr>\n</tr>\n</table>"
        );
    }

    #[test]
    fn header_and_data_rows() {
        let table = Table {
            cells: vec![
                cell(0, 0, CellKind::ColumnHeader, "HEADER1"),
                cell(0, 1, CellKind::ColumnHeader, "HEADER2"),
                cell(1, 0, CellKind::Content, "DATA1"),
                cell(1, 1, CellKind::Content, "DATA2"),
            ],
            ..Default::default()
        };
        assert_eq!(
            render_table(&table),
            "<table>\n<tr>\n<th>HEADER1</th>\n<th>HEADER2</th>\n</tr>\n\
             <tr>\n<td>DATA1</td>\n<td>DATA2</td>\n</tr>\n</table>"
        );
    }

    #[test]
    fn row_header_is_th_other_kinds_td() {
        let table = Table {
            cells: vec![
                cell(0, 0, CellKind::RowHeader, "r"),
                cell(0, 1, CellKind::StubHead, "s"),
                cell(0, 2, CellKind::Description, "d"),
            ],
            ..Default::default()
        };
        let html = render_table(&table);
        assert!(html.contains("<th>r</th>"));
        assert!(html.contains("<td>s</td>"));
        assert!(html.contains("<td>d</td>"));
    }

    #[test]
    fn span_attributes() {
        let mut both = cell(0, 0, CellKind::ColumnHeader, "both");
        both.column_span = Some(2);
        both.row_span = Some(3);
        let mut col = cell(0, 2, CellKind::Content, "col");
        col.column_span = Some(2);
        let mut row = cell(0, 4, CellKind::Content, "row");
        row.row_span = Some(2);

        let html = render_table(&Table {
            cells: vec![both, col, row],
            ..Default::default()
        });
        assert!(html.contains("<th colspan=\"2\" rowspan=\"3\">both</th>\n"));
        assert!(html.contains("<td colspan=\"2\">col</td>\n"));
        assert!(html.contains("<td rowspan=\"2\">row</td>\n"));
    }

    #[test]
    fn explicit_span_of_one_is_kept() {
        let mut c = cell(0, 0, CellKind::Content, "x");
        c.column_span = Some(1);
        let html = render_table(&Table {
            cells: vec![c],
            ..Default::default()
        });
        assert!(html.contains("<td colspan=\"1\">x</td>"));
    }

    #[test]
    fn empty_content_cells() {
        let table = Table {
            cells: vec![
                cell(0, 0, CellKind::Content, "Foo"),
                cell(0, 1, CellKind::Content, ""),
            ],
            ..Default::default()
        };
        assert_eq!(
            render_table(&table),
            "<table>\n<tr>\n<td>Foo</td>\n<td></td>\n</tr>\n</table>"
        );
    }
}
