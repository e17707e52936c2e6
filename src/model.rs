//! Data model of a layout analysis result.
//!
//! These types mirror the JSON the document-analysis service returns under
//! `analyzeResult`. Field names follow the wire format (camelCase) so a saved
//! response can be deserialised directly with `serde_json`. Everything the
//! renderer does not need (spans, words, styles, ...) is ignored on input.
//!
//! All entities are read-only views: built once per conversion, never
//! mutated, dropped once the Markdown has been produced.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Root of a layout analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    /// Flat text of the whole document. Carried for diagnostics only.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub figures: Vec<Figure>,
    /// Reading-order tree. The concatenation of every section's `elements`
    /// is the only authoritative document order.
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl AnalyzeResult {
    /// Parse a raw `analyzeResult` JSON object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// All section element references, concatenated in section order.
    pub fn section_elements(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .flat_map(|s| s.elements.iter().map(String::as_str))
    }
}

/// A page number plus the polygon that outlines an element on that page.
///
/// `polygon` is a 4-point polygon flattened to 8 scalars, clockwise from the
/// top-left corner, in inches for PDF input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingRegion {
    pub page_number: u32,
    #[serde(default)]
    pub polygon: Vec<f64>,
}

/// Semantic role of a paragraph.
///
/// Only titles and section headings change the Markdown output; every other
/// role renders as body text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ParagraphRole {
    Title,
    SectionHeading,
    #[default]
    Body,
    /// Any other role the service reports (`pageHeader`, `footnote`, ...).
    Other(String),
}

impl ParagraphRole {
    pub fn as_str(&self) -> &str {
        match self {
            ParagraphRole::Title => "title",
            ParagraphRole::SectionHeading => "sectionHeading",
            ParagraphRole::Body => "",
            ParagraphRole::Other(s) => s,
        }
    }
}

impl From<&str> for ParagraphRole {
    fn from(s: &str) -> Self {
        match s {
            "title" => ParagraphRole::Title,
            "sectionHeading" => ParagraphRole::SectionHeading,
            "" => ParagraphRole::Body,
            other => ParagraphRole::Other(other.to_string()),
        }
    }
}

impl Serialize for ParagraphRole {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ParagraphRole {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?;
        Ok(s.as_deref().map(ParagraphRole::from).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "is_body")]
    pub role: ParagraphRole,
    #[serde(default)]
    pub bounding_regions: Vec<BoundingRegion>,
}

fn is_body(role: &ParagraphRole) -> bool {
    *role == ParagraphRole::Body
}

/// Kind of a table cell. Absent kind means ordinary data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CellKind {
    ColumnHeader,
    RowHeader,
    StubHead,
    Description,
    #[default]
    Content,
}

impl CellKind {
    /// Header cells render as `<th>`, everything else as `<td>`.
    pub fn is_header(self) -> bool {
        matches!(self, CellKind::ColumnHeader | CellKind::RowHeader)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    #[serde(default)]
    pub kind: CellKind,
    pub row_index: u32,
    pub column_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_span: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_span: Option<u32>,
    #[serde(default)]
    pub content: String,
}

/// A table. Cells are assumed to arrive in row-major order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default)]
    pub row_count: u32,
    #[serde(default)]
    pub column_count: u32,
    #[serde(default)]
    pub cells: Vec<TableCell>,
    #[serde(default)]
    pub bounding_regions: Vec<BoundingRegion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Figure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub bounding_regions: Vec<BoundingRegion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub elements: Vec<String>,
}

// ── Element references ───────────────────────────────────────────────────

pub const PARAGRAPH_PREFIX: &str = "/paragraphs/";
pub const TABLE_PREFIX: &str = "/tables/";
pub const FIGURE_PREFIX: &str = "/figures/";

/// A typed section element reference such as `/tables/2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRef {
    Paragraph(usize),
    Table(usize),
    Figure(usize),
    /// Nested sections, key-value pairs, malformed paths, anything else.
    Other,
}

impl ElementRef {
    pub fn parse(reference: &str) -> Self {
        let typed = |rest: &str, make: fn(usize) -> ElementRef| {
            rest.parse::<usize>().map(make).unwrap_or(ElementRef::Other)
        };

        if let Some(rest) = reference.strip_prefix(PARAGRAPH_PREFIX) {
            typed(rest, ElementRef::Paragraph)
        } else if let Some(rest) = reference.strip_prefix(TABLE_PREFIX) {
            typed(rest, ElementRef::Table)
        } else if let Some(rest) = reference.strip_prefix(FIGURE_PREFIX) {
            typed(rest, ElementRef::Figure)
        } else {
            ElementRef::Other
        }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementRef::Paragraph(i) => write!(f, "{PARAGRAPH_PREFIX}{i}"),
            ElementRef::Table(i) => write!(f, "{TABLE_PREFIX}{i}"),
            ElementRef::Figure(i) => write!(f, "{FIGURE_PREFIX}{i}"),
            ElementRef::Other => f.write_str("<other>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_element_refs() {
        assert_eq!(ElementRef::parse("/paragraphs/0"), ElementRef::Paragraph(0));
        assert_eq!(ElementRef::parse("/tables/12"), ElementRef::Table(12));
        assert_eq!(ElementRef::parse("/figures/3"), ElementRef::Figure(3));
        assert_eq!(ElementRef::parse("/sections/1"), ElementRef::Other);
        assert_eq!(ElementRef::parse("/keyValuePairs/0"), ElementRef::Other);
        assert_eq!(ElementRef::parse("/paragraphs/x"), ElementRef::Other);
        assert_eq!(ElementRef::parse(""), ElementRef::Other);
    }

    #[test]
    fn element_ref_display_round_trips() {
        for r in ["/paragraphs/4", "/tables/0", "/figures/9"] {
            assert_eq!(ElementRef::parse(r).to_string(), r);
        }
    }

    #[test]
    fn deserialize_wire_format() {
        let json = r#"{
            "apiVersion": "2024-11-30",
            "modelId": "prebuilt-layout",
            "content": "ignored",
            "paragraphs": [
                {"content": "Title", "role": "title",
                 "boundingRegions": [{"pageNumber": 1, "polygon": [1,1,5,1,5,2,1,2]}]},
                {"content": "Body"},
                {"content": "Footer", "role": "pageFooter"}
            ],
            "tables": [{
                "rowCount": 1, "columnCount": 2,
                "cells": [
                    {"kind": "columnHeader", "rowIndex": 0, "columnIndex": 0, "columnSpan": 2, "content": "H"}
                ]
            }],
            "figures": [{"id": "1.1"}, {"boundingRegions": [{"pageNumber": 2, "polygon": [0,0,1,0,1,1,0,1]}]}],
            "sections": [{"elements": ["/paragraphs/0", "/sections/1"]}, {"elements": ["/tables/0"]}]
        }"#;
        let result = AnalyzeResult::from_json(json).expect("valid json");

        assert_eq!(result.paragraphs[0].role, ParagraphRole::Title);
        assert_eq!(result.paragraphs[1].role, ParagraphRole::Body);
        assert_eq!(
            result.paragraphs[2].role,
            ParagraphRole::Other("pageFooter".into())
        );
        assert!(result.paragraphs[1].bounding_regions.is_empty());

        let cell = &result.tables[0].cells[0];
        assert_eq!(cell.kind, CellKind::ColumnHeader);
        assert_eq!(cell.column_span, Some(2));
        assert_eq!(cell.row_span, None);

        assert!(result.figures[0].bounding_regions.is_empty());
        assert_eq!(result.figures[1].bounding_regions[0].page_number, 2);

        let order: Vec<&str> = result.section_elements().collect();
        assert_eq!(order, vec!["/paragraphs/0", "/sections/1", "/tables/0"]);
    }

    #[test]
    fn null_role_is_body() {
        let p: Paragraph = serde_json::from_str(r#"{"content": "x", "role": null}"#).unwrap();
        assert_eq!(p.role, ParagraphRole::Body);
    }

    #[test]
    fn missing_cell_kind_is_data() {
        let c: TableCell =
            serde_json::from_str(r#"{"rowIndex": 1, "columnIndex": 0, "content": "a"}"#).unwrap();
        assert_eq!(c.kind, CellKind::Content);
        assert!(!c.kind.is_header());
        assert!(CellKind::RowHeader.is_header());
    }
}
