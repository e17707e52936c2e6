//! Paragraph rendering: semantic role → Markdown heading or body line.

use crate::model::ParagraphRole;

/// Render one paragraph.
///
/// Leading newlines carry the vertical spacing: titles and section headings
/// get two blank-line breaks, body text a single break. A title that opens
/// the document gets none so the file starts with `# `.
///
/// Content is emitted verbatim.
pub fn render_paragraph(role: &ParagraphRole, content: &str, is_first: bool) -> String {
    match role {
        ParagraphRole::Title if is_first => format!("# {content}"),
        ParagraphRole::Title => format!("\n\n# {content}"),
        ParagraphRole::SectionHeading => format!("\n\n## {content}"),
        ParagraphRole::Body | ParagraphRole::Other(_) => format!("\n{content}"),
    }
}
