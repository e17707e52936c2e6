//! Fixed prompts for figure summarisation and the caption wrapped around
//! each summary.
//!
//! The caption text is part of the output format consumed downstream and
//! must stay byte-identical; the prompts can be overridden through
//! [`crate::config::ConversionConfig::system_prompt`].

/// System message sent with every figure.
pub const DEFAULT_SYSTEM_PROMPT: &str = "あなたは有能なアシスタントです。ユーザーの問いに回答してください";

/// User question sent alongside the cropped figure ("summarise what this
/// image is about").
pub const SUMMARY_QUESTION: &str = "何についての画像なのか、内容を要約して回答してください。";

/// Note that replaces a figure in the Markdown: the original content was an
/// image, and its summary follows.
pub const FIGURE_CAPTION_NOTE: &str =
    "[この部分にはもともと画像情報が添付されていました。画像情報の要約は以下になります。]";

/// Wrap a figure summary in the caption block.
pub fn figure_caption(summary: &str) -> String {
    format!("{FIGURE_CAPTION_NOTE}\n({summary})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_is_verbatim() {
        assert_eq!(
            figure_caption("X"),
            "[この部分にはもともと画像情報が添付されていました。画像情報の要約は以下になります。]\n(X)"
        );
    }
}
