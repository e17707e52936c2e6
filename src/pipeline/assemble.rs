//! Markdown assembly: join rendered fragments into the final document.
//!
//! Fragments keep their own whitespace. The only normalisation is one
//! substitution: three newlines directly before a `<table` opening tag
//! become two. Every fragment ends in one newline and a table fragment
//! opens with one, so the gap only appears when the paragraph before a
//! table itself ends in a newline.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_TABLE_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3}(<table[\s>])").unwrap());

/// Concatenate `fragments` and collapse the blank line before tables.
pub fn assemble<S: AsRef<str>>(fragments: &[S]) -> String {
    let joined: String = fragments.iter().map(AsRef::as_ref).collect();
    RE_TABLE_GAP.replace_all(&joined, "\n\n$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_verbatim() {
        assert_eq!(assemble(&["# T\n", "\nbody  \n"]), "# T\n\nbody  \n");
    }

    #[test]
    fn empty_input() {
        assert_eq!(assemble::<&str>(&[]), "");
    }

    #[test]
    fn collapses_three_newlines_before_table() {
        assert_eq!(
            assemble(&["\nx\n\n", "\n<table>\n</table>\n"]),
            "\nx\n\n<table>\n</table>\n"
        );
    }

    #[test]
    fn two_newlines_before_table_untouched() {
        assert_eq!(assemble(&["\nx\n", "\n<table>"]), "\nx\n\n<table>");
    }

    #[test]
    fn other_tags_untouched() {
        assert_eq!(assemble(&["a\n\n\n<tbody>"]), "a\n\n\n<tbody>");
        assert_eq!(assemble(&["a\n\n\n<tablex>"]), "a\n\n\n<tablex>");
    }

    #[test]
    fn blank_lines_elsewhere_untouched() {
        assert_eq!(assemble(&["a\n\n\n\nb"]), "a\n\n\n\nb");
    }
}
