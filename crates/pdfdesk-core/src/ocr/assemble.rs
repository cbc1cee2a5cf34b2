//! Plain-text output assembly.

/// Join per-page text into a single document.
///
/// With separators enabled each page is preceded by a `--- Page N ---`
/// marker (one marker per page, including empty pages); without them pages
/// are joined by a blank line and empty pages are dropped.
pub fn assemble_plain_text(pages: &[(usize, String)], include_separators: bool) -> String {
    if include_separators {
        pages
            .iter()
            .map(|(number, text)| format!("--- Page {} ---\n{}\n", number, text))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        pages
            .iter()
            .filter(|(_, text)| !text.is_empty())
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn separators_emit_one_marker_per_page() {
        let pages = vec![(1, "first".to_string()), (2, "second".to_string())];
        let text = assemble_plain_text(&pages, true);
        assert_eq!(text.matches("--- Page 1 ---").count(), 1);
        assert_eq!(text.matches("--- Page 2 ---").count(), 1);
        assert_eq!(text.matches("--- Page").count(), 2);
        assert!(text.contains("first"));
        assert!(text.contains("second"));
    }

    #[test]
    fn without_separators_pages_join_with_blank_line() {
        let pages = vec![
            (1, "first".to_string()),
            (2, String::new()),
            (3, "third".to_string()),
        ];
        assert_eq!(assemble_plain_text(&pages, false), "first\n\nthird");
    }

    #[test]
    fn separators_keep_empty_pages_visible() {
        let pages = vec![(1, String::new())];
        let text = assemble_plain_text(&pages, true);
        assert!(text.starts_with("--- Page 1 ---"));
    }
}
