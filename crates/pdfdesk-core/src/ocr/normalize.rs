//! Cleanup of raw engine output into stable, plain text.

/// Normalize recognized text: fold typographic variants to ASCII, strip
/// zero-width and control characters, and collapse whitespace.
///
/// Idempotent: `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\u{2026}', "...");

    let mut out = String::with_capacity(text.len());
    // Pending separators are buffered so runs collapse and trailing
    // whitespace never reaches the output.
    let mut pending_space = false;
    let mut newline_run = 0usize;

    for c in text.chars() {
        let c = fold_char(c);
        match c {
            Some('\n') => {
                pending_space = false;
                newline_run += 1;
            }
            Some(ch) if ch.is_whitespace() => {
                if newline_run == 0 {
                    pending_space = true;
                }
            }
            Some(ch) => {
                if newline_run > 0 {
                    if !out.is_empty() {
                        // At most one blank line between blocks.
                        out.push_str(if newline_run >= 2 { "\n\n" } else { "\n" });
                    }
                    newline_run = 0;
                } else if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                out.push(ch);
            }
            None => {}
        }
    }

    out
}

/// Map one character to its normalized form, or `None` to drop it.
fn fold_char(c: char) -> Option<char> {
    let folded = match c {
        // Quotes
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2039}' | '\u{203A}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{00AB}' | '\u{00BB}' => '"',
        // Dashes and the minus sign
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
        | '\u{2212}' => '-',
        // Spaces
        '\u{00A0}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}' => ' ',
        // Bullets
        '\u{2022}' | '\u{2023}' | '\u{25E6}' | '\u{2043}' => '*',
        '\u{00D7}' => 'x',
        '\u{00F7}' => '/',
        // Zero-width characters
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' | '\u{2060}' => return None,
        '\n' | '\t' => c,
        c if c.is_control() => return None,
        c => c,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn folds_typographic_characters() {
        assert_eq!(normalize("\u{201C}hi\u{201D} \u{2014} it\u{2019}s"), "\"hi\" - it's");
        assert_eq!(normalize("3\u{00D7}4\u{00F7}2"), "3x4/2");
        assert_eq!(normalize("\u{2022} item"), "* item");
        assert_eq!(normalize("wait\u{2026}"), "wait...");
        assert_eq!(normalize("\u{2212}40\u{00B0}"), "-40\u{00B0}");
        assert_eq!(normalize("\u{201F}quoted\u{201F}"), "\"quoted\"");
    }

    #[test]
    fn strips_zero_width_and_control_characters() {
        assert_eq!(normalize("a\u{200B}b\u{FEFF}c"), "abc");
        assert_eq!(normalize("a\u{0007}b"), "ab");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("a  \t b"), "a b");
        assert_eq!(normalize("a\r\nb"), "a\nb");
        assert_eq!(normalize("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(normalize("  padded  "), "padded");
        assert_eq!(normalize("line \nnext"), "line\nnext");
    }

    #[test]
    fn is_idempotent() {
        let samples = [
            "\u{201C}quoted\u{201D}\n\n\n text \u{2013} with\u{00A0}junk\u{200B}",
            "plain already-clean text\n\nsecond block",
            "",
            "   \n\n   ",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "input: {s:?}");
        }
    }

    #[test]
    fn empty_and_whitespace_only_input_yields_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n \t \n "), "");
    }
}
