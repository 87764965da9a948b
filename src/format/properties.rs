//! Java-style `.properties` language files.

use super::TranslationDocument;

/// Parse a `.properties` file.
///
/// Supported subset: `#`/`!` comments, blank lines, `=`/`:` separators with
/// backslash escapes, trailing-backslash line continuations, and
/// last-one-wins duplicate keys. Parsing is total: any line without a
/// separator becomes a key with an empty value, matching the reference
/// behavior of `java.util.Properties`.
pub(super) fn parse(raw: &str) -> TranslationDocument {
    let mut result = TranslationDocument::new();

    let mut lines = raw.lines();
    while let Some(line) = lines.next() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        // Fold continuation lines into one logical line.
        let mut logical = trimmed.to_string();
        while ends_with_odd_backslashes(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = split_pair(&logical);
        result.insert(key, value);
    }

    result
}

/// A trailing continuation backslash is one that is not itself escaped.
fn ends_with_odd_backslashes(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Split one logical line at the first unescaped `=` or `:`.
fn split_pair(line: &str) -> (String, String) {
    let mut key = String::new();
    let mut chars = line.char_indices();

    while let Some((index, c)) = chars.next() {
        match c {
            '\\' => {
                if let Some((_, escaped)) = chars.next() {
                    key.push(escaped);
                }
            }
            '=' | ':' => {
                let value = line.get(index + c.len_utf8()..).unwrap_or_default();
                return (key.trim_end().to_string(), value.trim_start().to_string());
            }
            _ => key.push(c),
        }
    }

    (key.trim_end().to_string(), String::new())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    #[rstest]
    fn parse_basic_pairs() {
        let raw = "greeting=Hello\nfarewell: Goodbye\n";

        let doc = parse(raw);

        assert_that!(doc.get("greeting"), some(eq("Hello")));
        assert_that!(doc.get("farewell"), some(eq("Goodbye")));
    }

    #[rstest]
    fn parse_skips_comments_and_blank_lines() {
        let raw = "# a comment\n! another\n\nkey=value\n";

        let doc = parse(raw);

        assert_that!(doc.len(), eq(1));
        assert_that!(doc.get("key"), some(eq("value")));
    }

    #[rstest]
    fn parse_unescapes_separators_in_keys() {
        let raw = "a\\=b=value\nc\\:d=other\n";

        let doc = parse(raw);

        assert_that!(doc.get("a=b"), some(eq("value")));
        assert_that!(doc.get("c:d"), some(eq("other")));
    }

    #[rstest]
    fn parse_folds_continuation_lines() {
        let raw = "message=Hello \\\n    World\n";

        let doc = parse(raw);

        assert_that!(doc.get("message"), some(eq("Hello World")));
    }

    #[rstest]
    fn parse_last_duplicate_wins() {
        let raw = "key=first\nkey=second\n";

        let doc = parse(raw);

        assert_that!(doc.get("key"), some(eq("second")));
    }

    #[rstest]
    fn parse_line_without_separator_yields_empty_value() {
        let raw = "standalone\n";

        let doc = parse(raw);

        assert_that!(doc.get("standalone"), some(eq("")));
    }
}
