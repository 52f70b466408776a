//! Message text formatter.
//!
//! Splits raw message text into an ordered sequence of displayable segments:
//! plain-text runs (already line-split for the renderer) and fenced code
//! blocks. The fence delimiters themselves are discarded. This is a pure
//! structural pass; it performs no escaping and is not a trust boundary.

/// A displayable piece of a message, in original order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A run of ordinary text, split on line breaks.
    Text { lines: Vec<String> },
    /// A fenced code block with its optional language tag.
    Code {
        language: Option<String>,
        code: String,
    },
}

/// Check whether a line opens a code fence, returning its language tag.
///
/// A fence opener is a line whose content is three backticks followed by an
/// optional single-word language tag. Lines with anything else after the
/// backticks are ordinary text.
fn fence_language(line: &str) -> Option<Option<String>> {
    let rest = line.trim().strip_prefix("```")?;
    let tag = rest.trim();
    if tag.is_empty() {
        Some(None)
    } else if tag.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '+' || c == '#' || c == '-') {
        Some(Some(tag.to_string()))
    } else {
        None
    }
}

/// Whether a line closes an open code fence.
fn is_fence_close(line: &str) -> bool {
    line.trim() == "```"
}

/// Split message text into plain-text runs and fenced code blocks.
///
/// An unterminated fence is treated as plain text to the end of the input.
/// Empty input yields a single empty text run.
pub fn format_message(text: &str) -> Vec<Segment> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut segments = Vec::new();
    let mut plain: Vec<String> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if let Some(language) = fence_language(line) {
            // Only a matched fence becomes a code block.
            if let Some(close) = (i + 1..lines.len()).find(|&j| is_fence_close(lines[j])) {
                if !plain.is_empty() {
                    segments.push(Segment::Text {
                        lines: std::mem::take(&mut plain),
                    });
                }
                let code = lines[i + 1..close].join("\n");
                segments.push(Segment::Code {
                    language,
                    code: code.trim().to_string(),
                });
                i = close + 1;
                continue;
            }
        }
        plain.push(line.to_string());
        i += 1;
    }

    if !plain.is_empty() || segments.is_empty() {
        segments.push(Segment::Text { lines: plain });
    }

    normalize(segments)
}

/// Remove the empty boundary lines that fence delimiters leave on
/// neighboring text runs, and drop runs emptied by that trimming.
fn normalize(segments: Vec<Segment>) -> Vec<Segment> {
    let count = segments.len();
    let mut out = Vec::with_capacity(count);
    for (idx, segment) in segments.into_iter().enumerate() {
        match segment {
            Segment::Text { mut lines } => {
                // A newline immediately before a fence produces a trailing
                // empty line; one immediately after produces a leading one.
                if idx + 1 < count && lines.last().is_some_and(|l| l.is_empty()) {
                    lines.pop();
                }
                if idx > 0 && lines.first().is_some_and(|l| l.is_empty()) {
                    lines.remove(0);
                }
                if lines.is_empty() && count > 1 {
                    continue;
                }
                out.push(Segment::Text { lines });
            }
            code => out.push(code),
        }
    }
    if out.is_empty() {
        out.push(Segment::Text {
            lines: vec![String::new()],
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(lines: &[&str]) -> Segment {
        Segment::Text {
            lines: lines.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn code(language: Option<&str>, body: &str) -> Segment {
        Segment::Code {
            language: language.map(|s| s.to_string()),
            code: body.to_string(),
        }
    }

    #[test]
    fn test_plain_text_is_one_segment() {
        let segments = format_message("hello\nworld");
        assert_eq!(segments, vec![text(&["hello", "world"])]);
    }

    #[test]
    fn test_empty_input_yields_single_empty_run() {
        let segments = format_message("");
        assert_eq!(segments, vec![text(&[""])]);
    }

    #[test]
    fn test_single_fenced_block_with_surrounding_text() {
        let segments = format_message("a\n```js\nfoo()\n```\nb");
        assert_eq!(
            segments,
            vec![text(&["a"]), code(Some("js"), "foo()"), text(&["b"])]
        );
    }

    #[test]
    fn test_fence_without_language_tag() {
        let segments = format_message("```\nlet x = 1;\n```");
        assert_eq!(segments, vec![code(None, "let x = 1;")]);
    }

    #[test]
    fn test_unterminated_fence_is_plain_text() {
        let segments = format_message("a\n```js\nfoo()");
        assert_eq!(segments, vec![text(&["a", "```js", "foo()"])]);
    }

    #[test]
    fn test_multiple_blocks_preserve_order() {
        let segments = format_message("one\n```py\nx = 1\n```\ntwo\n```\ny\n```");
        assert_eq!(
            segments,
            vec![
                text(&["one"]),
                code(Some("py"), "x = 1"),
                text(&["two"]),
                code(None, "y"),
            ]
        );
    }

    #[test]
    fn test_multiline_code_keeps_inner_lines() {
        let segments = format_message("```rust\nfn main() {\n    println!(\"hi\");\n}\n```");
        assert_eq!(
            segments,
            vec![code(Some("rust"), "fn main() {\n    println!(\"hi\");\n}")]
        );
    }

    #[test]
    fn test_backticks_with_trailing_words_are_text() {
        let segments = format_message("``` not a fence opener\nplain");
        assert_eq!(segments, vec![text(&["``` not a fence opener", "plain"])]);
    }

    #[test]
    fn test_blank_lines_inside_plain_run_survive() {
        let segments = format_message("a\n\nb");
        assert_eq!(segments, vec![text(&["a", "", "b"])]);
    }

    #[test]
    fn test_message_ending_in_code_block() {
        let segments = format_message("look:\n```sh\nls -la\n```");
        assert_eq!(segments, vec![text(&["look:"]), code(Some("sh"), "ls -la")]);
    }
}
