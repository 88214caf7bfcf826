//! Strips list and numbering markers the model sometimes emits anyway.

/// Line prefixes removed from generated text, checked in this order.
pub const FORBIDDEN_MARKERS: [&str; 10] =
    ["1)", "2)", "3)", "4)", "1.", "2.", "3.", "4.", "•", "- "];

/// Characters that end a line, besides `\r\n` which counts as one break.
const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Split on every break in [`LINE_BREAKS`]. A trailing break does not add an empty line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !LINE_BREAKS.contains(&c) {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + c.len_utf8();
        if c == '\r'
            && let Some(&(j, '\n')) = chars.peek()
        {
            chars.next();
            start = j + 1;
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn sanitize_line(line: &str) -> &str {
    let mut s = line.trim();
    for marker in FORBIDDEN_MARKERS {
        if let Some(rest) = s.strip_prefix(marker) {
            s = rest.trim_start();
        }
    }
    s
}

/// Remove leading markers from every line.
///
/// Lines are trimmed, blank lines are kept as empty lines, and the whole text is
/// trimmed at the end. Everything else is left as written.
pub fn sanitize(text: &str) -> String {
    split_lines(text)
        .into_iter()
        .map(sanitize_line)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
