//! Splitting text runs into literal text and dollar-delimited formulas.

use serde::Serialize;

/// A contiguous piece of a text run.
///
/// Formula variants hold the content between the delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "content", rename_all = "camelCase")]
pub enum Segment<'a> {
    /// Plain text.
    Text(&'a str),
    /// `$…$`
    InlineMath(&'a str),
    /// `$$…$$`
    BlockMath(&'a str),
}

impl<'a> Segment<'a> {
    /// The segment content without delimiters.
    pub fn content(&self) -> &'a str {
        match *self {
            Segment::Text(text) | Segment::InlineMath(text) | Segment::BlockMath(text) => text,
        }
    }

    /// Whether this segment is a formula of either kind.
    pub fn is_math(&self) -> bool {
        !matches!(self, Segment::Text(_))
    }

    /// Writes the segment back as source text, delimiters included.
    pub fn write_source(&self, out: &mut String) {
        match self {
            Segment::Text(text) => out.push_str(text),
            Segment::InlineMath(tex) => {
                out.push('$');
                out.push_str(tex);
                out.push('$');
            }
            Segment::BlockMath(tex) => {
                out.push_str("$$");
                out.push_str(tex);
                out.push_str("$$");
            }
        }
    }
}

/// Concatenates segments back into the text they were extracted from.
pub fn reassemble(segments: &[Segment<'_>]) -> String {
    let mut out = String::new();
    for segment in segments {
        segment.write_source(&mut out);
    }
    out
}

/// Splits `text` into literal and formula segments.
///
/// At each `$` the double-dollar form is tried first, then the single-dollar
/// form. Formula content never contains `$` and is never empty; a delimiter
/// that does not close stays in the surrounding literal text. Adjacent
/// literal text is merged, and an empty input yields no segments.
///
/// There is no escape syntax. Markdown strips the backslash from `\$` before
/// text reaches here, so an escaped dollar still opens a formula.
///
/// ```
/// use taskview_core::math::{Segment, extract_math_segments};
///
/// assert_eq!(
///     extract_math_segments("Inline $x^2$ end"),
///     vec![
///         Segment::Text("Inline "),
///         Segment::InlineMath("x^2"),
///         Segment::Text(" end"),
///     ]
/// );
/// ```
pub fn extract_math_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find('$') {
        let at = cursor + found;
        let Some((segment, end)) = match_formula(text, at) else {
            cursor = at + 1;
            continue;
        };
        if literal_start < at {
            segments.push(Segment::Text(&text[literal_start..at]));
        }
        segments.push(segment);
        literal_start = end;
        cursor = end;
    }

    if literal_start < text.len() {
        segments.push(Segment::Text(&text[literal_start..]));
    }
    segments
}

/// Tries to match a formula whose opening `$` is at `at`; returns it with its end offset.
fn match_formula(text: &str, at: usize) -> Option<(Segment<'_>, usize)> {
    let rest = &text[at..];

    if let Some(body) = rest.strip_prefix("$$") {
        if let Some(close) = body.find('$')
            && close > 0
            && body[close..].starts_with("$$")
        {
            return Some((Segment::BlockMath(&body[..close]), at + 2 + close + 2));
        }
    }

    let body = &rest[1..];
    match body.find('$') {
        Some(close) if close > 0 => Some((Segment::InlineMath(&body[..close]), at + 1 + close + 1)),
        _ => None,
    }
}
