//! Unsafe-markup screening for exercise content.
//!
//! Content is checked before it is rendered. Code blocks and inline code
//! spans are masked out first, so a program listing that mentions `<script>`
//! or `onclick=` is never rejected. Everything else is matched against a
//! small set of patterns; the earliest hit decides the rejection.

use crate::SourceLocation;
use crate::code_fence::fenced_ranges;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::ops::Range;

/// Reason shown when content is absent or empty.
pub const MISSING_CONTENT_REASON: &str = "content missing or malformed";

/// Reason shown when unsafe markup is found outside code.
pub const UNSAFE_CONTENT_REASON: &str = "potentially dangerous content detected";

/// Kinds of markup that make content unsafe to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UnsafePattern {
    /// An opening `<script>` tag.
    ScriptBlock,
    /// An `<iframe>`, `<frame>`, or `<frameset>` tag.
    FrameElement,
    /// A `javascript:` scheme reference.
    JavascriptUrl,
    /// An `on*=` attribute inside a tag.
    EventHandler,
}

impl UnsafePattern {
    const ALL: [UnsafePattern; 4] = [
        UnsafePattern::ScriptBlock,
        UnsafePattern::FrameElement,
        UnsafePattern::JavascriptUrl,
        UnsafePattern::EventHandler,
    ];

    /// Short human-readable label for diagnostics.
    pub fn description(self) -> &'static str {
        match self {
            UnsafePattern::ScriptBlock => "embedded script block",
            UnsafePattern::FrameElement => "embedded frame element",
            UnsafePattern::JavascriptUrl => "javascript: reference",
            UnsafePattern::EventHandler => "inline event handler",
        }
    }

    fn regex(self) -> &'static Regex {
        match self {
            UnsafePattern::ScriptBlock => &SCRIPT_RE,
            UnsafePattern::FrameElement => &FRAME_RE,
            UnsafePattern::JavascriptUrl => &JAVASCRIPT_RE,
            UnsafePattern::EventHandler => &EVENT_HANDLER_RE,
        }
    }
}

static SCRIPT_RE: Lazy<Regex> = Lazy::new(|| compile(r"(?i)<\s*script\b"));
static FRAME_RE: Lazy<Regex> = Lazy::new(|| compile(r"(?i)<\s*(?:iframe|frameset|frame)\b"));
static JAVASCRIPT_RE: Lazy<Regex> = Lazy::new(|| compile(r"(?i)javascript\s*:"));
static EVENT_HANDLER_RE: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)<[a-z][a-z0-9-]*\b[^>]*?[\s/]on[a-z]+\s*="));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("unsafe-content patterns are valid regexes")
}

/// Why a piece of content was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Rejection {
    /// No content, or empty content.
    Missing,
    /// Unsafe markup found outside code.
    Unsafe {
        /// Which rule matched.
        pattern: UnsafePattern,
        /// Where the match starts in the original text.
        location: SourceLocation,
    },
}

impl Rejection {
    /// The user-facing reason string.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::Missing => MISSING_CONTENT_REASON,
            Rejection::Unsafe { .. } => UNSAFE_CONTENT_REASON,
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ValidationResult {
    /// Content may be rendered.
    Valid,
    /// Content must not be rendered; show the reason instead.
    Invalid(Rejection),
}

impl ValidationResult {
    /// Whether the content passed.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// The user-facing reason, if the content was refused.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(rejection) => Some(rejection.reason()),
        }
    }

    /// The rejection details, if the content was refused.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(rejection) => Some(rejection),
        }
    }
}

/// Decides whether `content` is safe to render.
///
/// # Examples
///
/// ```
/// use taskview_core::sanitize::validate;
///
/// assert!(validate(Some("```html\n<script>run()</script>\n```")).is_valid());
/// assert!(!validate(Some("<script>run()</script>")).is_valid());
/// assert!(!validate(None).is_valid());
/// ```
pub fn validate(content: Option<&str>) -> ValidationResult {
    let text = match content {
        Some(text) if !text.is_empty() => text,
        _ => return ValidationResult::Invalid(Rejection::Missing),
    };

    let masked = mask_code_regions(text);
    let earliest = UnsafePattern::ALL
        .iter()
        .filter_map(|&pattern| {
            pattern
                .regex()
                .find(&masked)
                .map(|found| (found.start(), pattern))
        })
        .min_by_key(|(start, _)| *start);

    match earliest {
        Some((offset, pattern)) => {
            let location = SourceLocation::from_offset(text, offset);
            log::debug!("Rejected content: {} at {}", pattern.description(), location);
            ValidationResult::Invalid(Rejection::Unsafe { pattern, location })
        }
        None => ValidationResult::Valid,
    }
}

/// Replaces fenced code blocks and inline code spans with spaces.
///
/// Line feeds are kept and every masked character becomes as many spaces as
/// it has UTF-8 bytes, so byte offsets into the result are valid offsets into
/// `text`.
pub fn mask_code_regions(text: &str) -> Cow<'_, str> {
    let fenced = fenced_ranges(text);
    let mut ranges = fenced.clone();
    ranges.extend(inline_code_ranges(text, &fenced));
    if ranges.is_empty() {
        return Cow::Borrowed(text);
    }
    ranges.sort_by_key(|r| r.start);

    let mut out = String::with_capacity(text.len());
    let mut ranges = ranges.into_iter().peekable();
    for (offset, ch) in text.char_indices() {
        while ranges.peek().is_some_and(|r| r.end <= offset) {
            ranges.next();
        }
        let masked = ranges.peek().is_some_and(|r| r.contains(&offset));
        if !masked || ch == '\n' {
            out.push(ch);
        } else {
            out.extend(std::iter::repeat_n(' ', ch.len_utf8()));
        }
    }
    Cow::Owned(out)
}

/// Index of the first fenced range that ends after `offset`.
///
/// `fenced` is sorted and non-overlapping, as [`fenced_ranges`] returns it.
fn next_fence(fenced: &[Range<usize>], offset: usize) -> usize {
    fenced.partition_point(|r| r.end <= offset)
}

/// Finds inline code spans outside fenced blocks.
///
/// A run of N backticks opens a span that closes at the next run of exactly N
/// backticks in the same paragraph. An opener without a closer is literal.
fn inline_code_ranges(text: &str, fenced: &[Range<usize>]) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    let mut fence = 0;

    while i < bytes.len() {
        while fenced.get(fence).is_some_and(|r| r.end <= i) {
            fence += 1;
        }
        if let Some(range) = fenced.get(fence)
            && range.contains(&i)
        {
            i = range.end;
            continue;
        }
        match bytes[i] {
            b'\\' if bytes.get(i + 1) == Some(&b'`') => i += 2,
            b'`' => {
                let run = backtick_run(bytes, i);
                match find_closing_run(bytes, i + run, run, fenced) {
                    Some(end) => {
                        spans.push(i..end);
                        i = end;
                    }
                    None => i += run,
                }
            }
            _ => i += 1,
        }
    }

    spans
}

fn backtick_run(bytes: &[u8], start: usize) -> usize {
    bytes[start..].iter().take_while(|&&b| b == b'`').count()
}

/// Returns the end offset of the closing run, if one exists before a paragraph
/// break or the next fenced block.
fn find_closing_run(
    bytes: &[u8],
    from: usize,
    run: usize,
    fenced: &[Range<usize>],
) -> Option<usize> {
    let limit = fenced
        .get(next_fence(fenced, from))
        .map_or(bytes.len(), |r| r.start.max(from));
    let mut j = from;
    while j < limit {
        match bytes[j] {
            b'`' => {
                let closing = backtick_run(bytes, j);
                if closing == run {
                    return Some(j + closing);
                }
                j += closing;
            }
            b'\n' if is_blank_line_after(bytes, j + 1) => return None,
            _ => j += 1,
        }
    }
    None
}

fn is_blank_line_after(bytes: &[u8], start: usize) -> bool {
    let rest = &bytes[start.min(bytes.len())..];
    let line_len = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
    rest[..line_len].iter().all(|b| b.is_ascii_whitespace())
}
