//! Fenced code block tracking.
//!
//! The sanitizer needs to know which lines belong to fenced code so that
//! program listings are never scanned for unsafe markup. This is a line-level
//! tracker following the CommonMark fence rules; it does not parse anything
//! else.

/// Fence parsing phases tracked across lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FencePhase {
    /// Not currently inside a fence.
    #[default]
    Outside,
    /// Within fence contents.
    InsideFence,
}

/// Current fence state carried from one line to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FenceState {
    /// Current fence phase.
    pub phase: FencePhase,
    /// Fence marker character (`` ` `` or `~`).
    pub marker: Option<char>,
    /// Length of the opening fence (number of marker characters).
    pub length: usize,
}

/// Outcome of processing a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineParseOutcome {
    /// State to carry into the next line.
    pub next_state: FenceState,
    /// Whether this line is part of a fenced block (opener and closer included).
    pub in_code: bool,
}

/// Advance fence state based on a single line of text.
pub fn advance_fence_state(line: &str, state: FenceState) -> LineParseOutcome {
    let (visual_indent, byte_offset) = leading_whitespace_info(line);
    let after_indent = &line[byte_offset..];

    match state.phase {
        // CommonMark: 4+ columns of indentation is an indented code block, never a fence
        FencePhase::Outside if visual_indent <= 3 => {
            match detect_fence_marker_with_length(after_indent) {
                Some((marker, length)) => {
                    let info = after_indent[length * marker.len_utf8()..].trim();
                    // Backtick fences may not carry backticks in their info string
                    if marker == '`' && info.contains('`') {
                        return LineParseOutcome {
                            next_state: state,
                            in_code: false,
                        };
                    }
                    LineParseOutcome {
                        next_state: FenceState {
                            phase: FencePhase::InsideFence,
                            marker: Some(marker),
                            length,
                        },
                        in_code: true,
                    }
                }
                None => LineParseOutcome {
                    next_state: state,
                    in_code: false,
                },
            }
        }
        FencePhase::Outside => LineParseOutcome {
            next_state: state,
            in_code: false,
        },
        FencePhase::InsideFence => {
            let closes = visual_indent <= 3
                && is_closing_fence(after_indent)
                && detect_fence_marker_with_length(after_indent).is_some_and(
                    |(marker, closer_len)| {
                        Some(marker) == state.marker && closer_len >= state.length
                    },
                );
            LineParseOutcome {
                next_state: if closes { FenceState::default() } else { state },
                in_code: true,
            }
        }
    }
}

/// Walks `text` line by line and returns the byte ranges covered by fenced code.
///
/// Each range spans whole lines, fence markers included. A fence left open at
/// the end of the text extends to the end.
pub fn fenced_ranges(text: &str) -> Vec<std::ops::Range<usize>> {
    let mut ranges = Vec::new();
    let mut state = FenceState::default();
    let mut open_at: Option<usize> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        let outcome = advance_fence_state(content, state);
        let end = offset + line.len();

        match (state.phase, outcome.next_state.phase) {
            (FencePhase::Outside, FencePhase::InsideFence) => open_at = Some(offset),
            (FencePhase::InsideFence, FencePhase::Outside) => {
                if let Some(start) = open_at.take() {
                    ranges.push(start..end);
                }
            }
            _ => {}
        }

        state = outcome.next_state;
        offset = end;
    }

    if let Some(start) = open_at {
        log::debug!("Unclosed code fence opened at byte {}", start);
        ranges.push(start..text.len());
    }

    ranges
}

/// Returns (visual_columns, byte_offset) for leading whitespace.
/// Visual columns expand tabs to 4-column boundaries per CommonMark.
fn leading_whitespace_info(line: &str) -> (usize, usize) {
    let mut col = 0;
    let mut bytes = 0;
    for b in line.bytes() {
        match b {
            b' ' => {
                col += 1;
                bytes += 1;
            }
            b'\t' => {
                col += 4 - (col % 4);
                bytes += 1;
            }
            _ => break,
        }
    }
    (col, bytes)
}

fn detect_fence_marker_with_length(after_indent: &str) -> Option<(char, usize)> {
    let mut chars = after_indent.chars();
    let first = chars.next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let run_len = 1 + chars.take_while(|c| *c == first).count();
    (run_len >= 3).then_some((first, run_len))
}

/// A closing fence has only fence markers followed by optional whitespace.
fn is_closing_fence(after_indent: &str) -> bool {
    let mut chars = after_indent.chars();
    let first = match chars.next() {
        Some(c) if c == '`' || c == '~' => c,
        _ => return false,
    };
    let mut count = 1;
    for c in chars.by_ref() {
        if c == first {
            count += 1;
        } else {
            return count >= 3 && c.is_whitespace() && chars.all(|c| c.is_whitespace());
        }
    }
    count >= 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_and_closes_backtick_fence() {
        let start = advance_fence_state("```python", FenceState::default());
        assert!(start.in_code);
        assert_eq!(start.next_state.phase, FencePhase::InsideFence);
        assert_eq!(start.next_state.marker, Some('`'));
        assert_eq!(start.next_state.length, 3);

        let inner = advance_fence_state("print('<script>')", start.next_state);
        assert!(inner.in_code);
        assert_eq!(inner.next_state.phase, FencePhase::InsideFence);

        let end = advance_fence_state("```", inner.next_state);
        assert!(end.in_code);
        assert_eq!(end.next_state, FenceState::default());
    }

    #[test]
    fn deeply_indented_fence_not_opened() {
        let outcome = advance_fence_state("    ```js", FenceState::default());
        assert!(!outcome.in_code);
        assert_eq!(outcome.next_state.phase, FencePhase::Outside);
    }

    #[test]
    fn tab_indented_fence_not_opened() {
        let outcome = advance_fence_state("\t```js", FenceState::default());
        assert!(!outcome.in_code);
    }

    #[test]
    fn backtick_info_string_with_backtick_is_not_a_fence() {
        let outcome = advance_fence_state("``` a`b", FenceState::default());
        assert!(!outcome.in_code);
    }

    #[test]
    fn ignores_mismatched_marker() {
        let start = advance_fence_state("~~~", FenceState::default());
        let still_inside = advance_fence_state("```", start.next_state);
        assert!(still_inside.in_code);
        assert_eq!(still_inside.next_state.marker, Some('~'));
    }

    #[test]
    fn shorter_closer_does_not_close() {
        let start = advance_fence_state("````markdown", FenceState::default());
        let inner = advance_fence_state("```", start.next_state);
        assert_eq!(inner.next_state.phase, FencePhase::InsideFence);
        let outer = advance_fence_state("````", inner.next_state);
        assert_eq!(outer.next_state.phase, FencePhase::Outside);
    }

    #[test]
    fn closer_with_info_string_does_not_close() {
        let start = advance_fence_state("```", FenceState::default());
        let not_closed = advance_fence_state("```js", start.next_state);
        assert_eq!(not_closed.next_state.phase, FencePhase::InsideFence);
    }

    #[test]
    fn ranges_cover_whole_fenced_lines() {
        let text = "intro\n```py\nx = 1\n```\noutro";
        let ranges = fenced_ranges(text);
        assert_eq!(ranges.len(), 1);
        assert_eq!(&text[ranges[0].clone()], "```py\nx = 1\n```\n");
    }

    #[test]
    fn unclosed_fence_runs_to_end() {
        let text = "a\n~~~\n<script>\n";
        let ranges = fenced_ranges(text);
        assert_eq!(ranges, vec![2..text.len()]);
    }

    #[test]
    fn crlf_lines_are_tracked() {
        let text = "```\r\ncode\r\n```\r\nafter";
        let ranges = fenced_ranges(text);
        assert_eq!(&text[ranges[0].clone()], "```\r\ncode\r\n```\r\n");
    }
}
