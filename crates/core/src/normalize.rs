//! Text normalization applied before parsing.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static EXCESS_NEWLINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("newline pattern is a valid regex"));

/// Canonicalizes line endings, collapses runs of three or more line feeds to
/// two, and trims the document.
///
/// Borrows when nothing changes. The function is idempotent.
///
/// ```
/// use taskview_core::normalize::normalize;
///
/// assert_eq!(normalize("A\r\n\r\n\r\n\r\nB  "), "A\n\nB");
/// ```
pub fn normalize(input: &str) -> Cow<'_, str> {
    let unified: Cow<'_, str> = if input.contains('\r') {
        Cow::Owned(input.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(input)
    };

    let collapsed = match unified {
        Cow::Borrowed(text) => EXCESS_NEWLINES.replace_all(text, "\n\n"),
        Cow::Owned(text) => Cow::Owned(EXCESS_NEWLINES.replace_all(&text, "\n\n").into_owned()),
    };

    match collapsed {
        Cow::Borrowed(text) => Cow::Borrowed(text.trim()),
        Cow::Owned(text) => {
            let trimmed = text.trim();
            if trimmed.len() == text.len() {
                Cow::Owned(text)
            } else {
                Cow::Owned(trimmed.to_string())
            }
        }
    }
}

/// Normalizes optional content; absent content becomes an empty string.
pub fn normalize_content(content: Option<&str>) -> String {
    content.map(normalize).unwrap_or_default().into_owned()
}
