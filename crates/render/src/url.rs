//! Link and image destination checks.
//!
//! Destinations are checked after markdown has decoded entities and escapes,
//! so `javascript&#58;` and friends are seen in their final form.

/// Schemes a rendered `href` or `src` may carry.
pub const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto", "irc", "ircs", "xmpp"];

/// Whether `url` is relative, a fragment, or uses an allowed scheme.
///
/// A colon only starts a scheme when it comes before any `/`, `?` or `#`;
/// `a/b:c` and `#x:y` are relative. Anything else with a scheme outside
/// [`SAFE_SCHEMES`] is refused.
///
/// ```
/// use taskview_render::url::is_safe_url;
///
/// assert!(is_safe_url("https://example.com"));
/// assert!(is_safe_url("img/graph.png"));
/// assert!(!is_safe_url("javascript:alert(1)"));
/// ```
pub fn is_safe_url(url: &str) -> bool {
    let url = url.trim_matches(|c: char| c.is_ascii_whitespace() || c.is_ascii_control());
    let Some(colon) = url.find(':') else {
        return true;
    };
    if url[..colon].contains(['/', '?', '#']) {
        return true;
    }
    let scheme = url[..colon].to_ascii_lowercase();
    SAFE_SCHEMES.contains(&scheme.as_str())
}
