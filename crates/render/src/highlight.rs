//! Code block highlighting backed by syntect.

use crate::options::DisplayMode;
use crate::tree::{HighlightedLine, HighlightedSpan};
use log::{debug, warn};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, FontStyle, Style, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Theme used in [`DisplayMode::Light`].
pub const LIGHT_THEME: &str = "InspiredGitHub";
/// Theme used in [`DisplayMode::Dark`].
pub const DARK_THEME: &str = "base16-ocean.dark";

/// Turns source code into styled lines.
pub trait CodeHighlighter {
    /// Highlights `code` as `lang`.
    ///
    /// Returns `None` when the language is not known; the caller then shows
    /// the code as a plain monospace block.
    fn highlight(&self, code: &str, lang: &str, mode: DisplayMode) -> Option<Vec<HighlightedLine>>;
}

/// Highlighter using syntect's bundled syntaxes and themes.
///
/// Loading the sets is the expensive part, so build one and reuse it.
pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntectHighlighter {
    /// Loads the default syntax and theme sets.
    pub fn new() -> Self {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let theme_set = ThemeSet::load_defaults();
        debug!(
            "loaded {} syntaxes and {} themes",
            syntax_set.syntaxes().len(),
            theme_set.themes.len()
        );
        Self {
            syntax_set,
            theme_set,
        }
    }

    /// Theme for a display mode, if the bundled set has it.
    pub fn theme_for(&self, mode: DisplayMode) -> Option<&Theme> {
        let name = match mode {
            DisplayMode::Light => LIGHT_THEME,
            DisplayMode::Dark => DARK_THEME,
        };
        self.theme_set.themes.get(name)
    }

    /// Whether `lang` names a known syntax.
    pub fn supports(&self, lang: &str) -> bool {
        self.find_syntax(lang).is_some()
    }

    /// Resolves a fence info-string language to a syntax.
    ///
    /// Common aliases map to file extensions; otherwise the token is looked
    /// up by extension and then by name, ignoring case.
    fn find_syntax(&self, lang: &str) -> Option<&SyntaxReference> {
        let lang = lang.trim();
        if lang.is_empty() {
            return None;
        }
        let lower = lang.to_lowercase();
        let token = match lower.as_str() {
            "rust" => "rs",
            "python" | "python3" | "py3" => "py",
            "javascript" | "node" => "js",
            "typescript" => "ts",
            "c++" | "cxx" => "cpp",
            "csharp" | "c#" => "cs",
            "golang" => "go",
            "ruby" => "rb",
            "shell" | "bash" | "zsh" | "console" => "sh",
            "yml" => "yaml",
            "markdown" => "md",
            "htm" => "html",
            "haskell" => "hs",
            "perl" => "pl",
            "patch" => "diff",
            other => other,
        };

        self.syntax_set
            .find_syntax_by_extension(token)
            .or_else(|| self.syntax_set.find_syntax_by_token(token))
            .or_else(|| {
                self.syntax_set
                    .syntaxes()
                    .iter()
                    .find(|syntax| syntax.name.to_lowercase() == lower)
            })
    }
}

impl CodeHighlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, lang: &str, mode: DisplayMode) -> Option<Vec<HighlightedLine>> {
        let Some(syntax) = self.find_syntax(lang) else {
            debug!("no syntax for code block language {lang:?}, rendering plain");
            return None;
        };
        let Some(theme) = self.theme_for(mode) else {
            warn!("highlighting theme for {mode:?} mode is missing");
            return None;
        };

        let fallback = theme.settings.foreground.unwrap_or(Color::BLACK);
        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut lines = Vec::new();
        for line in LinesWithEndings::from(code) {
            let spans = match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => ranges
                    .into_iter()
                    .filter_map(|(style, text)| style_to_span(style, text))
                    .collect(),
                Err(err) => {
                    warn!("failed to highlight line: {err}");
                    plain_span(line, fallback).into_iter().collect()
                }
            };
            lines.push(HighlightedLine { spans });
        }
        Some(lines)
    }
}

/// Hex form of a syntect color.
pub fn color_hex(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

fn style_to_span(style: Style, text: &str) -> Option<HighlightedSpan> {
    let text = strip_line_ending(text);
    if text.is_empty() {
        return None;
    }
    Some(HighlightedSpan {
        text: text.to_string(),
        color: color_hex(style.foreground),
        bold: style.font_style.contains(FontStyle::BOLD),
        italic: style.font_style.contains(FontStyle::ITALIC),
        underline: style.font_style.contains(FontStyle::UNDERLINE),
    })
}

fn plain_span(line: &str, color: Color) -> Option<HighlightedSpan> {
    let text = strip_line_ending(line);
    (!text.is_empty()).then(|| HighlightedSpan {
        text: text.to_string(),
        color: color_hex(color),
        bold: false,
        italic: false,
        underline: false,
    })
}

fn strip_line_ending(text: &str) -> &str {
    text.strip_suffix('\n')
        .map(|t| t.strip_suffix('\r').unwrap_or(t))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    static HIGHLIGHTER: Lazy<SyntectHighlighter> = Lazy::new(SyntectHighlighter::new);

    fn line_text(line: &HighlightedLine) -> String {
        line.spans.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn highlights_python() {
        let code = "def f(x):\n    return x * 2";
        let lines = HIGHLIGHTER.highlight(code, "python", DisplayMode::Light).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(line_text(&lines[0]), "def f(x):");
        assert_eq!(line_text(&lines[1]), "    return x * 2");
        assert!(lines[0].spans.len() > 1);
        assert!(lines[0].spans.iter().all(|s| s.color.starts_with('#') && s.color.len() == 7));
    }

    #[test]
    fn unknown_language_is_none() {
        assert!(HIGHLIGHTER.highlight("x", "no-such-lang", DisplayMode::Light).is_none());
        assert!(HIGHLIGHTER.highlight("x", "", DisplayMode::Light).is_none());
        assert!(!HIGHLIGHTER.supports("no-such-lang"));
    }

    #[test]
    fn aliases_resolve() {
        for lang in ["py", "Python", "rust", "rs", "js", "bash", "sh", "json"] {
            assert!(HIGHLIGHTER.supports(lang), "{lang} should be supported");
        }
    }

    #[test]
    fn display_mode_changes_colors() {
        let code = "let x = 1;";
        let light = HIGHLIGHTER.highlight(code, "rust", DisplayMode::Light).unwrap();
        let dark = HIGHLIGHTER.highlight(code, "rust", DisplayMode::Dark).unwrap();
        assert_eq!(line_text(&light[0]), line_text(&dark[0]));
        assert_ne!(light, dark);
    }

    #[test]
    fn both_themes_exist() {
        assert!(HIGHLIGHTER.theme_for(DisplayMode::Light).is_some());
        assert!(HIGHLIGHTER.theme_for(DisplayMode::Dark).is_some());
    }

    #[test]
    fn blank_lines_are_kept() {
        let lines = HIGHLIGHTER.highlight("a = 1\n\nb = 2", "py", DisplayMode::Light).unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].spans.is_empty());
    }

    #[test]
    fn color_hex_is_lowercase_rgb() {
        let color = Color { r: 255, g: 16, b: 0, a: 255 };
        assert_eq!(color_hex(color), "#ff1000");
    }
}
