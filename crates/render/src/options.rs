//! Rendering configuration.

use crate::style::StyleSheet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use taskview_core::{ParseOptions, TaskviewError};

/// Light or dark presentation; picks the highlighting theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Dark text on a light background.
    #[default]
    Light,
    /// Light text on a dark background.
    Dark,
}

/// Options for [`crate::Renderer`].
///
/// Field names are camelCase in serialized form; snake_case is accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    /// Highlighting theme selection.
    #[serde(default, alias = "display_mode")]
    pub display_mode: DisplayMode,
    /// Extra class placed on the root element.
    #[serde(default, alias = "scope_class", alias = "className")]
    pub scope_class: Option<String>,
    /// Highlight fenced code with a known language.
    #[serde(default = "default_true", alias = "highlight_code")]
    pub highlight_code: bool,
    /// Add `loading="lazy"` to images.
    #[serde(default = "default_true", alias = "lazy_images")]
    pub lazy_images: bool,
    /// Let the markdown parser recognize math instead of the text extractor.
    #[serde(default, alias = "parser_math")]
    pub parser_math: bool,
    /// Classes layered over the stock stylesheet.
    #[serde(default, alias = "style_overrides")]
    pub style_overrides: StyleSheet,
}

fn default_true() -> bool {
    true
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            display_mode: DisplayMode::default(),
            scope_class: None,
            highlight_code: true,
            lazy_images: true,
            parser_math: false,
            style_overrides: StyleSheet::new(),
        }
    }
}

impl RenderOptions {
    /// Parses options from a JSON object; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, TaskviewError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads options from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TaskviewError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Parser options implied by these render options.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            math: self.parser_math,
            ..ParseOptions::exercise_notes()
        }
    }

    /// Stock stylesheet with the overrides applied.
    pub fn stylesheet(&self) -> StyleSheet {
        StyleSheet::standard().merged(&self.style_overrides)
    }
}
