//! Style classes per element kind.
//!
//! A [`StyleSheet`] is a lookup table from [`ElementKind`] to a class string.
//! [`StyleSheet::standard`] carries the stock utility classes; hosts layer
//! their own entries on top with [`StyleSheet::merged`].

use crate::tree::ElementKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Class lookup table keyed by element kind.
///
/// Serialized as a JSON object, e.g. `{"heading1": "title", "link": "a"}`.
/// An empty class string removes the class for that kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleSheet {
    classes: BTreeMap<ElementKind, String>,
}

impl StyleSheet {
    /// An empty sheet: no element gets a class.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock classes.
    ///
    /// ```
    /// use taskview_render::{ElementKind, StyleSheet};
    ///
    /// let sheet = StyleSheet::standard();
    /// assert_eq!(sheet.class_for(ElementKind::Heading1), Some("text-3xl font-bold text-primary mb-6 mt-8"));
    /// ```
    pub fn standard() -> Self {
        STANDARD_CLASSES
            .iter()
            .map(|(kind, class)| (*kind, class.to_string()))
            .collect()
    }

    /// Class for `kind`, if any.
    pub fn class_for(&self, kind: ElementKind) -> Option<&str> {
        self.classes
            .get(&kind)
            .map(String::as_str)
            .filter(|class| !class.is_empty())
    }

    /// Sets the class for `kind`.
    pub fn set(&mut self, kind: ElementKind, class: impl Into<String>) {
        self.classes.insert(kind, class.into());
    }

    /// This sheet with every entry of `overrides` replacing its own.
    pub fn merged(mut self, overrides: &StyleSheet) -> Self {
        for (kind, class) in &overrides.classes {
            self.classes.insert(*kind, class.clone());
        }
        self
    }

    /// Number of kinds with an entry.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the sheet has no entries.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<(ElementKind, String)> for StyleSheet {
    fn from_iter<I: IntoIterator<Item = (ElementKind, String)>>(iter: I) -> Self {
        Self {
            classes: iter.into_iter().collect(),
        }
    }
}

const STANDARD_CLASSES: &[(ElementKind, &str)] = &[
    (ElementKind::Root, "prose prose-slate dark:prose-invert max-w-none"),
    (ElementKind::Heading1, "text-3xl font-bold text-primary mb-6 mt-8"),
    (ElementKind::Heading2, "text-2xl font-bold text-primary mb-5 mt-7"),
    (ElementKind::Heading3, "text-xl font-bold text-primary mb-4 mt-6"),
    (ElementKind::Heading4, "text-lg font-semibold text-foreground mb-3 mt-5"),
    (ElementKind::Heading5, "text-base font-semibold text-foreground mb-2 mt-4"),
    (ElementKind::Heading6, "text-sm font-semibold text-foreground mb-2 mt-3"),
    (ElementKind::Paragraph, "mb-4 text-foreground leading-relaxed"),
    (ElementKind::Strong, "font-semibold text-foreground"),
    (ElementKind::Emphasis, "italic text-foreground"),
    (ElementKind::Strikethrough, "line-through text-muted-foreground"),
    (ElementKind::InlineCode, "bg-muted px-1.5 py-0.5 rounded text-sm font-mono"),
    (ElementKind::CodeBlock, "bg-slate-900 text-slate-100 p-4 rounded-lg overflow-x-auto mb-4"),
    (ElementKind::Blockquote, "border-l-4 border-primary pl-4 italic text-muted-foreground my-4"),
    (ElementKind::UnorderedList, "markdown-list mb-4 space-y-1"),
    (ElementKind::OrderedList, "markdown-list-ordered mb-4 space-y-1"),
    (ElementKind::ListItem, "text-foreground"),
    (ElementKind::TaskCheckbox, "mr-2 align-middle"),
    (ElementKind::TableWrapper, "overflow-x-auto my-6"),
    (ElementKind::Table, "min-w-full border-collapse border border-border"),
    (ElementKind::TableHead, "bg-muted"),
    (ElementKind::TableRow, "border-b border-border"),
    (ElementKind::TableHeaderCell, "border border-border px-4 py-2 text-left font-semibold text-foreground"),
    (ElementKind::TableCell, "border border-border px-4 py-2 text-foreground"),
    (ElementKind::Link, "text-primary hover:text-primary/80 underline underline-offset-2 transition-colors"),
    (ElementKind::Figure, "flex flex-col items-center my-6"),
    (ElementKind::Image, "max-w-full h-auto rounded-lg shadow-lg border border-border"),
    (ElementKind::ImageCaption, "text-sm text-muted-foreground mt-2 text-center italic max-w-md"),
    (ElementKind::ImagePlaceholder, "flex flex-col items-center my-6 p-8 border-2 border-dashed border-muted-foreground rounded-lg"),
    (ElementKind::ImagePlaceholderMessage, "text-muted-foreground text-center"),
    (ElementKind::ImagePlaceholderPath, "text-xs text-muted-foreground mt-2"),
    (ElementKind::ThematicBreak, "border-border my-6"),
    (ElementKind::InlineMath, "math-inline"),
    (ElementKind::DisplayMath, "math-display my-4 overflow-x-auto"),
    (ElementKind::FootnoteReference, "align-super text-xs text-primary"),
    (ElementKind::FootnoteDefinition, "text-sm text-muted-foreground mt-2"),
    (ElementKind::FootnoteSection, "border-t border-border mt-8 pt-4"),
    (ElementKind::Diagnostic, "text-muted-foreground italic p-4 border border-destructive/20 rounded-lg bg-destructive/5"),
];
