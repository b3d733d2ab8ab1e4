//! Presentation tree produced by the renderer.
//!
//! The tree is plain data: element kinds, style classes, attributes and text.
//! A display layer (or [`crate::html`]) turns it into something visible.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every element the renderer can produce.
///
/// The kind decides the HTML tag and the default style class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    /// Document wrapper.
    Root,
    /// `#`
    Heading1,
    /// `##`
    Heading2,
    /// `###`
    Heading3,
    /// `####`
    Heading4,
    /// `#####`
    Heading5,
    /// `######`
    Heading6,
    /// Paragraph.
    Paragraph,
    /// Strong emphasis.
    Strong,
    /// Emphasis.
    Emphasis,
    /// GFM strikethrough.
    Strikethrough,
    /// Inline code span, and fenced blocks without a language.
    InlineCode,
    /// The `<pre>` around a fenced code block.
    CodeBlock,
    /// Block quote.
    Blockquote,
    /// Bulleted list.
    UnorderedList,
    /// Numbered list.
    OrderedList,
    /// List item.
    ListItem,
    /// Disabled checkbox of a GFM task list item.
    TaskCheckbox,
    /// Scroll container around a table.
    TableWrapper,
    /// Table.
    Table,
    /// Table header section.
    TableHead,
    /// Table body section.
    TableBody,
    /// Table row.
    TableRow,
    /// Header cell.
    TableHeaderCell,
    /// Body cell.
    TableCell,
    /// Hyperlink.
    Link,
    /// Figure around an image.
    Figure,
    /// The image itself.
    Image,
    /// Caption under an image.
    ImageCaption,
    /// Shown instead of an image that failed to load.
    ImagePlaceholder,
    /// First line of the placeholder.
    ImagePlaceholderMessage,
    /// Source path line of the placeholder.
    ImagePlaceholderPath,
    /// Horizontal rule.
    ThematicBreak,
    /// Hard line break.
    LineBreak,
    /// `$…$` formula.
    InlineMath,
    /// `$$…$$` formula.
    DisplayMath,
    /// GFM footnote call.
    FootnoteReference,
    /// GFM footnote body.
    FootnoteDefinition,
    /// Section collecting the footnote bodies at the end of the document.
    FootnoteSection,
    /// Rejection or failure message shown instead of a document.
    Diagnostic,
}

impl ElementKind {
    /// Heading kind for a depth; depths past six clamp to six.
    pub fn heading(depth: u8) -> Self {
        match depth {
            0 | 1 => ElementKind::Heading1,
            2 => ElementKind::Heading2,
            3 => ElementKind::Heading3,
            4 => ElementKind::Heading4,
            5 => ElementKind::Heading5,
            _ => ElementKind::Heading6,
        }
    }

    /// HTML tag name.
    pub fn tag(self) -> &'static str {
        match self {
            ElementKind::Root
            | ElementKind::TableWrapper
            | ElementKind::ImagePlaceholder
            | ElementKind::DisplayMath
            | ElementKind::FootnoteDefinition
            | ElementKind::Diagnostic => "div",
            ElementKind::Heading1 => "h1",
            ElementKind::Heading2 => "h2",
            ElementKind::Heading3 => "h3",
            ElementKind::Heading4 => "h4",
            ElementKind::Heading5 => "h5",
            ElementKind::Heading6 => "h6",
            ElementKind::Paragraph
            | ElementKind::ImagePlaceholderMessage
            | ElementKind::ImagePlaceholderPath => "p",
            ElementKind::Strong => "strong",
            ElementKind::Emphasis => "em",
            ElementKind::Strikethrough => "del",
            ElementKind::InlineCode => "code",
            ElementKind::CodeBlock => "pre",
            ElementKind::Blockquote => "blockquote",
            ElementKind::UnorderedList => "ul",
            ElementKind::OrderedList => "ol",
            ElementKind::ListItem => "li",
            ElementKind::TaskCheckbox => "input",
            ElementKind::Table => "table",
            ElementKind::TableHead => "thead",
            ElementKind::TableBody => "tbody",
            ElementKind::TableRow => "tr",
            ElementKind::TableHeaderCell => "th",
            ElementKind::TableCell => "td",
            ElementKind::Link | ElementKind::FootnoteReference => "a",
            ElementKind::FootnoteSection => "section",
            ElementKind::Figure => "figure",
            ElementKind::Image => "img",
            ElementKind::ImageCaption => "figcaption",
            ElementKind::ThematicBreak => "hr",
            ElementKind::LineBreak => "br",
            ElementKind::InlineMath => "span",
        }
    }

    /// HTML tag name inside phrasing content.
    ///
    /// Block-level kinds that can show up in running text fall back to
    /// `span`; their classes carry the block layout.
    pub fn phrasing_tag(self) -> &'static str {
        match self {
            ElementKind::Figure
            | ElementKind::ImageCaption
            | ElementKind::ImagePlaceholder
            | ElementKind::ImagePlaceholderMessage
            | ElementKind::ImagePlaceholderPath
            | ElementKind::DisplayMath => "span",
            other => other.tag(),
        }
    }

    /// Whether the HTML element only admits phrasing content.
    pub fn holds_phrasing_only(self) -> bool {
        matches!(
            self,
            ElementKind::Heading1
                | ElementKind::Heading2
                | ElementKind::Heading3
                | ElementKind::Heading4
                | ElementKind::Heading5
                | ElementKind::Heading6
                | ElementKind::Paragraph
                | ElementKind::Strong
                | ElementKind::Emphasis
                | ElementKind::Strikethrough
                | ElementKind::InlineCode
                | ElementKind::Link
                | ElementKind::FootnoteReference
                | ElementKind::InlineMath
                | ElementKind::ImageCaption
                | ElementKind::ImagePlaceholderMessage
                | ElementKind::ImagePlaceholderPath
        )
    }

    /// Whether the HTML element has no closing tag.
    pub fn is_void(self) -> bool {
        matches!(
            self,
            ElementKind::TaskCheckbox
                | ElementKind::Image
                | ElementKind::ThematicBreak
                | ElementKind::LineBreak
        )
    }
}

/// A node of the presentation tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PresentationNode {
    /// A styled element with children.
    Element(Element),
    /// Literal text, unescaped.
    Text {
        /// The text.
        value: String,
    },
    /// A formula.
    Math(MathNode),
    /// A fenced or indented code block.
    Code(CodeBlock),
    /// An image with its caption and failure placeholder.
    Image(ImageNode),
}

impl PresentationNode {
    /// Creates a text node.
    pub fn text(value: impl Into<String>) -> Self {
        PresentationNode::Text {
            value: value.into(),
        }
    }

    /// Appends the visible text of this node to `out`.
    pub fn write_text(&self, out: &mut String) {
        match self {
            PresentationNode::Element(element) => element.write_text(out),
            PresentationNode::Text { value } => out.push_str(value),
            PresentationNode::Math(math) => out.push_str(&math.tex),
            PresentationNode::Code(code) => out.push_str(&code.code),
            PresentationNode::Image(image) => {
                if let Some(caption) = &image.caption {
                    caption.write_text(out);
                }
            }
        }
    }
}

/// A styled element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    /// What the element is.
    pub kind: ElementKind,
    /// Style class, when the stylesheet has one for this kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Extra attributes, sorted by name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Child nodes.
    pub children: Vec<PresentationNode>,
}

impl Element {
    /// An element of `kind` with no class, attributes or children.
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            class: None,
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Sets the style class.
    pub fn with_class(mut self, class: Option<String>) -> Self {
        self.class = class;
        self
    }

    /// Adds an attribute.
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    /// Replaces the children.
    pub fn with_children(mut self, children: Vec<PresentationNode>) -> Self {
        self.children = children;
        self
    }

    /// Looks up an attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Concatenated visible text of the subtree.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) {
        for child in &self.children {
            child.write_text(out);
        }
    }

    /// Visits every node below this element, depth first, in document order.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a PresentationNode)) {
        for child in &self.children {
            f(child);
            match child {
                PresentationNode::Element(element) => element.visit(f),
                PresentationNode::Image(image) => {
                    if let Some(caption) = &image.caption {
                        caption.visit(f);
                    }
                }
                _ => {}
            }
        }
    }

    /// All descendant elements of `kind`, in document order.
    pub fn find_all(&self, kind: ElementKind) -> Vec<&Element> {
        let mut found = Vec::new();
        self.visit(&mut |node| {
            if let PresentationNode::Element(element) = node
                && element.kind == kind
            {
                found.push(element);
            }
        });
        found
    }
}

impl From<Element> for PresentationNode {
    fn from(element: Element) -> Self {
        PresentationNode::Element(element)
    }
}

/// How a formula sits in the flow of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MathDisplay {
    /// Inside a line of text.
    Inline,
    /// On its own line.
    Block,
}

/// A formula.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MathNode {
    /// Inline or display.
    pub display: MathDisplay,
    /// TeX source between the delimiters.
    pub tex: String,
    /// Style class.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Typeset markup, when a typesetter produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,
}

/// A code block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBlock {
    /// Info-string language, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// Raw code.
    pub code: String,
    /// Class of the `<pre>` wrapper.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Class of the inner `<code>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_class: Option<String>,
    /// Highlighted lines; `None` renders the code as plain monospace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<HighlightedLine>>,
}

/// One highlighted source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightedLine {
    /// Styled runs, line ending excluded.
    pub spans: Vec<HighlightedSpan>,
}

/// A run of code with a single style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightedSpan {
    /// The code text.
    pub text: String,
    /// Foreground color as `#rrggbb`.
    pub color: String,
    /// Bold.
    #[serde(skip_serializing_if = "is_false")]
    pub bold: bool,
    /// Italic.
    #[serde(skip_serializing_if = "is_false")]
    pub italic: bool,
    /// Underline.
    #[serde(skip_serializing_if = "is_false")]
    pub underline: bool,
}

fn is_false(value: &bool) -> bool {
    !value
}

/// An image, rendered as a figure with an optional caption.
///
/// The placeholder is built up front so a display layer can swap it in when
/// loading fails without rendering again.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageNode {
    /// Image source as written in the document.
    pub src: String,
    /// Alternative text.
    pub alt: String,
    /// Optional title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Class of the figure wrapper.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub figure_class: Option<String>,
    /// Class of the image element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Whether the image loads lazily.
    pub lazy: bool,
    /// Caption holding the alt text, absent when the alt text is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<Element>,
    /// Shown in place of the figure when the image fails to load.
    pub placeholder: Element,
}

/// A rendered document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedDocument {
    /// The root element.
    pub root: Element,
}

impl RenderedDocument {
    /// Wraps a root element.
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Concatenated visible text.
    pub fn text(&self) -> String {
        self.root.text()
    }

    /// Every image in document order.
    pub fn images(&self) -> Vec<&ImageNode> {
        let mut images = Vec::new();
        self.root.visit(&mut |node| {
            if let PresentationNode::Image(image) = node {
                images.push(image);
            }
        });
        images
    }

    /// Returns a copy where each image with source `src` is replaced by its
    /// placeholder. Everything else is left as it was.
    pub fn with_failed_image(&self, src: &str) -> Self {
        let mut root = self.root.clone();
        let replaced = replace_failed_images(&mut root, src);
        log::debug!("replaced {replaced} image(s) with source {src:?} by placeholders");
        Self { root }
    }
}

fn replace_failed_images(element: &mut Element, src: &str) -> usize {
    let mut replaced = 0;
    for child in &mut element.children {
        let placeholder = match child {
            PresentationNode::Image(image) if image.src == src => image.placeholder.clone(),
            PresentationNode::Element(inner) => {
                replaced += replace_failed_images(inner, src);
                continue;
            }
            _ => continue,
        };
        *child = PresentationNode::Element(placeholder);
        replaced += 1;
    }
    replaced
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(src: &str, alt: &str) -> PresentationNode {
        let placeholder = Element::new(ElementKind::ImagePlaceholder).with_children(vec![
            Element::new(ElementKind::ImagePlaceholderMessage)
                .with_children(vec![PresentationNode::text(format!("Image not loaded: {alt}"))])
                .into(),
        ]);
        PresentationNode::Image(ImageNode {
            src: src.to_string(),
            alt: alt.to_string(),
            title: None,
            figure_class: None,
            class: None,
            lazy: false,
            caption: None,
            placeholder,
        })
    }

    #[test]
    fn heading_depths_map_to_distinct_kinds() {
        let kinds: Vec<_> = (1..=6).map(ElementKind::heading).collect();
        for (i, a) in kinds.iter().enumerate() {
            assert_eq!(a.tag(), format!("h{}", i + 1));
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(ElementKind::heading(9), ElementKind::Heading6);
    }

    #[test]
    fn failed_image_keeps_siblings() {
        let paragraph = Element::new(ElementKind::Paragraph).with_children(vec![
            PresentationNode::text("before "),
            image("a.png", "diagram"),
            PresentationNode::text(" after"),
            image("b.png", "other"),
        ]);
        let doc = RenderedDocument::new(
            Element::new(ElementKind::Root).with_children(vec![paragraph.into()]),
        );

        let failed = doc.with_failed_image("a.png");
        let placeholders = failed.root.find_all(ElementKind::ImagePlaceholder);
        assert_eq!(placeholders.len(), 1);
        assert_eq!(placeholders[0].text(), "Image not loaded: diagram");
        assert_eq!(failed.images().len(), 1);
        assert_eq!(failed.images()[0].src, "b.png");
        assert!(failed.text().starts_with("before "));
        assert!(failed.text().contains(" after"));

        // the original is untouched
        assert_eq!(doc.images().len(), 2);
    }

    #[test]
    fn unknown_source_changes_nothing() {
        let doc = RenderedDocument::new(
            Element::new(ElementKind::Root).with_children(vec![image("a.png", "x")]),
        );
        assert_eq!(doc.with_failed_image("zzz.png"), doc);
    }

    #[test]
    fn serializes_with_type_tag() {
        let node: PresentationNode = Element::new(ElementKind::Heading2)
            .with_class(Some("h2".into()))
            .with_children(vec![PresentationNode::text("Hi")])
            .into();
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(
            json,
            r#"{"type":"element","kind":"heading2","class":"h2","children":[{"type":"text","value":"Hi"}]}"#
        );
    }
}
