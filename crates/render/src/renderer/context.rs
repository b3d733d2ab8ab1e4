//! Rendering context for the mdast walk.

use super::types::{LinkTarget, Scope};
use crate::highlight::CodeHighlighter;
use crate::options::RenderOptions;
use crate::style::StyleSheet;
use crate::tree::{CodeBlock, Element, ElementKind, ImageNode, MathDisplay, MathNode, PresentationNode};
use crate::typeset::MathTypesetter;
use crate::url::is_safe_url;
use markdown::mdast::Node;
use std::collections::HashMap;

/// Id prefix of footnote definitions.
pub const FOOTNOTE_PREFIX: &str = "user-content-fn-";
/// Id prefix of footnote references.
pub const FOOTNOTE_REF_PREFIX: &str = "user-content-fnref-";

/// State carried through one render: configuration, the scope stack,
/// link definitions and footnote bookkeeping.
pub struct Context<'r> {
    options: &'r RenderOptions,
    styles: &'r StyleSheet,
    highlighter: Option<&'r dyn CodeHighlighter>,
    typesetter: &'r dyn MathTypesetter,
    stack: Vec<Scope>,
    definitions: HashMap<String, LinkTarget>,
    /// Footnote identifiers in order of first reference.
    footnote_order: Vec<String>,
    footnote_ref_counts: HashMap<String, usize>,
    /// Rendered footnote bodies, keyed by identifier.
    footnote_bodies: HashMap<String, Vec<PresentationNode>>,
}

impl<'r> Context<'r> {
    /// Creates a context at document root.
    pub fn new(
        options: &'r RenderOptions,
        styles: &'r StyleSheet,
        highlighter: Option<&'r dyn CodeHighlighter>,
        typesetter: &'r dyn MathTypesetter,
    ) -> Self {
        Self {
            options,
            styles,
            highlighter,
            typesetter,
            stack: vec![Scope::Root],
            definitions: HashMap::new(),
            footnote_order: Vec::new(),
            footnote_ref_counts: HashMap::new(),
            footnote_bodies: HashMap::new(),
        }
    }

    /// Records every link definition in `node` so references can resolve
    /// regardless of where the definition appears.
    pub fn collect_definitions(&mut self, node: &Node) {
        if let Node::Definition(definition) = node {
            // first definition wins, as in CommonMark
            self.definitions
                .entry(definition.identifier.clone())
                .or_insert_with(|| LinkTarget {
                    url: definition.url.clone(),
                    title: definition.title.clone(),
                });
        }
        if let Some(children) = node.children() {
            for child in children {
                self.collect_definitions(child);
            }
        }
    }

    /// Looks up a link definition by normalized identifier.
    pub fn definition(&self, identifier: &str) -> Option<&LinkTarget> {
        self.definitions.get(identifier)
    }

    /// An empty element of `kind` carrying its stylesheet class.
    pub fn element(&self, kind: ElementKind) -> Element {
        Element::new(kind).with_class(self.class(kind))
    }

    /// Stylesheet class for `kind`.
    pub fn class(&self, kind: ElementKind) -> Option<String> {
        self.styles.class_for(kind).map(str::to_string)
    }

    /// Class of the root element: the stock class plus the scope class.
    pub fn root_class(&self) -> Option<String> {
        let scope = self
            .options
            .scope_class
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        match (self.styles.class_for(ElementKind::Root), scope) {
            (Some(base), Some(scope)) => Some(format!("{base} {scope}")),
            (Some(base), None) => Some(base.to_string()),
            (None, Some(scope)) => Some(scope.to_string()),
            (None, None) => None,
        }
    }

    /// Enters a new scope.
    pub fn enter(&mut self, scope: Scope) {
        self.stack.push(scope);
    }

    /// Leaves the current scope.
    pub fn exit(&mut self) -> Option<Scope> {
        self.stack.pop()
    }

    /// Whether the current block sits directly in a tight list, so its
    /// paragraphs are not wrapped. A block quotation in between keeps them.
    pub fn is_in_tight_list(&self) -> bool {
        self.stack
            .iter()
            .rev()
            .find(|scope| matches!(scope, Scope::List { .. } | Scope::Blockquote))
            .is_some_and(|scope| matches!(scope, Scope::List { spread: false }))
    }

    /// Whether rendering happens inside a link; nested links become text.
    pub fn is_in_link(&self) -> bool {
        self.stack.iter().any(|scope| matches!(scope, Scope::Link))
    }

    /// Builds a formula node, typesetting it when the typesetter can.
    pub fn math(&self, tex: &str, display: MathDisplay) -> PresentationNode {
        let kind = match display {
            MathDisplay::Inline => ElementKind::InlineMath,
            MathDisplay::Block => ElementKind::DisplayMath,
        };
        PresentationNode::Math(MathNode {
            display,
            tex: tex.to_string(),
            class: self.class(kind),
            markup: self.typesetter.typeset(tex, display),
        })
    }

    /// Builds a code block, highlighted when the language is known.
    pub fn code_block(&self, code: &str, lang: Option<&str>) -> PresentationNode {
        let lang = lang.map(str::trim).filter(|l| !l.is_empty());
        let lines = match (self.highlighter, lang) {
            (Some(highlighter), Some(lang)) => {
                highlighter.highlight(code, lang, self.options.display_mode)
            }
            _ => None,
        };
        let code_class = match lang {
            Some(lang) => Some(format!("language-{lang}")),
            None => self.class(ElementKind::InlineCode),
        };
        PresentationNode::Code(CodeBlock {
            lang: lang.map(str::to_string),
            code: code.to_string(),
            class: self.class(ElementKind::CodeBlock),
            code_class,
            lines,
        })
    }

    /// Builds an image figure with its caption and failure placeholder.
    ///
    /// A source with a refused scheme never reaches `src`; the placeholder is
    /// rendered in its place.
    pub fn image(&self, src: &str, alt: &str, title: Option<&str>) -> PresentationNode {
        if !is_safe_url(src) {
            log::debug!("image source with refused scheme replaced by placeholder: {src}");
            return self.image_placeholder(src, alt).into();
        }

        let caption = (!alt.trim().is_empty()).then(|| {
            self.element(ElementKind::ImageCaption)
                .with_children(vec![PresentationNode::text(alt)])
        });
        PresentationNode::Image(ImageNode {
            src: src.to_string(),
            alt: alt.to_string(),
            title: title.map(str::to_string),
            figure_class: self.class(ElementKind::Figure),
            class: self.class(ElementKind::Image),
            lazy: self.options.lazy_images,
            caption,
            placeholder: self
                .image_placeholder(src, alt)
                .with_attribute("data-src", src),
        })
    }

    fn image_placeholder(&self, src: &str, alt: &str) -> Element {
        let label = if alt.trim().is_empty() { "image" } else { alt };
        self.element(ElementKind::ImagePlaceholder).with_children(vec![
            self.element(ElementKind::ImagePlaceholderMessage)
                .with_children(vec![PresentationNode::text(format!(
                    "Image not loaded: {label}"
                ))])
                .into(),
            self.element(ElementKind::ImagePlaceholderPath)
                .with_children(vec![PresentationNode::text(format!("Path: {src}"))])
                .into(),
        ])
    }

    /// Registers a reference to a footnote.
    ///
    /// Returns its ordinal (1-based, by first reference) and how many times it
    /// has been referenced so far, this one included.
    pub fn reference_footnote(&mut self, identifier: &str) -> (usize, usize) {
        let ordinal = match self.footnote_order.iter().position(|id| id == identifier) {
            Some(index) => index + 1,
            None => {
                self.footnote_order.push(identifier.to_string());
                self.footnote_order.len()
            }
        };
        let count = self
            .footnote_ref_counts
            .entry(identifier.to_string())
            .or_insert(0);
        *count += 1;
        (ordinal, *count)
    }

    /// Stores a rendered footnote body until the end of the document.
    pub fn push_footnote(&mut self, identifier: &str, body: Vec<PresentationNode>) {
        self.footnote_bodies
            .entry(identifier.to_string())
            .or_insert(body);
    }

    /// Consumes the context, wrapping `children` in the root element and
    /// appending the footnote section when any footnote was referenced.
    pub fn finish(mut self, mut children: Vec<PresentationNode>) -> Element {
        let mut definitions = Vec::new();
        for (index, identifier) in self.footnote_order.iter().enumerate() {
            let Some(body) = self.footnote_bodies.remove(identifier) else {
                log::debug!("footnote [^{identifier}] is referenced but never defined");
                continue;
            };
            let number = index + 1;
            definitions.push(
                self.element(ElementKind::FootnoteDefinition)
                    .with_attribute("id", format!("{FOOTNOTE_PREFIX}{}", footnote_slug(identifier)))
                    .with_attribute("data-footnote-number", number.to_string())
                    .with_children(body)
                    .into(),
            );
        }
        for identifier in self.footnote_bodies.keys() {
            log::debug!("footnote [^{identifier}] is defined but never referenced");
        }
        if !definitions.is_empty() {
            children.push(
                self.element(ElementKind::FootnoteSection)
                    .with_attribute("data-footnotes", "")
                    .with_children(definitions)
                    .into(),
            );
        }

        Element::new(ElementKind::Root)
            .with_class(self.root_class())
            .with_children(children)
    }
}

/// Turns a footnote identifier into something usable in an `id` attribute.
pub fn footnote_slug(identifier: &str) -> String {
    identifier
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}
