//! MDAST-based renderer producing a presentation tree.
//!
//! # Module Structure
//!
//! - `types` - scope stack entries and link targets
//! - `context` - state carried through one walk
//! - `render` - per-node rendering functions

mod context;
mod render;
mod types;

pub use context::Context;
pub use render::{render_children, render_node};
pub use types::{LinkTarget, Scope};

use crate::highlight::{CodeHighlighter, SyntectHighlighter};
use crate::options::RenderOptions;
use crate::style::StyleSheet;
use crate::tree::{ElementKind, RenderedDocument};
use crate::typeset::{ClientSideMath, MathTypesetter};
use markdown::mdast::Node;
use serde::Serialize;
use taskview_core::{
    ParserPipeline, Rejection, SourceLocation, TaskviewError, ValidationResult, normalize, validate,
};

/// Shown when the parser or renderer fails on content that passed validation.
pub const RENDER_FAILED_MESSAGE: &str = "content could not be rendered";

/// Why a document was not rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// No content, or empty content.
    Missing,
    /// Unsafe markup found outside code.
    Unsafe,
    /// Parsing failed.
    RenderFailed,
}

/// A short message shown in place of a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// What went wrong.
    pub kind: DiagnosticKind,
    /// User-facing message.
    pub message: String,
    /// Where in the content the problem starts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    /// Technical detail for logs and tooltips.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Style class of the message box.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

impl Diagnostic {
    fn rejected(rejection: Rejection, class: Option<String>) -> Self {
        match rejection {
            Rejection::Missing => Self {
                kind: DiagnosticKind::Missing,
                message: rejection.reason().to_string(),
                location: None,
                detail: None,
                class,
            },
            Rejection::Unsafe { pattern, location } => Self {
                kind: DiagnosticKind::Unsafe,
                message: taskview_core::UNSAFE_CONTENT_REASON.to_string(),
                detail: Some(pattern.description().to_string()),
                location: Some(location),
                class,
            },
        }
    }

    fn failed(err: TaskviewError, class: Option<String>) -> Self {
        let location = match &err {
            TaskviewError::MarkdownAdapter { location, .. } => Some(location.clone()),
            _ => None,
        };
        Self {
            kind: DiagnosticKind::RenderFailed,
            message: RENDER_FAILED_MESSAGE.to_string(),
            location,
            detail: Some(err.to_string()),
            class,
        }
    }
}

/// Result of rendering one piece of content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RenderOutcome {
    /// The content was rendered.
    Rendered {
        /// The presentation tree.
        document: RenderedDocument,
    },
    /// The content was refused or could not be rendered.
    Rejected {
        /// What to show instead.
        diagnostic: Diagnostic,
    },
}

impl RenderOutcome {
    /// The document, when rendering succeeded.
    pub fn document(&self) -> Option<&RenderedDocument> {
        match self {
            RenderOutcome::Rendered { document } => Some(document),
            RenderOutcome::Rejected { .. } => None,
        }
    }

    /// The diagnostic, when rendering was refused.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            RenderOutcome::Rendered { .. } => None,
            RenderOutcome::Rejected { diagnostic } => Some(diagnostic),
        }
    }

    /// Whether a document was produced.
    pub fn is_rendered(&self) -> bool {
        matches!(self, RenderOutcome::Rendered { .. })
    }
}

/// Validates, normalizes, parses and renders exercise notes.
///
/// The syntax and theme sets are loaded once when the renderer is built;
/// keep the renderer around and call [`Renderer::render`] per document.
pub struct Renderer {
    options: RenderOptions,
    styles: StyleSheet,
    pipeline: ParserPipeline,
    highlighter: Option<Box<dyn CodeHighlighter>>,
    typesetter: Box<dyn MathTypesetter>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

impl Renderer {
    /// Builds a renderer; loads the syntect highlighter when highlighting is on.
    pub fn new(options: RenderOptions) -> Self {
        let mut pipeline = ParserPipeline::new(options.parse_options());
        pipeline.add_text_transform(normalize);

        let highlighter: Option<Box<dyn CodeHighlighter>> = if options.highlight_code {
            Some(Box::new(SyntectHighlighter::new()))
        } else {
            None
        };

        Self {
            styles: options.stylesheet(),
            options,
            pipeline,
            highlighter,
            typesetter: Box::new(ClientSideMath),
        }
    }

    /// Replaces the code highlighter.
    pub fn with_highlighter(mut self, highlighter: impl CodeHighlighter + 'static) -> Self {
        self.highlighter = Some(Box::new(highlighter));
        self
    }

    /// Replaces the math typesetter.
    pub fn with_typesetter(mut self, typesetter: impl MathTypesetter + 'static) -> Self {
        self.typesetter = Box::new(typesetter);
        self
    }

    /// The options this renderer was built with.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// The effective stylesheet.
    pub fn stylesheet(&self) -> &StyleSheet {
        &self.styles
    }

    /// Renders `content`, or explains why it was not rendered.
    ///
    /// Absent, empty and unsafe content is refused before parsing. Parser
    /// failures become a diagnostic as well; this never panics on input.
    pub fn render(&self, content: Option<&str>) -> RenderOutcome {
        let class = self.styles.class_for(ElementKind::Diagnostic).map(str::to_string);

        let text = match (validate(content), content) {
            (ValidationResult::Valid, Some(text)) => text,
            (ValidationResult::Invalid(rejection), _) => {
                log::debug!("content refused: {}", rejection);
                return RenderOutcome::Rejected {
                    diagnostic: Diagnostic::rejected(rejection, class),
                };
            }
            (ValidationResult::Valid, None) => {
                return RenderOutcome::Rejected {
                    diagnostic: Diagnostic::rejected(Rejection::Missing, class),
                };
            }
        };

        match self.render_trusted(text) {
            Ok(document) => RenderOutcome::Rendered { document },
            Err(err) => {
                log::warn!("failed to render content: {err}");
                RenderOutcome::Rejected {
                    diagnostic: Diagnostic::failed(err, class),
                }
            }
        }
    }

    /// Normalizes, parses and renders `text` without validating it first.
    pub fn render_trusted(&self, text: &str) -> Result<RenderedDocument, TaskviewError> {
        let tree = self.pipeline.parse(text)?;
        Ok(self.render_mdast(&tree))
    }

    /// Renders an already parsed tree.
    pub fn render_mdast(&self, tree: &Node) -> RenderedDocument {
        let mut ctx = Context::new(
            &self.options,
            &self.styles,
            self.highlighter.as_deref(),
            self.typesetter.as_ref(),
        );
        ctx.collect_definitions(tree);
        let children = render_children(std::slice::from_ref(tree), &mut ctx);
        RenderedDocument::new(ctx.finish(children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{outcome_to_html, to_html};
    use crate::tree::{MathDisplay, PresentationNode};
    use insta::assert_snapshot;
    use taskview_core::MISSING_CONTENT_REASON;

    /// No highlighting, no lazy loading, no classes: compact HTML.
    fn bare() -> Renderer {
        let mut renderer = Renderer::new(RenderOptions {
            highlight_code: false,
            lazy_images: false,
            ..RenderOptions::default()
        });
        renderer.styles = StyleSheet::new();
        renderer
    }

    fn render_ok(renderer: &Renderer, input: &str) -> RenderedDocument {
        match renderer.render(Some(input)) {
            RenderOutcome::Rendered { document } => document,
            RenderOutcome::Rejected { diagnostic } => panic!("rejected: {diagnostic:?}"),
        }
    }

    fn html(input: &str) -> String {
        to_html(&render_ok(&bare(), input))
    }

    fn math_nodes(document: &RenderedDocument) -> Vec<(MathDisplay, String)> {
        let mut found = Vec::new();
        document.root.visit(&mut |node| {
            if let PresentationNode::Math(math) = node {
                found.push((math.display, math.tex.clone()));
            }
        });
        found
    }

    #[test]
    fn test_heading_and_paragraph() {
        assert_snapshot!(html("# Title\n\nHello *world*."), @"<div><h1>Title</h1><p>Hello <em>world</em>.</p></div>");
    }

    #[test]
    fn test_heading_levels_have_distinct_classes() {
        let renderer = Renderer::new(RenderOptions {
            highlight_code: false,
            ..RenderOptions::default()
        });
        let document = render_ok(&renderer, "# a\n## b\n### c\n#### d\n##### e\n###### f");
        let mut classes = Vec::new();
        for depth in 1..=6 {
            let headings = document.root.find_all(ElementKind::heading(depth));
            assert_eq!(headings.len(), 1, "one h{depth}");
            classes.push(headings[0].class.clone().unwrap());
        }
        classes.sort();
        classes.dedup();
        assert_eq!(classes.len(), 6);
    }

    #[test]
    fn test_link_opens_new_context() {
        assert_snapshot!(
            html("[site](https://example.com)"),
            @r#"<div><p><a href="https://example.com" rel="noopener noreferrer" target="_blank">site</a></p></div>"#
        );
    }

    #[test]
    fn test_reference_link_resolves_definition() {
        let out = html("See [the docs][docs].\n\n[docs]: https://example.com/docs \"Docs\"");
        assert!(out.contains(r#"href="https://example.com/docs""#));
        assert!(out.contains(r#"title="Docs""#));
        assert!(out.contains(">the docs</a>"));
    }

    #[test]
    fn test_tight_list_has_no_paragraphs() {
        assert_snapshot!(html("- a\n- b"), @"<div><ul><li>a</li><li>b</li></ul></div>");
    }

    #[test]
    fn test_loose_list_keeps_paragraphs() {
        assert_snapshot!(html("- a\n\n- b"), @"<div><ul><li><p>a</p></li><li><p>b</p></li></ul></div>");
    }

    #[test]
    fn test_ordered_list_start() {
        let out = html("3. a\n4. b");
        assert!(out.starts_with(r#"<div><ol start="3"><li>a</li>"#));
    }

    #[test]
    fn test_nested_list_is_preserved() {
        let document = render_ok(&bare(), "- outer\n  - inner");
        let lists = document.root.find_all(ElementKind::UnorderedList);
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[1].text(), "inner");
    }

    #[test]
    fn test_task_list_items() {
        let out = html("- [x] done\n- [ ] todo");
        assert!(out.contains(r#"<li data-task="done"><input checked disabled type="checkbox" />"#));
        assert!(out.contains(r#"<li data-task="open"><input disabled type="checkbox" />"#));
        assert!(out.contains("done</li>"));
    }

    #[test]
    fn test_table_with_alignment() {
        assert_snapshot!(
            html("| a | b |\n|:--|--:|\n| 1 | 2 |"),
            @r#"<div><div><table><thead><tr><th align="left">a</th><th align="right">b</th></tr></thead><tbody><tr><td align="left">1</td><td align="right">2</td></tr></tbody></table></div></div>"#
        );
    }

    #[test]
    fn test_blockquote_and_strikethrough() {
        assert_snapshot!(html("> ~~gone~~ kept"), @"<div><blockquote><p><del>gone</del> kept</p></blockquote></div>");
    }

    #[test]
    fn test_inline_code_is_monospace_not_math() {
        assert_snapshot!(html("Use `$x$` literally"), @"<div><p>Use <code>$x$</code> literally</p></div>");
    }

    #[test]
    fn test_inline_math_in_text() {
        assert_snapshot!(
            html("Area $x^2$ here"),
            @r#"<div><p>Area <span data-tex="x^2">x^2</span> here</p></div>"#
        );
    }

    #[test]
    fn test_block_math_from_text() {
        let document = render_ok(&bare(), "Block:\n$$\\int f$$");
        assert_eq!(
            math_nodes(&document),
            vec![(MathDisplay::Block, "\\int f".to_string())]
        );
    }

    #[test]
    fn test_unterminated_math_is_literal() {
        assert_snapshot!(html("costs $5 today"), @"<div><p>costs $5 today</p></div>");
    }

    #[test]
    fn test_parser_math_yields_same_nodes() {
        let renderer = Renderer::new(RenderOptions {
            highlight_code: false,
            parser_math: true,
            ..RenderOptions::default()
        });
        let document = render_ok(&renderer, "Inline $y$ here.\n\n$$\nx\n$$");
        assert_eq!(
            math_nodes(&document),
            vec![
                (MathDisplay::Inline, "y".to_string()),
                (MathDisplay::Block, "x".to_string()),
            ]
        );
    }

    #[test]
    fn test_custom_typesetter() {
        let renderer = bare().with_typesetter(|tex: &str, _display: MathDisplay| {
            Some(format!("<m>{tex}</m>"))
        });
        let out = to_html(&render_ok(&renderer, "$x$"));
        assert!(out.contains(r#"<span data-tex="x"><m>x</m></span>"#));
    }

    #[test]
    fn test_code_without_language_is_plain() {
        assert_snapshot!(html("```\nx < 1\n```"), @"<div><pre><code>x &lt; 1</code></pre></div>");
    }

    #[test]
    fn test_unknown_language_is_plain_block() {
        let renderer = Renderer::default();
        let document = render_ok(&renderer, "```nolang\nx = 1\n```");
        let out = to_html(&document);
        assert!(out.contains(r#"<code class="language-nolang">x = 1</code>"#));
    }

    #[test]
    fn test_known_language_is_highlighted() {
        let renderer = Renderer::default();
        let out = to_html(&render_ok(&renderer, "```python\ndef f():\n    return 1\n```"));
        assert!(out.contains(r#"<code class="language-python"><span style="color:#"#));
        assert!(out.contains("return"));
    }

    #[test]
    fn test_display_mode_changes_highlighting() {
        let source = "```rust\nfn main() {}\n```";
        let light = to_html(&render_ok(&Renderer::default(), source));
        let dark = to_html(&render_ok(
            &Renderer::new(RenderOptions {
                display_mode: crate::DisplayMode::Dark,
                ..RenderOptions::default()
            }),
            source,
        ));
        assert_ne!(light, dark);
    }

    #[test]
    fn test_image_figure_and_failure() {
        let document = render_ok(&bare(), "Before ![Graph](img/g.png) after");
        assert_snapshot!(
            to_html(&document),
            @r#"<div><p>Before <span role="figure"><img src="img/g.png" alt="Graph" /><span>Graph</span></span> after</p></div>"#
        );

        let failed = document.with_failed_image("img/g.png");
        assert_snapshot!(
            to_html(&failed),
            @r#"<div><p>Before <span data-src="img/g.png"><span>Image not loaded: Graph</span><span>Path: img/g.png</span></span> after</p></div>"#
        );
    }

    #[test]
    fn test_image_and_display_math_keep_paragraph_whole() {
        assert_snapshot!(
            html("Before ![G](g.png) after and $$x$$ end"),
            @r#"<div><p>Before <span role="figure"><img src="g.png" alt="G" /><span>G</span></span> after and <span data-display="block" data-tex="x">x</span> end</p></div>"#
        );
    }

    #[test]
    fn test_repeated_footnote_references_get_suffixed_ids() {
        let out = html("One[^n] two[^n]\n\n[^n]: Note.");
        assert!(out.contains(r#"id="user-content-fnref-n""#));
        assert!(out.contains(r#"id="user-content-fnref-n-2""#));
    }

    #[test]
    fn test_blockquote_in_tight_list_keeps_paragraph() {
        assert_snapshot!(
            html("- > quote\n- plain"),
            @"<div><ul><li><blockquote><p>quote</p></blockquote></li><li>plain</li></ul></div>"
        );
    }

    #[test]
    fn test_entity_encoded_javascript_link_is_text() {
        for source in ["[click](javascript&#58;alert(1))", "[click](&#x6A;avascript:alert(1))"] {
            let document = render_ok(&bare(), source);
            assert!(document.root.find_all(ElementKind::Link).is_empty(), "{source}");
            let out = to_html(&document);
            assert!(!out.contains("href"), "{out}");
            assert_eq!(document.text(), "click");
        }
    }

    #[test]
    fn test_javascript_link_hidden_behind_autolink_backtick_is_text() {
        let document = render_ok(&bare(), "<http://x.com/`> [y](javascript:alert(1)) `");
        let hrefs: Vec<_> = document
            .root
            .find_all(ElementKind::Link)
            .into_iter()
            .filter_map(|link| link.attribute("href"))
            .collect();
        assert_eq!(hrefs.len(), 1);
        assert!(hrefs[0].starts_with("http://x.com/"));
        assert!(!to_html(&document).contains("javascript:alert"));
    }

    #[test]
    fn test_refused_reference_definition_is_text() {
        let document = render_ok(&bare(), "[go][t]\n\n[t]: javascript&#58;alert(1)");
        assert!(document.root.find_all(ElementKind::Link).is_empty());
        assert_eq!(document.text(), "go");
    }

    #[test]
    fn test_refused_image_source_becomes_placeholder() {
        let document = render_ok(&bare(), "![pic](javascript&#58;alert(1)) and text");
        assert!(document.images().is_empty());
        let out = to_html(&document);
        assert!(!out.contains("src="));
        assert!(!out.contains("data-src"));
        assert!(document.text().contains("Image not loaded: pic"));
        assert!(document.text().contains("and text"));
    }

    #[test]
    fn test_image_without_alt_uses_generic_label() {
        let document = render_ok(&bare(), "![](a.png)").with_failed_image("a.png");
        assert!(document.text().contains("Image not loaded: image"));
    }

    #[test]
    fn test_lazy_images_by_default() {
        let renderer = Renderer::new(RenderOptions {
            highlight_code: false,
            ..RenderOptions::default()
        });
        let out = to_html(&render_ok(&renderer, "![x](x.png)"));
        assert!(out.contains(r#"loading="lazy""#));
    }

    #[test]
    fn test_footnotes_collect_at_end() {
        let out = html("Claim[^src].\n\n[^src]: Source text.");
        assert!(out.contains(
            r##"<a data-footnote-ref href="#user-content-fn-src" id="user-content-fnref-src">1</a>"##
        ));
        assert!(out.contains(
            r#"<section data-footnotes><div data-footnote-number="1" id="user-content-fn-src">"#
        ));
        assert!(out.ends_with("Source text.</p></div></section></div>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let out = html("a <b>bold</b> claim");
        assert!(out.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(!out.contains("<b>"));
    }

    #[test]
    fn test_scope_class_on_root() {
        let renderer = Renderer::new(RenderOptions {
            highlight_code: false,
            scope_class: Some("exercise-note".into()),
            ..RenderOptions::default()
        });
        let document = render_ok(&renderer, "text");
        let class = document.root.class.as_deref().unwrap();
        assert!(class.split(' ').any(|c| c == "exercise-note"));
        assert!(class.split(' ').any(|c| c == "prose"));
    }

    #[test]
    fn test_content_is_normalized_before_parsing() {
        assert_eq!(html("A\r\n\r\n\r\n\r\nB"), html("A\n\nB"));
    }

    #[test]
    fn test_absent_content_is_rejected() {
        for input in [None, Some("")] {
            let outcome = bare().render(input);
            let diagnostic = outcome.diagnostic().unwrap();
            assert_eq!(diagnostic.kind, DiagnosticKind::Missing);
            assert_eq!(diagnostic.message, MISSING_CONTENT_REASON);
        }
    }

    #[test]
    fn test_unsafe_content_is_rejected_with_location() {
        let outcome = bare().render(Some("# T\n\n<script>alert(1)</script>"));
        let diagnostic = outcome.diagnostic().unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::Unsafe);
        assert_eq!(diagnostic.location, Some(SourceLocation::new(3, 1)));
        assert_snapshot!(outcome_to_html(&outcome), @r#"<div role="status">potentially dangerous content detected</div>"#);
    }

    #[test]
    fn test_script_in_fence_renders_as_code() {
        let out = html("```html\n<script>alert(1)</script>\n```");
        assert!(out.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn test_parse_failure_becomes_diagnostic() {
        let diagnostic = Diagnostic::failed(TaskviewError::parse_error("boom", 2, 3), None);
        assert_eq!(diagnostic.kind, DiagnosticKind::RenderFailed);
        assert_eq!(diagnostic.message, RENDER_FAILED_MESSAGE);
        assert_eq!(diagnostic.location, Some(SourceLocation::new(2, 3)));
        assert!(diagnostic.detail.unwrap().contains("boom"));
    }

    #[test]
    fn test_outcome_json_shape() {
        let outcome = bare().render(Some("hi"));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "rendered");
        assert_eq!(json["document"]["root"]["kind"], "root");
        assert_eq!(json["document"]["root"]["children"][0]["kind"], "paragraph");

        let rejected = serde_json::to_value(bare().render(None)).unwrap();
        assert_eq!(rejected["status"], "rejected");
        assert_eq!(rejected["diagnostic"]["kind"], "missing");
    }
}
