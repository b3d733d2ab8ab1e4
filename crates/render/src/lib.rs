#![deny(missing_docs)]
//! taskview renderer: turns exercise notes into a styled presentation tree
//! and serializes it to HTML.
//!
//! ```
//! use taskview_render::{RenderOptions, Renderer, to_html};
//!
//! let renderer = Renderer::new(RenderOptions { highlight_code: false, ..RenderOptions::default() });
//! let outcome = renderer.render(Some("# Task\n\nArea is $\\pi r^2$."));
//! let document = outcome.document().unwrap();
//! assert!(to_html(document).contains("data-tex=\"\\pi r^2\""));
//! ```

/// Code highlighting.
pub mod highlight;
/// HTML serialization.
pub mod html;
/// Rendering configuration.
pub mod options;
/// The mdast walk and its entry point.
pub mod renderer;
/// Style class lookup.
pub mod style;
/// Presentation tree types.
pub mod tree;
/// Formula typesetting hook.
pub mod typeset;
/// Destination URL checks.
pub mod url;

pub use highlight::{CodeHighlighter, SyntectHighlighter};
pub use html::{diagnostic_to_html, outcome_to_html, to_html};
pub use options::{DisplayMode, RenderOptions};
pub use renderer::{Diagnostic, DiagnosticKind, RENDER_FAILED_MESSAGE, RenderOutcome, Renderer};
pub use style::StyleSheet;
pub use tree::{
    CodeBlock, Element, ElementKind, HighlightedLine, HighlightedSpan, ImageNode, MathDisplay,
    MathNode, PresentationNode, RenderedDocument,
};
pub use typeset::{ClientSideMath, MathTypesetter};
pub use url::is_safe_url;

/// Renders `content` with a one-off renderer.
///
/// Building a renderer loads the highlighting sets; reuse a [`Renderer`]
/// when rendering more than one document.
pub fn render_document(content: Option<&str>, options: &RenderOptions) -> RenderOutcome {
    Renderer::new(options.clone()).render(content)
}
