//! HTML serialization of the presentation tree.
//!
//! Figures, placeholders and display formulas may sit inside a paragraph or
//! heading. There they are written with phrasing tags so an HTML parser keeps
//! the surrounding element intact.

use crate::renderer::{Diagnostic, RenderOutcome};
use crate::tree::{
    CodeBlock, Element, ElementKind, HighlightedLine, ImageNode, MathDisplay, MathNode,
    PresentationNode, RenderedDocument,
};
use html_escape::{encode_double_quoted_attribute, encode_text};

/// Serializes a rendered document.
pub fn to_html(document: &RenderedDocument) -> String {
    let mut out = String::with_capacity(4096);
    write_element(&document.root, false, &mut out);
    out
}

/// Serializes a diagnostic as a message box.
pub fn diagnostic_to_html(diagnostic: &Diagnostic) -> String {
    let mut out = String::new();
    out.push_str("<div");
    push_attr(&mut out, "class", diagnostic.class.as_deref());
    push_attr(&mut out, "role", Some("status"));
    out.push('>');
    out.push_str(&encode_text(&diagnostic.message));
    out.push_str("</div>");
    out
}

/// Serializes whichever side of the outcome is present.
pub fn outcome_to_html(outcome: &RenderOutcome) -> String {
    match outcome {
        RenderOutcome::Rendered { document } => to_html(document),
        RenderOutcome::Rejected { diagnostic } => diagnostic_to_html(diagnostic),
    }
}

/// Serializes a single node into `out`, as if it stood in flow content.
pub fn write_node(node: &PresentationNode, out: &mut String) {
    write_node_in(node, false, out);
}

fn write_node_in(node: &PresentationNode, phrasing: bool, out: &mut String) {
    match node {
        PresentationNode::Element(element) => write_element(element, phrasing, out),
        PresentationNode::Text { value } => out.push_str(&encode_text(value)),
        PresentationNode::Math(math) => write_math(math, phrasing, out),
        PresentationNode::Code(code) => write_code(code, out),
        PresentationNode::Image(image) => write_image(image, phrasing, out),
    }
}

fn tag_for(kind: ElementKind, phrasing: bool) -> &'static str {
    if phrasing { kind.phrasing_tag() } else { kind.tag() }
}

fn push_attr(out: &mut String, name: &str, value: Option<&str>) {
    let Some(value) = value else {
        return;
    };
    out.push(' ');
    out.push_str(name);
    if !value.is_empty() {
        out.push_str("=\"");
        out.push_str(&encode_double_quoted_attribute(value));
        out.push('"');
    }
}

fn write_element(element: &Element, phrasing: bool, out: &mut String) {
    let tag = tag_for(element.kind, phrasing);
    out.push('<');
    out.push_str(tag);
    push_attr(out, "class", element.class.as_deref());
    for (name, value) in &element.attributes {
        push_attr(out, name, Some(value));
    }

    if element.kind.is_void() {
        out.push_str(" />");
        return;
    }
    out.push('>');
    let phrasing = phrasing || element.kind.holds_phrasing_only();
    for child in &element.children {
        write_node_in(child, phrasing, out);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_math(math: &MathNode, phrasing: bool, out: &mut String) {
    let (tag, display) = match math.display {
        MathDisplay::Inline => (ElementKind::InlineMath.tag(), None),
        MathDisplay::Block => (tag_for(ElementKind::DisplayMath, phrasing), Some("block")),
    };
    out.push('<');
    out.push_str(tag);
    push_attr(out, "class", math.class.as_deref());
    push_attr(out, "data-display", display);
    push_attr(out, "data-tex", Some(&math.tex));
    out.push('>');
    match &math.markup {
        Some(markup) => out.push_str(markup),
        None => out.push_str(&encode_text(&math.tex)),
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_code(code: &CodeBlock, out: &mut String) {
    out.push_str("<pre");
    push_attr(out, "class", code.class.as_deref());
    out.push_str("><code");
    push_attr(out, "class", code.code_class.as_deref());
    out.push('>');
    match &code.lines {
        Some(lines) => write_highlighted(lines, out),
        None => out.push_str(&encode_text(&code.code)),
    }
    out.push_str("</code></pre>");
}

fn write_highlighted(lines: &[HighlightedLine], out: &mut String) {
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for span in &line.spans {
            out.push_str("<span style=\"color:");
            out.push_str(&encode_double_quoted_attribute(&span.color));
            if span.bold {
                out.push_str(";font-weight:bold");
            }
            if span.italic {
                out.push_str(";font-style:italic");
            }
            if span.underline {
                out.push_str(";text-decoration:underline");
            }
            out.push_str("\">");
            out.push_str(&encode_text(&span.text));
            out.push_str("</span>");
        }
    }
}

fn write_image(image: &ImageNode, phrasing: bool, out: &mut String) {
    let tag = tag_for(ElementKind::Figure, phrasing);
    out.push('<');
    out.push_str(tag);
    push_attr(out, "class", image.figure_class.as_deref());
    if phrasing {
        push_attr(out, "role", Some("figure"));
    }
    out.push_str("><img");
    push_attr(out, "class", image.class.as_deref());
    push_attr(out, "src", Some(&image.src));
    out.push_str(" alt=\"");
    out.push_str(&encode_double_quoted_attribute(&image.alt));
    out.push('"');
    push_attr(out, "title", image.title.as_deref());
    if image.lazy {
        push_attr(out, "loading", Some("lazy"));
    }
    out.push_str(" />");
    if let Some(caption) = &image.caption {
        write_element(caption, phrasing, out);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}
