//! Rendering functions for the mdast walk.

use super::context::{Context, FOOTNOTE_PREFIX, FOOTNOTE_REF_PREFIX, footnote_slug};
use super::types::Scope;
use crate::tree::{ElementKind, MathDisplay, PresentationNode};
use crate::url::is_safe_url;
use markdown::mdast::{self, AlignKind, Node, ReferenceKind};
use taskview_core::math::{Segment, extract_math_segments};

/// Renders `nodes` into a fresh list of presentation nodes.
pub fn render_children(nodes: &[Node], ctx: &mut Context) -> Vec<PresentationNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        render_node(node, ctx, &mut out);
    }
    out
}

/// Splits a text run into literal text and formulas.
fn render_text(value: &str, ctx: &mut Context, out: &mut Vec<PresentationNode>) {
    for segment in extract_math_segments(value) {
        match segment {
            Segment::Text(text) => out.push(PresentationNode::text(text)),
            Segment::InlineMath(tex) => out.push(ctx.math(tex, MathDisplay::Inline)),
            Segment::BlockMath(tex) => out.push(ctx.math(tex, MathDisplay::Block)),
        }
    }
}

/// Renders a paragraph, without a wrapper in tight lists.
fn render_paragraph(para: &mdast::Paragraph, ctx: &mut Context, out: &mut Vec<PresentationNode>) {
    if ctx.is_in_tight_list() {
        for child in &para.children {
            render_node(child, ctx, out);
        }
        return;
    }

    ctx.enter(Scope::Paragraph);
    let children = render_children(&para.children, ctx);
    ctx.exit();
    out.push(ctx.element(ElementKind::Paragraph).with_children(children).into());
}

/// Wraps rendered children in an element of `kind`.
fn render_wrapped(kind: ElementKind, children: &[Node], ctx: &mut Context, out: &mut Vec<PresentationNode>) {
    let children = render_children(children, ctx);
    out.push(ctx.element(kind).with_children(children).into());
}

fn render_list(list: &mdast::List, ctx: &mut Context, out: &mut Vec<PresentationNode>) {
    let kind = if list.ordered {
        ElementKind::OrderedList
    } else {
        ElementKind::UnorderedList
    };
    let mut element = ctx.element(kind);
    if list.ordered
        && let Some(start) = list.start
        && start != 1
    {
        element = element.with_attribute("start", start.to_string());
    }

    ctx.enter(Scope::List {
        spread: list.spread,
    });
    let children = render_children(&list.children, ctx);
    ctx.exit();
    out.push(element.with_children(children).into());
}

/// Renders a list item; GFM task items start with a disabled checkbox.
fn render_list_item(item: &mdast::ListItem, ctx: &mut Context, out: &mut Vec<PresentationNode>) {
    let mut children = Vec::new();
    let mut element = ctx.element(ElementKind::ListItem);

    if let Some(checked) = item.checked {
        element = element.with_attribute("data-task", if checked { "done" } else { "open" });
        let mut checkbox = ctx
            .element(ElementKind::TaskCheckbox)
            .with_attribute("type", "checkbox")
            .with_attribute("disabled", "");
        if checked {
            checkbox = checkbox.with_attribute("checked", "");
        }
        children.push(checkbox.into());
    }

    for child in &item.children {
        render_node(child, ctx, &mut children);
    }
    out.push(element.with_children(children).into());
}

fn align_value(align: Option<&AlignKind>) -> Option<&'static str> {
    match align? {
        AlignKind::Left => Some("left"),
        AlignKind::Right => Some("right"),
        AlignKind::Center => Some("center"),
        AlignKind::None => None,
    }
}

fn render_table_row(
    row: &mdast::TableRow,
    ctx: &mut Context,
    is_header: bool,
    aligns: &[AlignKind],
) -> PresentationNode {
    let cell_kind = if is_header {
        ElementKind::TableHeaderCell
    } else {
        ElementKind::TableCell
    };

    let mut cells = Vec::with_capacity(row.children.len());
    for (i, cell) in row.children.iter().enumerate() {
        let Node::TableCell(cell) = cell else {
            continue;
        };
        let mut element = ctx.element(cell_kind);
        if let Some(align) = align_value(aligns.get(i)) {
            element = element.with_attribute("align", align);
        }
        let children = render_children(&cell.children, ctx);
        cells.push(element.with_children(children).into());
    }

    ctx.element(ElementKind::TableRow).with_children(cells).into()
}

/// Renders a table inside a scroll wrapper, header row first.
fn render_table(table: &mdast::Table, ctx: &mut Context, out: &mut Vec<PresentationNode>) {
    ctx.enter(Scope::Table);

    let mut sections = Vec::with_capacity(2);
    if let Some(Node::TableRow(row)) = table.children.first() {
        let header = render_table_row(row, ctx, true, &table.align);
        sections.push(ctx.element(ElementKind::TableHead).with_children(vec![header]).into());
    }
    if table.children.len() > 1 {
        let mut rows = Vec::with_capacity(table.children.len() - 1);
        for row in table.children.iter().skip(1) {
            if let Node::TableRow(row) = row {
                rows.push(render_table_row(row, ctx, false, &table.align));
            }
        }
        sections.push(ctx.element(ElementKind::TableBody).with_children(rows).into());
    }

    ctx.exit();

    let table = ctx.element(ElementKind::Table).with_children(sections);
    out.push(
        ctx.element(ElementKind::TableWrapper)
            .with_children(vec![table.into()])
            .into(),
    );
}

/// Renders a link that opens in a new browsing context.
///
/// A link nested inside another link, or one whose destination has a refused
/// scheme, renders its content only.
fn render_link(
    url: &str,
    title: Option<&str>,
    children: &[Node],
    ctx: &mut Context,
    out: &mut Vec<PresentationNode>,
) {
    let refused = !is_safe_url(url);
    if refused {
        log::debug!("link destination with refused scheme rendered as text: {url}");
    }
    if refused || ctx.is_in_link() {
        for child in children {
            render_node(child, ctx, out);
        }
        return;
    }

    let mut element = ctx
        .element(ElementKind::Link)
        .with_attribute("href", url)
        .with_attribute("target", "_blank")
        .with_attribute("rel", "noopener noreferrer");
    if let Some(title) = title {
        element = element.with_attribute("title", title);
    }

    ctx.enter(Scope::Link);
    let children = render_children(children, ctx);
    ctx.exit();
    out.push(element.with_children(children).into());
}

/// The source form of an unresolved reference's closing part.
fn reference_suffix(kind: &ReferenceKind, label: Option<&str>, identifier: &str) -> String {
    match kind {
        ReferenceKind::Shortcut => "]".to_string(),
        ReferenceKind::Collapsed => "][]".to_string(),
        ReferenceKind::Full => format!("][{}]", label.unwrap_or(identifier)),
    }
}

fn render_link_reference(
    reference: &mdast::LinkReference,
    ctx: &mut Context,
    out: &mut Vec<PresentationNode>,
) {
    if let Some(target) = ctx.definition(&reference.identifier).cloned() {
        render_link(
            &target.url,
            target.title.as_deref(),
            &reference.children,
            ctx,
            out,
        );
        return;
    }

    log::debug!("unresolved link reference [{}]", reference.identifier);
    out.push(PresentationNode::text("["));
    for child in &reference.children {
        render_node(child, ctx, out);
    }
    out.push(PresentationNode::text(reference_suffix(
        &reference.reference_kind,
        reference.label.as_deref(),
        &reference.identifier,
    )));
}

fn render_image_reference(
    reference: &mdast::ImageReference,
    ctx: &mut Context,
    out: &mut Vec<PresentationNode>,
) {
    match ctx.definition(&reference.identifier) {
        Some(target) => {
            out.push(ctx.image(&target.url, &reference.alt, target.title.as_deref()));
        }
        None => {
            log::debug!("unresolved image reference [{}]", reference.identifier);
            out.push(PresentationNode::text(format!(
                "![{}{}",
                reference.alt,
                reference_suffix(
                    &reference.reference_kind,
                    reference.label.as_deref(),
                    &reference.identifier,
                )
            )));
        }
    }
}

/// Renders a footnote call as a numbered in-page link.
///
/// Repeated references get suffixed ids (`user-content-fnref-x`,
/// `user-content-fnref-x-2`, ...), matching GitHub's footnote anchors.
fn render_footnote_reference(
    reference: &mdast::FootnoteReference,
    ctx: &mut Context,
    out: &mut Vec<PresentationNode>,
) {
    let slug = footnote_slug(&reference.identifier);
    let (ordinal, count) = ctx.reference_footnote(&reference.identifier);
    let id = if count == 1 {
        format!("{FOOTNOTE_REF_PREFIX}{slug}")
    } else {
        format!("{FOOTNOTE_REF_PREFIX}{slug}-{count}")
    };

    out.push(
        ctx.element(ElementKind::FootnoteReference)
            .with_attribute("href", format!("#{FOOTNOTE_PREFIX}{slug}"))
            .with_attribute("id", id)
            .with_attribute("data-footnote-ref", "")
            .with_children(vec![PresentationNode::text(ordinal.to_string())])
            .into(),
    );
}

/// Renders raw HTML as literal text; markup is never passed through.
fn render_html(html: &mdast::Html, out: &mut Vec<PresentationNode>) {
    log::debug!("raw HTML in markdown rendered as text: {}", html.value);
    out.push(PresentationNode::text(&html.value));
}

/// Recursively renders an AST node, appending the result to `out`.
pub fn render_node(node: &Node, ctx: &mut Context, out: &mut Vec<PresentationNode>) {
    match node {
        Node::Root(root) => {
            for child in &root.children {
                render_node(child, ctx, out);
            }
        }
        Node::Text(text) => render_text(&text.value, ctx, out),
        Node::Paragraph(para) => render_paragraph(para, ctx, out),
        Node::Heading(heading) => {
            render_wrapped(ElementKind::heading(heading.depth), &heading.children, ctx, out)
        }
        Node::Strong(strong) => render_wrapped(ElementKind::Strong, &strong.children, ctx, out),
        Node::Emphasis(emphasis) => {
            render_wrapped(ElementKind::Emphasis, &emphasis.children, ctx, out)
        }
        Node::Delete(delete) => {
            render_wrapped(ElementKind::Strikethrough, &delete.children, ctx, out)
        }
        Node::InlineCode(code) => out.push(
            ctx.element(ElementKind::InlineCode)
                .with_children(vec![PresentationNode::text(&code.value)])
                .into(),
        ),
        Node::Code(code) => out.push(ctx.code_block(&code.value, code.lang.as_deref())),
        Node::Blockquote(quote) => {
            ctx.enter(Scope::Blockquote);
            render_wrapped(ElementKind::Blockquote, &quote.children, ctx, out);
            ctx.exit();
        }
        Node::List(list) => render_list(list, ctx, out),
        Node::ListItem(item) => render_list_item(item, ctx, out),
        Node::Table(table) => render_table(table, ctx, out),
        Node::TableRow(_) | Node::TableCell(_) => {}
        Node::Link(link) => render_link(&link.url, link.title.as_deref(), &link.children, ctx, out),
        Node::LinkReference(reference) => render_link_reference(reference, ctx, out),
        Node::Image(image) => out.push(ctx.image(&image.url, &image.alt, image.title.as_deref())),
        Node::ImageReference(reference) => render_image_reference(reference, ctx, out),
        Node::Break(_) => out.push(ctx.element(ElementKind::LineBreak).into()),
        Node::ThematicBreak(_) => out.push(ctx.element(ElementKind::ThematicBreak).into()),
        Node::Html(html) => render_html(html, out),
        Node::Math(math) => out.push(ctx.math(&math.value, MathDisplay::Block)),
        Node::InlineMath(math) => out.push(ctx.math(&math.value, MathDisplay::Inline)),
        Node::FootnoteReference(reference) => render_footnote_reference(reference, ctx, out),
        Node::FootnoteDefinition(definition) => {
            let body = render_children(&definition.children, ctx);
            ctx.push_footnote(&definition.identifier, body);
        }
        // Collected before the walk.
        Node::Definition(_) => {}
        Node::Yaml(_) | Node::Toml(_) => {
            log::debug!("frontmatter block skipped");
        }
        _ => {
            log::warn!("Unhandled markdown node type: {:?}", node);
        }
    }
}
