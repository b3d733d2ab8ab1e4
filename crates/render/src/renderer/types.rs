//! Type definitions for the mdast walk.

/// Where in the document the walk currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Document root.
    Root,
    /// Inside a paragraph.
    Paragraph,
    /// Inside a list; `spread` is false for tight lists.
    List {
        /// Whether the list is loose.
        spread: bool,
    },
    /// Inside a block quotation; hides any enclosing list.
    Blockquote,
    /// Inside a table.
    Table,
    /// Inside a link.
    Link,
}

/// Destination of a link definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    /// Destination URL.
    pub url: String,
    /// Optional title.
    pub title: Option<String>,
}
