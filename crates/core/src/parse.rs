//! Markdown parsing utilities.

use crate::{SourceLocation, TaskviewError};
use markdown::mdast::Node;
use markdown::message::{Message, Place};
use std::borrow::Cow;

/// Parser options for building markdown-rs parse options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Enable GitHub Flavored Markdown constructs (tables, task lists, footnotes).
    pub gfm: bool,
    /// Enable indented code blocks.
    pub code_indented: bool,
    /// Allow raw HTML nodes in the AST.
    pub raw_html: bool,
    /// Let the parser recognize `$inline$` and `$$block$$` math.
    ///
    /// When off, dollar-delimited math stays in text nodes and is picked up by
    /// the segment extractor at render time.
    pub math: bool,
}

impl ParseOptions {
    /// Defaults for exercise notes: GFM on, raw HTML and parser math off.
    pub const fn exercise_notes() -> Self {
        Self {
            gfm: true,
            code_indented: true,
            raw_html: false,
            math: false,
        }
    }

    /// Convert to markdown-rs `ParseOptions`.
    pub fn to_markdown(self) -> markdown::ParseOptions {
        let mut constructs = markdown::Constructs {
            code_indented: self.code_indented,
            html_flow: self.raw_html,
            html_text: self.raw_html,
            ..Default::default()
        };

        if self.gfm {
            constructs.gfm_autolink_literal = true;
            constructs.gfm_footnote_definition = true;
            constructs.gfm_label_start_footnote = true;
            constructs.gfm_strikethrough = true;
            constructs.gfm_table = true;
            constructs.gfm_task_list_item = true;
        }

        if self.math {
            constructs.math_flow = true;
            constructs.math_text = true;
        }

        markdown::ParseOptions {
            constructs,
            math_text_single_dollar: self.math,
            ..markdown::ParseOptions::default()
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::exercise_notes()
    }
}

/// Trait for preprocessing raw markdown text before parsing.
pub trait TextTransform {
    /// Transform the input markdown text, returning an owned or borrowed string.
    fn transform<'a>(&self, input: &'a str) -> Cow<'a, str>;
}

impl<F> TextTransform for F
where
    F: for<'a> Fn(&'a str) -> Cow<'a, str>,
{
    fn transform<'a>(&self, input: &'a str) -> Cow<'a, str> {
        (self)(input)
    }
}

/// Parsing pipeline: text transforms run in order, then markdown-rs parses the result.
pub struct ParserPipeline {
    options: markdown::ParseOptions,
    text_transforms: Vec<Box<dyn TextTransform + Send + Sync>>,
}

impl ParserPipeline {
    /// Create a new pipeline from core parse options.
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options: options.to_markdown(),
            text_transforms: Vec::new(),
        }
    }

    /// Add a text preprocessor transform.
    pub fn add_text_transform<T: TextTransform + Send + Sync + 'static>(&mut self, transform: T) {
        self.text_transforms.push(Box::new(transform));
    }

    /// Runs the text transforms only, returning the text the parser would see.
    pub fn preprocess<'a>(&self, input: &'a str) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(input);
        for transform in &self.text_transforms {
            current = match current {
                Cow::Borrowed(text) => transform.transform(text),
                Cow::Owned(text) => Cow::Owned(transform.transform(&text).into_owned()),
            };
        }
        current
    }

    /// Parse markdown into MDAST using the configured pipeline.
    pub fn parse(&self, input: &str) -> Result<Node, TaskviewError> {
        let text = self.preprocess(input);
        parse_mdast_with_options(&text, &self.options)
    }
}

/// Parse markdown into an MDAST tree using core options.
pub fn parse_mdast(input: &str, options: &ParseOptions) -> Result<Node, TaskviewError> {
    parse_mdast_with_options(input, &options.to_markdown())
}

/// Parse markdown into an MDAST tree using markdown-rs `ParseOptions`.
pub fn parse_mdast_with_options(
    input: &str,
    options: &markdown::ParseOptions,
) -> Result<Node, TaskviewError> {
    markdown::to_mdast(input, options).map_err(|err| TaskviewError::MarkdownAdapter {
        message: err.to_string(),
        location: message_location(&err),
    })
}

fn message_location(message: &Message) -> SourceLocation {
    match &message.place {
        Some(place) => match place.as_ref() {
            Place::Point(point) => SourceLocation::new(point.line, point.column),
            Place::Position(position) => {
                SourceLocation::new(position.start.line, position.start.column)
            }
        },
        None => SourceLocation::new(1, 1),
    }
}
