#![deny(missing_docs)]
//! taskview core: content validation, normalization, math segments, and the
//! exercise catalogue model.

/// Exercise catalogue types.
pub mod catalogue;
/// Code fence detection utilities.
pub mod code_fence;
/// Core error types.
pub mod error;
/// Math segment extraction.
pub mod math;
/// Text normalization.
pub mod normalize;
/// Markdown parsing utilities and text transform hooks.
pub mod parse;
/// Unsafe content screening.
pub mod sanitize;

pub use catalogue::{Catalogue, Category, Exercise};
pub use error::{SourceLocation, TaskviewError};
pub use math::{Segment, extract_math_segments, reassemble};
pub use normalize::{normalize, normalize_content};
pub use parse::{ParseOptions, ParserPipeline, TextTransform, parse_mdast, parse_mdast_with_options};
pub use sanitize::{
    MISSING_CONTENT_REASON, Rejection, UNSAFE_CONTENT_REASON, UnsafePattern, ValidationResult,
    validate,
};

pub use code_fence::{FencePhase, FenceState, LineParseOutcome, advance_fence_state, fenced_ranges};
