use serde::Serialize;
use std::cell::RefCell;
use taskview_core::{Catalogue, Rejection, ValidationResult};
use taskview_render::{RenderOptions, Renderer, outcome_to_html};
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;

// ============================================================================
// Config and shared state
// ============================================================================

/// Reads render options from a JS object; `undefined` and `null` mean defaults.
fn parse_config(config: JsValue) -> Result<RenderOptions, JsError> {
    if config.is_undefined() || config.is_null() {
        return Ok(RenderOptions::default());
    }
    serde_wasm_bindgen::from_value(config)
        .map_err(|e| JsError::new(&format!("Invalid options: {}", e)))
}

/// Content arrives as whatever the host had; anything but a string is missing.
fn content_arg(content: &JsValue) -> Option<String> {
    content.as_string()
}

/// Serializes with plain objects instead of `Map`s so hosts can read fields directly.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

thread_local! {
    // Loading syntect sets is the slow part; keep the last renderer around.
    static RENDERER: RefCell<Option<Renderer>> = const { RefCell::new(None) };
}

/// Runs `f` with a renderer for `options`, reusing the cached one when the
/// options match.
fn with_renderer<R>(options: RenderOptions, f: impl FnOnce(&Renderer) -> R) -> R {
    RENDERER.with(|cell| {
        let mut slot = cell.borrow_mut();
        let renderer = match slot.take() {
            Some(renderer) if renderer.options() == &options => renderer,
            _ => {
                log::debug!("building renderer for new options");
                Renderer::new(options)
            }
        };
        let result = f(&renderer);
        *slot = Some(renderer);
        result
    })
}

// ============================================================================
// Validation API
// ============================================================================

/// Validation result as seen from JavaScript.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// `"valid"` or `"invalid"`.
    pub status: &'static str,
    /// User-facing reason when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    /// Rejection details when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
}

impl From<ValidationResult> for ValidationReport {
    fn from(result: ValidationResult) -> Self {
        match result {
            ValidationResult::Valid => Self {
                status: "valid",
                reason: None,
                rejection: None,
            },
            ValidationResult::Invalid(rejection) => Self {
                status: "invalid",
                reason: Some(rejection.reason()),
                rejection: Some(rejection),
            },
        }
    }
}

/// Checks whether content is safe to render.
///
/// Returns `{status: "valid"}` or `{status: "invalid", reason, rejection}`.
#[wasm_bindgen(js_name = validate)]
pub fn validate_content(content: JsValue) -> Result<JsValue, JsError> {
    let content = content_arg(&content);
    let report = ValidationReport::from(taskview_core::validate(content.as_deref()));
    to_js(&report)
}

/// Normalizes line endings and blank lines, and trims the text.
#[wasm_bindgen(js_name = normalize)]
pub fn normalize_content(content: JsValue) -> String {
    taskview_core::normalize_content(content_arg(&content).as_deref())
}

/// Splits text into `{kind, content}` segments: `text`, `inlineMath`, `blockMath`.
#[wasm_bindgen(js_name = extract_math_segments)]
pub fn math_segments(text: &str) -> Result<JsValue, JsError> {
    to_js(&taskview_core::extract_math_segments(text))
}

// ============================================================================
// Render API
// ============================================================================

/// Renders content to a presentation tree.
///
/// # Returns
///
/// - `{status: "rendered", document: {root}}` on success
/// - `{status: "rejected", diagnostic: {kind, message, ...}}` otherwise
///
/// # Example (JavaScript)
///
/// ```javascript
/// import { render } from './taskview_wasm';
///
/// const outcome = render("# Task\n\nFind $x$.", { displayMode: "dark" });
/// if (outcome.status === "rendered") draw(outcome.document.root);
/// else showMessage(outcome.diagnostic.message);
/// ```
#[wasm_bindgen]
pub fn render(content: JsValue, config: JsValue) -> Result<JsValue, JsError> {
    let options = parse_config(config)?;
    let content = content_arg(&content);
    let outcome = with_renderer(options, |renderer| renderer.render(content.as_deref()));
    to_js(&outcome)
}

/// Renders content to an HTML string; rejected content yields the diagnostic box.
#[wasm_bindgen(js_name = render_html)]
pub fn render_html(content: JsValue, config: JsValue) -> Result<String, JsError> {
    let options = parse_config(config)?;
    let content = content_arg(&content);
    Ok(with_renderer(options, |renderer| {
        outcome_to_html(&renderer.render(content.as_deref()))
    }))
}

// ============================================================================
// Catalogue API
// ============================================================================

/// Parses and checks an exercise catalogue.
///
/// Accepts `[{type, tasks: [{name, mdFile, dataFile?}]}]` as well as
/// `[{label, exercises: [{name, document, dataFile?}]}]`, and returns the
/// latter form.
#[wasm_bindgen(js_name = parse_catalogue)]
pub fn parse_catalogue(json: &str) -> Result<JsValue, JsError> {
    let catalogue = Catalogue::from_json(json).map_err(|e| JsError::new(&e.to_string()))?;
    to_js(&catalogue)
}
