//! Formula typesetting hook.

use crate::tree::MathDisplay;

/// Turns TeX into display markup.
pub trait MathTypesetter {
    /// Typesets `tex`. `None` leaves the TeX for the display layer.
    fn typeset(&self, tex: &str, display: MathDisplay) -> Option<String>;
}

/// Leaves every formula as TeX for a client-side typesetter such as KaTeX.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientSideMath;

impl MathTypesetter for ClientSideMath {
    fn typeset(&self, _tex: &str, _display: MathDisplay) -> Option<String> {
        None
    }
}

impl<F> MathTypesetter for F
where
    F: Fn(&str, MathDisplay) -> Option<String>,
{
    fn typeset(&self, tex: &str, display: MathDisplay) -> Option<String> {
        (self)(tex, display)
    }
}
