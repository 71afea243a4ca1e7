//! Visual style documents.

use serde::{Deserialize, Serialize};

use super::color::Argb;
use crate::error::PluginError;

/// Visual and scheduling parameters a host applies to a plugin surface.
///
/// Every field has a default, so partial documents are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleDescriptor {
    /// Horizontal position in host units.
    pub left: f64,
    /// Vertical position in host units.
    pub top: f64,
    /// Surface width.
    pub width: f64,
    /// Surface height.
    pub height: f64,
    /// Opacity between `0.0` and `1.0`.
    pub opacity: f64,
    /// Fill colour.
    pub background_color: Argb,
    /// Text colour.
    pub foreground_color: Argb,
    /// Border colour.
    pub border_color: Argb,
    /// Corner radius.
    pub corner_radius: f64,
    /// Base font size.
    pub font_size: f64,
    /// Seconds between cyclic executions.
    pub refresh_interval_secs: u64,
    /// Whether the host should invoke `cyclic_function` periodically.
    pub cyclic_execution: bool,
    /// Function key invoked on each cycle.
    pub cyclic_function: Option<String>,
    /// Whether the surface stays above other windows.
    pub topmost: bool,
}

impl Default for StyleDescriptor {
    fn default() -> Self {
        Self {
            left: 100.0,
            top: 100.0,
            width: 320.0,
            height: 200.0,
            opacity: 1.0,
            background_color: Argb::opaque(0xFF, 0xFF, 0xFF),
            foreground_color: Argb::opaque(0x00, 0x00, 0x00),
            border_color: Argb::opaque(0x80, 0x80, 0x80),
            corner_radius: 8.0,
            font_size: 14.0,
            refresh_interval_secs: 60,
            cyclic_execution: false,
            cyclic_function: None,
            topmost: false,
        }
    }
}

/// Parses a style document.
///
/// # Errors
///
/// Returns [`PluginError::Descriptor`] when the JSON is malformed, a colour
/// does not parse, or the opacity lies outside `0.0..=1.0`.
pub fn parse_style(json: &str) -> Result<StyleDescriptor, PluginError> {
    let style: StyleDescriptor = serde_json::from_str(json).map_err(style_error)?;
    style.validate()?;
    Ok(style)
}

impl StyleDescriptor {
    /// Checks numeric ranges.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Descriptor`] when the opacity is outside
    /// `0.0..=1.0` or a dimension is negative or not finite.
    pub fn validate(&self) -> Result<(), PluginError> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(style_message(format!(
                "opacity {} is outside 0.0..=1.0",
                self.opacity
            )));
        }
        let dimensions = [
            ("width", self.width),
            ("height", self.height),
            ("cornerRadius", self.corner_radius),
            ("fontSize", self.font_size),
        ];
        if let Some((field, value)) = dimensions
            .iter()
            .find(|(_, value)| !value.is_finite() || *value < 0.0)
        {
            return Err(style_message(format!(
                "{field} must be a non-negative number, got {value}"
            )));
        }
        Ok(())
    }

    /// Renders the style as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Descriptor`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, PluginError> {
        serde_json::to_string_pretty(self).map_err(style_error)
    }
}

fn style_error(error: serde_json::Error) -> PluginError {
    style_message(error.to_string())
}

fn style_message(message: String) -> PluginError {
    PluginError::Descriptor {
        origin: String::from("style sheet"),
        message,
    }
}
