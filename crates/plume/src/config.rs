//! Configuration types for painting Plume diagrams.
//!
//! All types implement [`serde::Deserialize`] and [`serde::Serialize`] so they
//! can be loaded from and written to TOML files.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining style and render settings.
//! - [`StyleConfig`] - Diagram style: colors, line width and font size.
//! - [`RenderConfig`] - Canvas padding and the curve tolerance hint.
//!
//! # Example
//!
//! ```
//! # use plume::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(config.style().color().is_ok());
//! assert_eq!(config.render().tolerance(), 0.8);
//! ```

use serde::{Deserialize, Serialize};

use plume_core::color::Color;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,

    /// Render configuration section.
    #[serde(default)]
    render: RenderConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    ///
    /// # Arguments
    ///
    /// * `style` - Diagram style used by the painter.
    /// * `render` - Canvas settings used by the renderer.
    pub fn new(style: StyleConfig, render: RenderConfig) -> Self {
        Self { style, render }
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Returns the render configuration.
    pub fn render(&self) -> &RenderConfig {
        &self.render
    }
}

/// Diagram style.
///
/// Colors are CSS color strings; they are parsed when a
/// [`StyleSheet`](crate::painter::StyleSheet) is built from this section.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StyleConfig {
    color: String,
    background_color: String,
    highlight_color: String,
    text_color: String,
    line_width: f64,
    font_size: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            color: "black".to_string(),
            background_color: "white".to_string(),
            highlight_color: "#3584e4".to_string(),
            text_color: "black".to_string(),
            line_width: 2.0,
            font_size: 14.0,
        }
    }
}

impl StyleConfig {
    /// Returns the parsed outline [`Color`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configured string is not a valid color.
    pub fn color(&self) -> Result<Color, String> {
        parse_color("color", &self.color)
    }

    /// Returns the parsed fill [`Color`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configured string is not a valid color.
    pub fn background_color(&self) -> Result<Color, String> {
        parse_color("background_color", &self.background_color)
    }

    /// Returns the parsed highlight [`Color`] used for hover and drop zones.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured string is not a valid color.
    pub fn highlight_color(&self) -> Result<Color, String> {
        parse_color("highlight_color", &self.highlight_color)
    }

    /// Returns the parsed text [`Color`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configured string is not a valid color.
    pub fn text_color(&self) -> Result<Color, String> {
        parse_color("text_color", &self.text_color)
    }

    pub fn line_width(&self) -> f64 {
        self.line_width
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }
}

fn parse_color(field: &str, value: &str) -> Result<Color, String> {
    Color::new(value).map_err(|err| format!("Invalid {field} in config: {err}"))
}

/// Canvas settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    padding: f64,
    tolerance: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            padding: 20.0,
            tolerance: 0.8,
        }
    }
}

impl RenderConfig {
    /// Creates a new [`RenderConfig`].
    ///
    /// # Arguments
    ///
    /// * `padding` - Space added around the painted items.
    /// * `tolerance` - Curve flattening tolerance handed to the renderer.
    pub fn new(padding: f64, tolerance: f64) -> Self {
        Self { padding, tolerance }
    }

    pub fn padding(&self) -> f64 {
        self.padding
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_style_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [style]
            color = "navy"
            "#,
        )
        .unwrap();

        assert_eq!(config.style().color().unwrap(), Color::new("navy").unwrap());
        assert_eq!(config.style().line_width(), 2.0);
        assert_eq!(config.render(), &RenderConfig::default());
    }

    #[test]
    fn test_invalid_color_is_reported() {
        let config: AppConfig = toml::from_str(
            r#"
            [style]
            highlight_color = "sparkly"
            "#,
        )
        .unwrap();

        let err = config.style().highlight_color().unwrap_err();
        assert!(err.contains("highlight_color"));
    }

    #[test]
    fn test_render_section() {
        let config: AppConfig = toml::from_str(
            r#"
            [render]
            padding = 5.0
            "#,
        )
        .unwrap();

        assert_eq!(config.render().padding(), 5.0);
        assert_eq!(config.render().tolerance(), 0.8);
    }
}
