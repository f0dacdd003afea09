//! Resolved drawing styles.

use plume_core::{color::Color, identifier::ElementId};

use crate::config::StyleConfig;

use super::selection::Selection;

/// Alpha factor applied to every color of a grayed out item.
pub const GRAY_OUT_ALPHA: f32 = 0.4;

/// The style an item is drawn with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub color: Color,
    pub background_color: Color,
    pub highlight_color: Color,
    pub text_color: Color,
    pub line_width: f64,
    pub font_size: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: Color::default(),
            background_color: Color::default().with_alpha(0.0),
            highlight_color: Color::default(),
            text_color: Color::default(),
            line_width: 2.0,
            font_size: 14.0,
        }
    }
}

/// Interaction state of one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemState {
    pub selected: bool,
    pub focused: bool,
    pub hovered: bool,
    pub dropzone: bool,
}

impl ItemState {
    /// Reads the state of `item` from `selection`.
    pub fn of(item: ElementId, selection: &Selection) -> Self {
        Self {
            selected: selection.is_selected(item),
            focused: selection.focused() == Some(item),
            hovered: selection.hovered() == Some(item),
            dropzone: selection.dropzone() == Some(item),
        }
    }
}

/// Computes item styles from the diagram style.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSheet {
    base: Style,
}

impl StyleSheet {
    /// Builds a style sheet from a configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first color that cannot be parsed.
    pub fn from_config(config: &StyleConfig) -> Result<Self, String> {
        Ok(Self {
            base: Style {
                color: config.color()?,
                background_color: config.background_color()?,
                highlight_color: config.highlight_color()?,
                text_color: config.text_color()?,
                line_width: config.line_width(),
                font_size: config.font_size(),
            },
        })
    }

    /// The diagram style every item starts from.
    pub fn diagram_style(&self) -> Style {
        self.base
    }

    /// Style for an item in the given state.
    ///
    /// Hovered items and drop zones are outlined in the highlight color.
    pub fn style(&self, state: ItemState) -> Style {
        let mut style = self.base;
        if state.hovered || state.dropzone {
            style.color = style.highlight_color;
        }
        style
    }
}

/// Dims `style` if `item` is grayed out in `selection`.
///
/// The alpha of the four colors is multiplied by [`GRAY_OUT_ALPHA`].
pub fn maybe_gray_out(style: Style, item: ElementId, selection: &Selection) -> Style {
    if !selection.is_grayed_out(item) {
        return style;
    }
    Style {
        color: style.color.dim_alpha(GRAY_OUT_ALPHA),
        background_color: style.background_color.dim_alpha(GRAY_OUT_ALPHA),
        highlight_color: style.highlight_color.dim_alpha(GRAY_OUT_ALPHA),
        text_color: style.text_color.dim_alpha(GRAY_OUT_ALPHA),
        ..style
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_gray_out_scales_alpha() {
        let sheet = StyleSheet::from_config(&StyleConfig::default()).unwrap();
        let item = ElementId::new("grayed");
        let mut selection = Selection::new();
        selection.gray_out([item]);

        let style = maybe_gray_out(sheet.diagram_style(), item, &selection);

        assert_approx_eq!(f32, style.color.alpha(), 0.4, epsilon = 1e-6);
        assert_approx_eq!(f32, style.background_color.alpha(), 0.4, epsilon = 1e-6);
        assert_approx_eq!(f32, style.highlight_color.alpha(), 0.4, epsilon = 1e-6);
        assert_approx_eq!(f32, style.text_color.alpha(), 0.4, epsilon = 1e-6);
        assert_eq!(style.line_width, sheet.diagram_style().line_width);
    }

    #[test]
    fn test_gray_out_ignores_other_items() {
        let sheet = StyleSheet::default();
        let mut selection = Selection::new();
        selection.gray_out([ElementId::new("other")]);

        let style = maybe_gray_out(sheet.diagram_style(), ElementId::new("plain"), &selection);

        assert_eq!(style, sheet.diagram_style());
    }

    #[test]
    fn test_hover_uses_highlight_color() {
        let sheet = StyleSheet::from_config(&StyleConfig::default()).unwrap();

        let style = sheet.style(ItemState {
            hovered: true,
            ..ItemState::default()
        });

        assert_eq!(style.color, sheet.diagram_style().highlight_color);
    }

    #[test]
    fn test_item_state_from_selection() {
        let item = ElementId::new("state-item");
        let mut selection = Selection::new();
        selection.set_focused(Some(item));
        selection.set_dropzone(Some(item));

        let state = ItemState::of(item, &selection);

        assert!(state.selected);
        assert!(state.focused);
        assert!(!state.hovered);
        assert!(state.dropzone);
    }
}
