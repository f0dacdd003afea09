//! Painting diagram items.
//!
//! The painter reads the model and never changes it. For each item it
//! resolves a [`Style`] from the [`StyleSheet`] and the view's
//! [`Selection`], applies the item's `matrix_i2c` to the [`Renderer`] and
//! draws the item's shape in item coordinates.

mod selection;
mod style;
mod svg;

pub use selection::Selection;
pub use style::{GRAY_OUT_ALPHA, ItemState, Style, StyleSheet, maybe_gray_out};
pub use svg::SvgRenderer;

use log::{debug, trace};

use plume_core::geometry::{Matrix, Point, Size};
use plume_model::{ElementFactory, ElementId, Endpoint, Metaclass, PresentationData, Shape};

/// A drawing primitive in the current coordinate frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive<'a> {
    /// Outlined and filled rectangle.
    Rectangle { origin: Point, size: Size },
    Line { from: Point, to: Point },
    /// Outlined and filled circle.
    Circle { center: Point, radius: f64 },
    /// Text with its baseline starting at `position`.
    Text { position: Point, content: &'a str },
}

/// A drawing surface with a cairo-like state stack.
pub trait Renderer {
    /// Pushes the current transform and source.
    fn save(&mut self);

    /// Pops back to the state of the matching [`Renderer::save`].
    fn restore(&mut self);

    /// Sets the colors and widths used by subsequent draws.
    fn set_source(&mut self, style: &Style);

    /// Applies `matrix` before the current transform.
    fn transform(&mut self, matrix: &Matrix);

    fn draw(&mut self, primitive: Primitive<'_>);
}

/// Per-item drawing context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawContext {
    pub style: Style,
    pub selected: bool,
    pub focused: bool,
    pub hovered: bool,
    pub dropzone: bool,
}

const HANDLE_SIZE: f64 = 6.0;
const CONTAINMENT_RADIUS: f64 = 6.0;
const PACKAGE_TAB_HEIGHT: f64 = 12.0;
const COMMENT_EAR: f64 = 10.0;

/// Paints items of a diagram.
///
/// # Examples
///
/// ```
/// use plume::painter::{ItemPainter, Selection, StyleSheet, SvgRenderer};
/// use plume_model::{ElementFactory, Metaclass};
///
/// let mut factory = ElementFactory::new();
/// let diagram = factory.create(Metaclass::Diagram).unwrap();
/// let class = factory.create(Metaclass::Class).unwrap();
/// factory.create_item(Metaclass::ClassItem, diagram, Some(class)).unwrap();
///
/// let style_sheet = StyleSheet::default();
/// let selection = Selection::new();
/// let painter = ItemPainter::new(&style_sheet, &selection);
/// let mut renderer = SvgRenderer::new(0.8);
///
/// let items = factory.items(diagram).unwrap().iter().copied();
/// assert_eq!(painter.paint(&factory, items, &mut renderer), 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ItemPainter<'a> {
    style_sheet: &'a StyleSheet,
    selection: &'a Selection,
}

impl<'a> ItemPainter<'a> {
    pub fn new(style_sheet: &'a StyleSheet, selection: &'a Selection) -> Self {
        Self {
            style_sheet,
            selection,
        }
    }

    /// Builds the drawing context of `item`.
    pub fn context(&self, item: ElementId) -> DrawContext {
        let state = ItemState::of(item, self.selection);
        let style = maybe_gray_out(self.style_sheet.style(state), item, self.selection);
        DrawContext {
            style,
            selected: state.selected,
            focused: state.focused,
            hovered: state.hovered,
            dropzone: state.dropzone,
        }
    }

    /// Paints `items` in order. Ids that are not presentations are skipped.
    ///
    /// Returns the number of items painted.
    pub fn paint(
        &self,
        factory: &ElementFactory,
        items: impl IntoIterator<Item = ElementId>,
        renderer: &mut dyn Renderer,
    ) -> usize {
        let mut painted = 0;
        for item in items {
            let Some(element) = factory.lookup(item) else {
                debug!(item:?; "Skipping unknown item");
                continue;
            };
            let Some(data) = element.as_presentation() else {
                debug!(item:?; "Skipping element that is not a presentation");
                continue;
            };

            let context = self.context(item);
            let label = data
                .subject()
                .and_then(|subject| factory.lookup(subject))
                .and_then(|subject| subject.name().map(str::to_string))
                .unwrap_or_else(|| element.metaclass().to_string());
            trace!(item:?, label = label.as_str(); "Painting item");

            renderer.save();
            renderer.transform(&data.matrix_i2c());
            renderer.set_source(&context.style);
            draw_item(element.metaclass(), data, &label, &context, renderer);
            renderer.restore();
            painted += 1;
        }
        painted
    }
}

fn draw_item(
    metaclass: Metaclass,
    data: &PresentationData,
    label: &str,
    context: &DrawContext,
    renderer: &mut dyn Renderer,
) {
    match *data.shape() {
        Shape::Box { size } => {
            match metaclass {
                Metaclass::PackageItem => draw_package(size, label, context, renderer),
                Metaclass::CommentItem => draw_comment(size, label, context, renderer),
                _ => draw_class(size, label, context, renderer),
            }
            if context.selected || context.focused {
                draw_handles(
                    &[
                        Point::default(),
                        Point::new(size.width(), 0.0),
                        Point::new(0.0, size.height()),
                        Point::new(size.width(), size.height()),
                    ],
                    context,
                    renderer,
                );
            }
        }
        Shape::Line { head, tail } => {
            draw_containment(head, tail, renderer);
            if context.selected || context.focused {
                let handles: Vec<Point> = Endpoint::BOTH
                    .into_iter()
                    .filter_map(|endpoint| data.handle(endpoint))
                    .collect();
                draw_handles(&handles, context, renderer);
            }
        }
    }
}

fn draw_package(size: Size, label: &str, context: &DrawContext, renderer: &mut dyn Renderer) {
    renderer.draw(Primitive::Rectangle {
        origin: Point::default(),
        size: Size::new((size.width() / 3.0).min(60.0), PACKAGE_TAB_HEIGHT),
    });
    renderer.draw(Primitive::Rectangle {
        origin: Point::new(0.0, PACKAGE_TAB_HEIGHT),
        size: Size::new(size.width(), (size.height() - PACKAGE_TAB_HEIGHT).max(0.0)),
    });
    renderer.draw(Primitive::Text {
        position: Point::new(8.0, PACKAGE_TAB_HEIGHT + context.style.font_size + 6.0),
        content: label,
    });
}

fn draw_class(size: Size, label: &str, context: &DrawContext, renderer: &mut dyn Renderer) {
    let compartment = context.style.font_size + 12.0;
    renderer.draw(Primitive::Rectangle {
        origin: Point::default(),
        size,
    });
    if compartment < size.height() {
        renderer.draw(Primitive::Line {
            from: Point::new(0.0, compartment),
            to: Point::new(size.width(), compartment),
        });
    }
    renderer.draw(Primitive::Text {
        position: Point::new(8.0, context.style.font_size + 4.0),
        content: label,
    });
}

fn draw_comment(size: Size, label: &str, context: &DrawContext, renderer: &mut dyn Renderer) {
    let ear = COMMENT_EAR.min(size.width()).min(size.height());
    renderer.draw(Primitive::Rectangle {
        origin: Point::default(),
        size,
    });
    renderer.draw(Primitive::Line {
        from: Point::new(size.width() - ear, 0.0),
        to: Point::new(size.width(), ear),
    });
    renderer.draw(Primitive::Text {
        position: Point::new(8.0, context.style.font_size + 4.0),
        content: label,
    });
}

/// Draws the line and the circled cross anchor at the head.
fn draw_containment(head: Point, tail: Point, renderer: &mut dyn Renderer) {
    let delta = tail.sub_point(head);
    let length = delta.x().hypot(delta.y());
    let (dx, dy) = if length > f64::EPSILON {
        (delta.x() / length, delta.y() / length)
    } else {
        (1.0, 0.0)
    };
    let r = CONTAINMENT_RADIUS;
    let center = Point::new(head.x() + dx * r, head.y() + dy * r);

    renderer.draw(Primitive::Line {
        from: Point::new(head.x() + dx * 2.0 * r, head.y() + dy * 2.0 * r),
        to: tail,
    });
    renderer.draw(Primitive::Circle { center, radius: r });
    renderer.draw(Primitive::Line {
        from: head,
        to: Point::new(head.x() + dx * 2.0 * r, head.y() + dy * 2.0 * r),
    });
    renderer.draw(Primitive::Line {
        from: Point::new(center.x() - dy * r, center.y() + dx * r),
        to: Point::new(center.x() + dy * r, center.y() - dx * r),
    });
}

fn draw_handles(points: &[Point], context: &DrawContext, renderer: &mut dyn Renderer) {
    let handle_style = Style {
        color: context.style.highlight_color,
        background_color: context.style.highlight_color,
        line_width: 1.0,
        ..context.style
    };
    renderer.save();
    renderer.set_source(&handle_style);
    for point in points {
        renderer.draw(Primitive::Rectangle {
            origin: Point::new(point.x() - HANDLE_SIZE / 2.0, point.y() - HANDLE_SIZE / 2.0),
            size: Size::new(HANDLE_SIZE, HANDLE_SIZE),
        });
    }
    renderer.restore();
}
