//! SVG implementation of the [`Renderer`] trait.
//!
//! Every `save`/`restore` pair becomes an SVG group; transforms applied in
//! between are composed into that group's `transform="matrix(...)"`
//! attribute. The canvas bounds of everything drawn are tracked so the
//! finished document can be sized to its content.

use std::fmt;

use log::{debug, warn};
use svg::{
    Document,
    node::element::{Circle, Group, Line, Rectangle, Text},
};

use plume_core::geometry::{Bounds, Matrix, Point};

use super::{Primitive, Renderer, style::Style};

type SvgNode = Box<dyn svg::Node>;

struct Frame {
    children: Vec<SvgNode>,
    /// Transform applied within this frame only.
    matrix: Matrix,
    /// Full item-to-canvas transform at this frame.
    ctm: Matrix,
    style: Style,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("children", &self.children.len())
            .field("matrix", &self.matrix)
            .finish()
    }
}

impl Frame {
    fn nested(parent: &Frame) -> Self {
        Self {
            children: Vec::new(),
            matrix: Matrix::identity(),
            ctm: parent.ctm,
            style: parent.style,
        }
    }

    fn into_group(self) -> Group {
        let mut group = Group::new();
        if !self.matrix.is_identity() {
            group = group.set("transform", self.matrix.to_string());
        }
        for child in self.children {
            group = group.add(child);
        }
        group
    }
}

/// Paints into an in-memory SVG document.
///
/// # Examples
///
/// ```
/// use plume::painter::{Primitive, Renderer, SvgRenderer};
/// use plume_core::geometry::{Matrix, Point, Size};
///
/// let mut renderer = SvgRenderer::new(0.8);
/// renderer.save();
/// renderer.transform(&Matrix::new(1.0, 0.0, 0.0, 1.0, 10.0, 10.0));
/// renderer.draw(Primitive::Rectangle {
///     origin: Point::default(),
///     size: Size::new(20.0, 10.0),
/// });
/// renderer.restore();
///
/// let svg = renderer.finish(5.0).to_string();
/// assert!(svg.contains("matrix(1 0 0 1 10 10)"));
/// ```
#[derive(Debug)]
pub struct SvgRenderer {
    frames: Vec<Frame>,
    bounds: Option<Bounds>,
    tolerance: f64,
}

impl SvgRenderer {
    /// Creates an empty renderer.
    ///
    /// `tolerance` is recorded on the document as the curve tolerance hint.
    pub fn new(tolerance: f64) -> Self {
        Self {
            frames: vec![Frame {
                children: Vec::new(),
                matrix: Matrix::identity(),
                ctm: Matrix::identity(),
                style: Style::default(),
            }],
            bounds: None,
            tolerance,
        }
    }

    /// Canvas bounds of everything drawn so far.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    fn frame(&mut self) -> &mut Frame {
        // The root frame is never popped.
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn include(&mut self, points: &[Point]) {
        let ctm = self.frame().ctm;
        let mapped = Bounds::from_points(points.iter().map(|point| ctm.transform_point(*point)));
        self.bounds = match (self.bounds, mapped) {
            (Some(current), Some(mapped)) => Some(current.union(mapped)),
            (current, mapped) => current.or(mapped),
        };
    }

    fn push(&mut self, node: SvgNode) {
        self.frame().children.push(node);
    }

    /// Closes open groups and returns the document, sized to the drawn
    /// content plus `padding` on every side.
    pub fn finish(mut self, padding: f64) -> Document {
        while self.frames.len() > 1 {
            warn!("Unbalanced save; closing group");
            self.restore();
        }

        let bounds = self
            .bounds
            .unwrap_or_else(|| Bounds::from_corners(Point::default(), Point::default()))
            .expand(padding);
        let min = bounds.min_point();
        debug!(width = bounds.width(), height = bounds.height(); "SVG document finished");

        let mut doc = Document::new()
            .set(
                "viewBox",
                format!("{} {} {} {}", min.x(), min.y(), bounds.width(), bounds.height()),
            )
            .set("width", bounds.width())
            .set("height", bounds.height())
            .set("data-tolerance", self.tolerance);

        if let Some(root) = self.frames.pop() {
            doc = doc.add(root.into_group());
        }
        doc
    }
}

impl Renderer for SvgRenderer {
    fn save(&mut self) {
        let frame = Frame::nested(self.frame());
        self.frames.push(frame);
    }

    fn restore(&mut self) {
        if self.frames.len() == 1 {
            warn!("Restore without matching save");
            return;
        }
        if let Some(frame) = self.frames.pop() {
            let group = frame.into_group();
            self.push(Box::new(group));
        }
    }

    fn set_source(&mut self, style: &Style) {
        self.frame().style = *style;
    }

    fn transform(&mut self, matrix: &Matrix) {
        let frame = self.frame();
        frame.matrix = matrix.multiply(&frame.matrix);
        frame.ctm = matrix.multiply(&frame.ctm);
    }

    fn draw(&mut self, primitive: Primitive<'_>) {
        let style = self.frame().style;
        match primitive {
            Primitive::Rectangle { origin, size } => {
                let far = Point::new(origin.x() + size.width(), origin.y() + size.height());
                self.include(&[origin, far]);
                let rect = Rectangle::new()
                    .set("x", origin.x())
                    .set("y", origin.y())
                    .set("width", size.width())
                    .set("height", size.height())
                    .set("fill", style.background_color.to_string())
                    .set("fill-opacity", style.background_color.alpha())
                    .set("stroke", style.color.to_string())
                    .set("stroke-opacity", style.color.alpha())
                    .set("stroke-width", style.line_width);
                self.push(Box::new(rect));
            }
            Primitive::Line { from, to } => {
                self.include(&[from, to]);
                let line = Line::new()
                    .set("x1", from.x())
                    .set("y1", from.y())
                    .set("x2", to.x())
                    .set("y2", to.y())
                    .set("stroke", style.color.to_string())
                    .set("stroke-opacity", style.color.alpha())
                    .set("stroke-width", style.line_width);
                self.push(Box::new(line));
            }
            Primitive::Circle { center, radius } => {
                self.include(&[
                    Point::new(center.x() - radius, center.y() - radius),
                    Point::new(center.x() + radius, center.y() + radius),
                ]);
                let circle = Circle::new()
                    .set("cx", center.x())
                    .set("cy", center.y())
                    .set("r", radius)
                    .set("fill", style.background_color.to_string())
                    .set("fill-opacity", style.background_color.alpha())
                    .set("stroke", style.color.to_string())
                    .set("stroke-opacity", style.color.alpha())
                    .set("stroke-width", style.line_width);
                self.push(Box::new(circle));
            }
            Primitive::Text { position, content } => {
                self.include(&[position]);
                let text = Text::new(content)
                    .set("x", position.x())
                    .set("y", position.y())
                    .set("fill", style.text_color.to_string())
                    .set("fill-opacity", style.text_color.alpha())
                    .set("font-size", style.font_size);
                self.push(Box::new(text));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;
    use plume_core::geometry::Size;

    #[test]
    fn test_bounds_follow_transform() {
        let mut renderer = SvgRenderer::new(0.8);
        renderer.save();
        renderer.transform(&Matrix::new(2.0, 0.0, 0.0, 2.0, 10.0, 0.0));
        renderer.draw(Primitive::Rectangle {
            origin: Point::default(),
            size: Size::new(10.0, 5.0),
        });
        renderer.restore();

        let bounds = renderer.bounds().unwrap();
        assert_approx_eq!(f64, bounds.min_point().x(), 10.0);
        assert_approx_eq!(f64, bounds.max_point().x(), 30.0);
        assert_approx_eq!(f64, bounds.max_point().y(), 10.0);
    }

    #[test]
    fn test_unbalanced_restore_is_ignored() {
        let mut renderer = SvgRenderer::new(0.8);
        renderer.restore();
        renderer.draw(Primitive::Line {
            from: Point::default(),
            to: Point::new(5.0, 5.0),
        });

        let svg = renderer.finish(0.0).to_string();
        assert!(svg.contains("<line"));
    }

    #[test]
    fn test_unclosed_groups_are_closed() {
        let mut renderer = SvgRenderer::new(0.8);
        renderer.save();
        renderer.save();
        renderer.draw(Primitive::Text {
            position: Point::new(1.0, 1.0),
            content: "Order",
        });

        let svg = renderer.finish(0.0).to_string();
        assert!(svg.contains("Order"));
    }
}
