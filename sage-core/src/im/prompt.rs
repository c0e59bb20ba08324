// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

/// Geometric shape kinds produced by annotation layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Point,
    Rectangle,
    Ellipse,
    Line,
    Path,
    Polygon,
}

/// A user-drawn shape with vertices in row/column (y, x) order.
///
/// Annotation layers store vertices row-major, so a point shape carries a
/// single `[y, x]` vertex and a rectangle carries its four corners.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub kind: ShapeKind,
    pub data: Vec<[f32; 2]>,
}

impl Shape {
    pub fn point(y: f32, x: f32) -> Self {
        Shape {
            kind: ShapeKind::Point,
            data: vec![[y, x]],
        }
    }

    pub fn rectangle(vertices: Vec<[f32; 2]>) -> Self {
        Shape {
            kind: ShapeKind::Rectangle,
            data: vertices,
        }
    }
}

/// Collect point-type shapes into model prompt coordinates and labels.
///
/// Coordinates are returned in (x, y) order, ready for a promptable
/// segmentation decoder. Labels use 1 for foreground and 0 for background;
/// if the provided label list does not match the number of point shapes,
/// every point defaults to foreground.
///
/// # Arguments
///
/// * `shapes` - User-drawn shapes; non-point kinds are ignored
/// * `labels` - Optional per-point labels
///
/// # Examples
///
/// ```
/// use sage_core::im::{Shape, shapes_to_points};
///
/// let shapes = [Shape::point(4.0, 9.0)];
/// let (points, labels) = shapes_to_points(&shapes, None);
///
/// assert_eq!(points, vec![[9.0, 4.0]]);
/// assert_eq!(labels, vec![1]);
/// ```
pub fn shapes_to_points(shapes: &[Shape], labels: Option<&[u32]>) -> (Vec<[f32; 2]>, Vec<u32>) {
    let points: Vec<[f32; 2]> = shapes
        .iter()
        .filter(|shape| shape.kind == ShapeKind::Point)
        .filter_map(|shape| shape.data.first())
        .map(|vertex| [vertex[1], vertex[0]])
        .collect();

    let labels = match labels {
        Some(labels) if labels.len() == points.len() => labels.to_vec(),
        _ => vec![1u32; points.len()],
    };

    (points, labels)
}

/// Extract a bounding box from the last rectangle-type shape.
///
/// The box is the coordinate extrema `[x_min, y_min, x_max, y_max]` with x
/// taken from vertex columns and y from vertex rows. Rectangles with fewer
/// than four vertices, non-finite vertex data, or degenerate extents
/// (`x_max <= x_min` or `y_max <= y_min`) yield `None`.
///
/// # Examples
///
/// ```
/// use sage_core::im::{Shape, shapes_to_box};
///
/// let shapes = [Shape::rectangle(vec![
///     [10.0, 10.0],
///     [10.0, 20.0],
///     [20.0, 20.0],
///     [20.0, 10.0],
/// ])];
///
/// assert_eq!(shapes_to_box(&shapes), Some([10.0, 10.0, 20.0, 20.0]));
/// ```
pub fn shapes_to_box(shapes: &[Shape]) -> Option<[f32; 4]> {
    let rectangle = shapes
        .iter()
        .filter(|shape| shape.kind == ShapeKind::Rectangle)
        .next_back()?;

    if rectangle.data.len() < 4 {
        return None;
    }

    if rectangle
        .data
        .iter()
        .any(|vertex| !vertex[0].is_finite() || !vertex[1].is_finite())
    {
        return None;
    }

    let mut x_min = f32::INFINITY;
    let mut x_max = f32::NEG_INFINITY;
    let mut y_min = f32::INFINITY;
    let mut y_max = f32::NEG_INFINITY;

    for vertex in &rectangle.data {
        let (y, x) = (vertex[0], vertex[1]);
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if x_max <= x_min || y_max <= y_min {
        return None;
    }

    Some([x_min, y_min, x_max, y_max])
}

/// A combined point/box prompt handed to a promptable segmentation model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prompt {
    pub points: Vec<[f32; 2]>,
    pub labels: Vec<u32>,
    pub bbox: Option<[f32; 4]>,
}

impl Prompt {
    /// Build a prompt from user-drawn shapes and optional point labels
    pub fn from_shapes(shapes: &[Shape], labels: Option<&[u32]>) -> Self {
        let (points, labels) = shapes_to_points(shapes, labels);

        Prompt {
            points,
            labels,
            bbox: shapes_to_box(shapes),
        }
    }

    /// A prompt with neither points nor a box selects nothing
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.bbox.is_none()
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_points_preserve_order() {
        let shapes = [
            Shape::point(1.0, 2.0),
            Shape::point(3.0, 4.0),
            Shape::point(5.0, 6.0),
        ];

        let (points, labels) = shapes_to_points(&shapes, Some(&[1, 0, 1]));

        assert_eq!(points, vec![[2.0, 1.0], [4.0, 3.0], [6.0, 5.0]]);
        assert_eq!(labels, vec![1, 0, 1]);
    }

    #[test]
    fn test_points_label_mismatch_defaults_foreground() {
        let shapes = [Shape::point(1.0, 2.0), Shape::point(3.0, 4.0)];

        let (_, labels) = shapes_to_points(&shapes, Some(&[0]));

        assert_eq!(labels, vec![1, 1]);
    }

    #[test]
    fn test_points_ignore_other_kinds() {
        let shapes = [
            Shape::rectangle(vec![[0.0, 0.0], [0.0, 5.0], [5.0, 5.0], [5.0, 0.0]]),
            Shape::point(7.0, 8.0),
            Shape {
                kind: ShapeKind::Ellipse,
                data: vec![[1.0, 1.0]],
            },
        ];

        let (points, labels) = shapes_to_points(&shapes, None);

        assert_eq!(points, vec![[8.0, 7.0]]);
        assert_eq!(labels, vec![1]);
    }

    #[test]
    fn test_points_empty() {
        let (points, labels) = shapes_to_points(&[], None);

        assert!(points.is_empty());
        assert!(labels.is_empty());
    }

    #[test]
    fn test_box_extrema() {
        let shapes = [Shape::rectangle(vec![
            [10.0, 10.0],
            [10.0, 20.0],
            [20.0, 20.0],
            [20.0, 10.0],
        ])];

        assert_eq!(shapes_to_box(&shapes), Some([10.0, 10.0, 20.0, 20.0]));
    }

    #[test]
    fn test_box_last_rectangle_wins() {
        let shapes = [
            Shape::rectangle(vec![[0.0, 0.0], [0.0, 5.0], [5.0, 5.0], [5.0, 0.0]]),
            Shape::rectangle(vec![[1.0, 1.0], [1.0, 3.0], [3.0, 3.0], [3.0, 1.0]]),
        ];

        assert_eq!(shapes_to_box(&shapes), Some([1.0, 1.0, 3.0, 3.0]));
    }

    #[test]
    fn test_box_too_few_vertices() {
        let shapes = [Shape::rectangle(vec![[0.0, 0.0], [5.0, 5.0]])];

        assert_eq!(shapes_to_box(&shapes), None);
    }

    #[test]
    fn test_box_degenerate() {
        let shapes = [Shape::rectangle(vec![
            [0.0, 2.0],
            [0.0, 2.0],
            [5.0, 2.0],
            [5.0, 2.0],
        ])];

        assert_eq!(shapes_to_box(&shapes), None);
    }

    #[test]
    fn test_box_non_finite() {
        let shapes = [Shape::rectangle(vec![
            [0.0, 0.0],
            [0.0, f32::NAN],
            [5.0, 5.0],
            [5.0, 0.0],
        ])];

        assert_eq!(shapes_to_box(&shapes), None);
    }

    #[test]
    fn test_box_no_rectangles() {
        let shapes = [Shape::point(1.0, 1.0)];

        assert_eq!(shapes_to_box(&shapes), None);
    }

    #[test]
    fn test_prompt_from_shapes() {
        let shapes = [
            Shape::point(2.0, 3.0),
            Shape::rectangle(vec![[0.0, 0.0], [0.0, 5.0], [5.0, 5.0], [5.0, 0.0]]),
        ];

        let prompt = Prompt::from_shapes(&shapes, None);

        assert_eq!(prompt.points, vec![[3.0, 2.0]]);
        assert_eq!(prompt.labels, vec![1]);
        assert_eq!(prompt.bbox, Some([0.0, 0.0, 5.0, 5.0]));
        assert!(!prompt.is_empty());
    }
}
