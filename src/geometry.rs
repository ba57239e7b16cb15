//! Core geometry types for the render tree and paint invalidation
//!
//! All units are CSS pixels. The coordinate system has its origin at the
//! top-left corner: positive X extends to the right, positive Y downward,
//! matching CSS 2.1 Section 8.3.1.
//!
//! Visual rects produced by the invalidation engine are axis-aligned; quads
//! exist so coordinate mapping can pass shapes through transforms without
//! losing precision until the final bounding-box step.

use std::fmt;
use std::ops::{Add, Sub};

/// A 2D point in CSS pixel space
///
/// # Examples
///
/// ```
/// use fastpaint::Point;
///
/// let p = Point::new(10.0, 20.0);
/// assert_eq!(p.x, 10.0);
/// assert_eq!(Point::ZERO, Point::new(0.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
  /// X coordinate (increases to the right)
  pub x: f32,
  /// Y coordinate (increases downward)
  pub y: f32,
}

impl Point {
  /// The origin (0, 0)
  pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

  /// Creates a new point at the given coordinates
  pub const fn new(x: f32, y: f32) -> Self {
    Self { x, y }
  }

  /// Translates this point by another point's coordinates
  pub fn translate(self, other: Point) -> Self {
    Self {
      x: self.x + other.x,
      y: self.y + other.y,
    }
  }

  /// Returns true when both coordinates are within `tolerance` of `other`
  pub fn approx_eq(self, other: Point, tolerance: f32) -> bool {
    (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
  }
}

impl Add for Point {
  type Output = Point;

  fn add(self, rhs: Point) -> Point {
    self.translate(rhs)
  }
}

impl Sub for Point {
  type Output = Point;

  fn sub(self, rhs: Point) -> Point {
    Point::new(self.x - rhs.x, self.y - rhs.y)
  }
}

impl fmt::Display for Point {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}, {})", self.x, self.y)
  }
}

/// A 2D size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
  /// Width (horizontal extent)
  pub width: f32,
  /// Height (vertical extent)
  pub height: f32,
}

impl Size {
  /// A size with zero width and height
  pub const ZERO: Self = Self {
    width: 0.0,
    height: 0.0,
  };

  /// Creates a new size with the given dimensions
  pub const fn new(width: f32, height: f32) -> Self {
    Self { width, height }
  }

  /// Returns true if either dimension is zero or negative
  pub fn is_empty(self) -> bool {
    self.width <= 0.0 || self.height <= 0.0
  }
}

impl fmt::Display for Size {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}x{}", self.width, self.height)
  }
}

/// An axis-aligned rectangle in CSS pixel space
///
/// Stored as origin + size. An empty rect (zero or negative area) still has a
/// meaningful location; the invalidation engine relies on this when deciding
/// between "became visible" and "location change" outcomes.
///
/// # Examples
///
/// ```
/// use fastpaint::Rect;
///
/// let r = Rect::from_xywh(10.0, 20.0, 100.0, 50.0);
/// assert_eq!(r.max_x(), 110.0);
/// assert!(!r.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
  /// Top-left corner
  pub origin: Point,
  /// Dimensions
  pub size: Size,
}

impl Rect {
  /// The empty rect at the origin
  pub const ZERO: Self = Self {
    origin: Point::ZERO,
    size: Size::ZERO,
  };

  /// Creates a rect from origin and size
  pub const fn new(origin: Point, size: Size) -> Self {
    Self { origin, size }
  }

  /// Creates a rect from x, y, width, height
  pub const fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
    Self {
      origin: Point::new(x, y),
      size: Size::new(width, height),
    }
  }

  /// Left edge
  pub fn min_x(self) -> f32 {
    self.origin.x
  }

  /// Top edge
  pub fn min_y(self) -> f32 {
    self.origin.y
  }

  /// Right edge
  pub fn max_x(self) -> f32 {
    self.origin.x + self.size.width
  }

  /// Bottom edge
  pub fn max_y(self) -> f32 {
    self.origin.y + self.size.height
  }

  /// Width of the rect
  pub fn width(self) -> f32 {
    self.size.width
  }

  /// Height of the rect
  pub fn height(self) -> f32 {
    self.size.height
  }

  /// Returns true if the rect has no area
  pub fn is_empty(self) -> bool {
    self.size.is_empty()
  }

  /// Returns this rect translated by `offset`
  pub fn translate(self, offset: Point) -> Rect {
    Rect::new(self.origin.translate(offset), self.size)
  }

  /// Returns true if the point lies inside the rect (edges inclusive on the
  /// top/left, exclusive on the bottom/right)
  pub fn contains_point(self, p: Point) -> bool {
    p.x >= self.min_x() && p.x < self.max_x() && p.y >= self.min_y() && p.y < self.max_y()
  }

  /// Returns true if `other` lies entirely within this rect
  ///
  /// An empty `other` is contained if its location is inside.
  pub fn contains_rect(self, other: Rect) -> bool {
    other.min_x() >= self.min_x()
      && other.max_x() <= self.max_x()
      && other.min_y() >= self.min_y()
      && other.max_y() <= self.max_y()
  }

  /// Returns true if the two rects overlap
  pub fn intersects(self, other: Rect) -> bool {
    self.min_x() < other.max_x()
      && other.min_x() < self.max_x()
      && self.min_y() < other.max_y()
      && other.min_y() < self.max_y()
  }

  /// Intersection of two rects, or `None` when they do not overlap
  pub fn intersect(self, other: Rect) -> Option<Rect> {
    let x0 = self.min_x().max(other.min_x());
    let y0 = self.min_y().max(other.min_y());
    let x1 = self.max_x().min(other.max_x());
    let y1 = self.max_y().min(other.max_y());
    if x1 <= x0 || y1 <= y0 {
      return None;
    }
    Some(Rect::from_xywh(x0, y0, x1 - x0, y1 - y0))
  }

  /// Smallest rect containing both rects
  ///
  /// Empty rects do not contribute; the union of an empty rect with a
  /// non-empty one is the non-empty one.
  pub fn union(self, other: Rect) -> Rect {
    if self.is_empty() {
      return other;
    }
    if other.is_empty() {
      return self;
    }
    let x0 = self.min_x().min(other.min_x());
    let y0 = self.min_y().min(other.min_y());
    let x1 = self.max_x().max(other.max_x());
    let y1 = self.max_y().max(other.max_y());
    Rect::from_xywh(x0, y0, x1 - x0, y1 - y0)
  }

  /// Expands the rect by `amount` on every side
  pub fn inflate(self, amount: f32) -> Rect {
    Rect::from_xywh(
      self.min_x() - amount,
      self.min_y() - amount,
      self.width() + 2.0 * amount,
      self.height() + 2.0 * amount,
    )
  }
}

impl fmt::Display for Rect {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.origin, self.size)
  }
}

/// A four-point quadrilateral
///
/// Coordinate mapping carries quads rather than rects so that rotations and
/// perspective do not lose shape information mid-chain. Points are stored in
/// clockwise order starting from the pre-transform top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
  /// Corner points, clockwise from top-left
  pub points: [Point; 4],
}

impl Quad {
  /// Builds the quad covering a rect
  pub fn from_rect(rect: Rect) -> Self {
    Self {
      points: [
        Point::new(rect.min_x(), rect.min_y()),
        Point::new(rect.max_x(), rect.min_y()),
        Point::new(rect.max_x(), rect.max_y()),
        Point::new(rect.min_x(), rect.max_y()),
      ],
    }
  }

  /// Translates every corner by `offset`
  pub fn translate(self, offset: Point) -> Quad {
    Quad {
      points: self.points.map(|p| p.translate(offset)),
    }
  }

  /// Axis-aligned bounding box of the four corners
  pub fn bounding_box(self) -> Rect {
    let xs = self.points.map(|p| p.x);
    let ys = self.points.map(|p| p.y);
    let min_x = xs.iter().copied().fold(f32::INFINITY, f32::min);
    let max_x = xs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let min_y = ys.iter().copied().fold(f32::INFINITY, f32::min);
    let max_y = ys.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    Rect::from_xywh(min_x, min_y, max_x - min_x, max_y - min_y)
  }
}

const PERSPECTIVE_EPSILON: f32 = 1e-6;

/// A 4x4 transform matrix
///
/// Row-major storage, applied to column vectors: `v' = M * v`. Covers the 2D
/// affine cases used by most transforms plus perspective, which projects
/// through the homogeneous `w` component.
///
/// # Examples
///
/// ```
/// use fastpaint::{Point, Transform3D};
///
/// let t = Transform3D::translation(10.0, 20.0);
/// assert_eq!(t.project_point(Point::ZERO), Point::new(10.0, 20.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3D {
  /// Matrix entries, `m[row][col]`
  pub m: [[f32; 4]; 4],
}

impl Transform3D {
  /// The identity transform
  pub const IDENTITY: Self = Self {
    m: [
      [1.0, 0.0, 0.0, 0.0],
      [0.0, 1.0, 0.0, 0.0],
      [0.0, 0.0, 1.0, 0.0],
      [0.0, 0.0, 0.0, 1.0],
    ],
  };

  /// Creates a translation transform
  pub fn translation(x: f32, y: f32) -> Self {
    let mut t = Self::IDENTITY;
    t.m[0][3] = x;
    t.m[1][3] = y;
    t
  }

  /// Creates a scale transform
  pub fn scale(sx: f32, sy: f32) -> Self {
    let mut t = Self::IDENTITY;
    t.m[0][0] = sx;
    t.m[1][1] = sy;
    t
  }

  /// Creates a rotation about the Z axis
  ///
  /// `angle` is in radians, positive = clockwise in screen coordinates.
  pub fn rotation(angle: f32) -> Self {
    let cos = angle.cos();
    let sin = angle.sin();
    let mut t = Self::IDENTITY;
    t.m[0][0] = cos;
    t.m[0][1] = -sin;
    t.m[1][0] = sin;
    t.m[1][1] = cos;
    t
  }

  /// Creates a CSS perspective projection with the given distance
  pub fn perspective(distance: f32) -> Self {
    let mut t = Self::IDENTITY;
    if distance > 0.0 {
      t.m[3][2] = -1.0 / distance;
    }
    t
  }

  /// Returns true if this is exactly the identity matrix
  pub fn is_identity(&self) -> bool {
    *self == Self::IDENTITY
  }

  /// Returns true if the matrix is a pure 2D translation
  pub fn is_translation(&self) -> bool {
    let mut t = Self::IDENTITY;
    t.m[0][3] = self.m[0][3];
    t.m[1][3] = self.m[1][3];
    *self == t
  }

  /// Multiplies two transforms (concatenation)
  ///
  /// The result applies `other` first, then `self`.
  pub fn multiply(&self, other: &Transform3D) -> Transform3D {
    let mut out = [[0.0f32; 4]; 4];
    for (row, out_row) in out.iter_mut().enumerate() {
      for (col, cell) in out_row.iter_mut().enumerate() {
        *cell = (0..4).map(|k| self.m[row][k] * other.m[k][col]).sum();
      }
    }
    Transform3D { m: out }
  }

  /// Applies the transform to a homogeneous point, returning (x, y, z, w)
  pub fn transform_point(&self, x: f32, y: f32, z: f32) -> (f32, f32, f32, f32) {
    let v = [x, y, z, 1.0];
    let apply = |row: &[f32; 4]| row.iter().zip(v.iter()).map(|(m, p)| m * p).sum::<f32>();
    (
      apply(&self.m[0]),
      apply(&self.m[1]),
      apply(&self.m[2]),
      apply(&self.m[3]),
    )
  }

  /// Projects a 2D point through the transform with perspective divide
  pub fn project_point(&self, p: Point) -> Point {
    let (tx, ty, _tz, tw) = self.transform_point(p.x, p.y, 0.0);
    if tw.abs() < PERSPECTIVE_EPSILON || (tw - 1.0).abs() < PERSPECTIVE_EPSILON {
      Point::new(tx, ty)
    } else {
      Point::new(tx / tw, ty / tw)
    }
  }

  /// Projects all four corners of a quad
  pub fn project_quad(&self, quad: Quad) -> Quad {
    Quad {
      points: quad.points.map(|p| self.project_point(p)),
    }
  }

  /// Returns the transform conjugated so it applies about `origin`
  ///
  /// Equivalent to translate(origin) * self * translate(-origin).
  pub fn about_origin(&self, origin: Point) -> Transform3D {
    Transform3D::translation(origin.x, origin.y)
      .multiply(self)
      .multiply(&Transform3D::translation(-origin.x, -origin.y))
  }
}

impl Default for Transform3D {
  fn default() -> Self {
    Self::IDENTITY
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_rect_edges() {
    let r = Rect::from_xywh(10.0, 20.0, 100.0, 50.0);
    assert_eq!(r.min_x(), 10.0);
    assert_eq!(r.max_x(), 110.0);
    assert_eq!(r.min_y(), 20.0);
    assert_eq!(r.max_y(), 70.0);
  }

  #[test]
  fn test_rect_union_ignores_empty() {
    let r = Rect::from_xywh(10.0, 10.0, 20.0, 20.0);
    let empty = Rect::from_xywh(500.0, 500.0, 0.0, 0.0);
    assert_eq!(r.union(empty), r);
    assert_eq!(empty.union(r), r);
  }

  #[test]
  fn test_rect_intersect() {
    let a = Rect::from_xywh(0.0, 0.0, 100.0, 100.0);
    let b = Rect::from_xywh(50.0, 50.0, 100.0, 100.0);
    assert_eq!(a.intersect(b), Some(Rect::from_xywh(50.0, 50.0, 50.0, 50.0)));
    let c = Rect::from_xywh(200.0, 200.0, 10.0, 10.0);
    assert_eq!(a.intersect(c), None);
  }

  #[test]
  fn test_rect_contains_rect() {
    let outer = Rect::from_xywh(0.0, 0.0, 100.0, 100.0);
    let inner = Rect::from_xywh(10.0, 10.0, 20.0, 20.0);
    assert!(outer.contains_rect(inner));
    assert!(!inner.contains_rect(outer));
  }

  #[test]
  fn test_quad_round_trips_rect() {
    let r = Rect::from_xywh(5.0, 6.0, 7.0, 8.0);
    assert_eq!(Quad::from_rect(r).bounding_box(), r);
  }

  #[test]
  fn test_transform_translation() {
    let t = Transform3D::translation(10.0, -5.0);
    assert!(t.is_translation());
    assert_eq!(t.project_point(Point::new(1.0, 1.0)), Point::new(11.0, -4.0));
  }

  #[test]
  fn test_transform_multiply_order() {
    // scale then translate
    let combined = Transform3D::translation(10.0, 0.0).multiply(&Transform3D::scale(2.0, 2.0));
    assert_eq!(
      combined.project_point(Point::new(1.0, 1.0)),
      Point::new(12.0, 2.0)
    );
  }

  #[test]
  fn test_transform_rotation_quarter_turn() {
    let t = Transform3D::rotation(std::f32::consts::FRAC_PI_2);
    let p = t.project_point(Point::new(1.0, 0.0));
    assert!(p.approx_eq(Point::new(0.0, 1.0), 1e-5));
  }

  #[test]
  fn test_perspective_divide() {
    // A point pushed back in Z should converge toward the origin.
    let t = Transform3D::perspective(100.0).multiply(&{
      let mut push = Transform3D::IDENTITY;
      push.m[2][3] = -50.0;
      push
    });
    let p = t.project_point(Point::new(30.0, 0.0));
    assert!(p.x < 30.0);
  }

  #[test]
  fn test_about_origin() {
    let t = Transform3D::scale(2.0, 2.0).about_origin(Point::new(50.0, 50.0));
    // The origin point of the conjugation is a fixed point.
    assert!(t
      .project_point(Point::new(50.0, 50.0))
      .approx_eq(Point::new(50.0, 50.0), 1e-5));
    assert!(t
      .project_point(Point::new(60.0, 50.0))
      .approx_eq(Point::new(70.0, 50.0), 1e-5));
  }
}
