//! Geometric and statistical primitives for layout analysis.
//!
//! Everything in this module is a pure function over [`Rect`] values or
//! slices of floats. The layout pipeline and both table detectors are
//! built on these primitives, so their conventions matter: coordinates
//! are top-left origin PDF points, overlap ratios are symmetric and lie
//! in `[0, 1]`, and axis distances return `f64::INFINITY` when the two
//! rectangles do not share a projection on the perpendicular axis.

use serde::Serialize;

/// A 2D point in page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An RGBA colour with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgba {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel
    pub a: u8,
}

impl Rgba {
    /// Opaque black, the default fill colour when the host cannot report one.
    pub fn black() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 255,
        }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::black()
    }
}

/// An axis-aligned bounding box in top-left page coordinates.
///
/// Invariant after ingest normalisation: `x0 <= x1` and `y0 <= y1`.
///
/// # Examples
///
/// ```
/// use pdf_markdown::geometry::Rect;
///
/// let r = Rect::new(10.0, 20.0, 110.0, 70.0);
/// assert_eq!(r.width(), 100.0);
/// assert_eq!(r.height(), 50.0);
/// assert_eq!(r.center_x(), 60.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    /// Left edge
    pub x0: f64,
    /// Top edge
    pub y0: f64,
    /// Right edge
    pub x1: f64,
    /// Bottom edge
    pub y1: f64,
}

impl Rect {
    /// Create a rectangle from its corner coordinates.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Horizontal centre.
    pub fn center_x(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }

    /// Vertical centre.
    pub fn center_y(&self) -> f64 {
        (self.y0 + self.y1) / 2.0
    }

    /// Centre point.
    pub fn center(&self) -> Point {
        Point::new(self.center_x(), self.center_y())
    }

    /// Area of the rectangle.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Grow the rectangle by `amount` in every direction.
    pub fn expand(&self, amount: f64) -> Rect {
        Rect {
            x0: self.x0 - amount,
            y0: self.y0 - amount,
            x1: self.x1 + amount,
            y1: self.y1 + amount,
        }
    }

    /// Whether the two rectangles overlap (shared interior, not mere touch).
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.x1 <= other.x0
            || other.x1 <= self.x0
            || self.y1 <= other.y0
            || other.y1 <= self.y0)
    }

    /// Whether `self` fully contains `other`.
    pub fn contains(&self, other: &Rect) -> bool {
        self.x0 <= other.x0 && self.y0 <= other.y0 && self.x1 >= other.x1 && self.y1 >= other.y1
    }

    /// Whether the point lies inside the rectangle (edges inclusive).
    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.x0 && p.x <= self.x1 && p.y >= self.y0 && p.y <= self.y1
    }

    /// Intersection area with `other`; 0 when disjoint.
    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let w = self.x1.min(other.x1) - self.x0.max(other.x0);
        let h = self.y1.min(other.y1) - self.y0.max(other.y0);
        if w <= 0.0 || h <= 0.0 {
            return 0.0;
        }
        w * h
    }
}

/// Merge two rectangles into their bounding box.
pub fn merge_rects(a: Rect, b: Rect) -> Rect {
    a.union(&b)
}

/// Ratio of vertical overlap between two rectangles.
///
/// This is the "visually on the same line" measure: the height of the
/// shared y-span divided by the smaller of the two heights, so a value
/// of 1 means one rectangle's vertical span is contained in the
/// other's. Returns 0 when the spans are disjoint. Symmetric in its
/// arguments.
pub fn overlap_ratio_h(a: &Rect, b: &Rect) -> f64 {
    let min_height = a.height().min(b.height());
    if min_height <= 0.0 {
        return 0.0;
    }

    // Four disjoint cases: containment either way, then the two straddles.
    let overlap = if a.y0 >= b.y0 && a.y1 <= b.y1 {
        a.height()
    } else if b.y0 >= a.y0 && b.y1 <= a.y1 {
        b.height()
    } else if a.y0 < b.y0 && a.y1 > b.y0 {
        a.y1 - b.y0
    } else if b.y0 < a.y0 && b.y1 > a.y0 {
        b.y1 - a.y0
    } else {
        return 0.0;
    };

    (overlap / min_height).clamp(0.0, 1.0)
}

/// Ratio of horizontal overlap between two rectangles.
///
/// The x-axis analogue of [`overlap_ratio_h`]: shared x-span width over
/// the smaller width. Used to decide whether two segments belong to the
/// same table column.
pub fn overlap_ratio_v(a: &Rect, b: &Rect) -> f64 {
    let min_width = a.width().min(b.width());
    if min_width <= 0.0 {
        return 0.0;
    }

    let overlap = if a.x0 >= b.x0 && a.x1 <= b.x1 {
        a.width()
    } else if b.x0 >= a.x0 && b.x1 <= a.x1 {
        b.width()
    } else if a.x0 < b.x0 && a.x1 > b.x0 {
        a.x1 - b.x0
    } else if b.x0 < a.x0 && b.x1 > a.x0 {
        b.x1 - a.x0
    } else {
        return 0.0;
    };

    (overlap / min_width).clamp(0.0, 1.0)
}

/// Horizontal gap between two rectangles that share a vertical projection.
///
/// Order-independent: the gap between the left rectangle's right edge
/// and the right rectangle's left edge, clamped at 0 for overlapping
/// rects. Returns `f64::INFINITY` when the rectangles do not overlap
/// vertically at all, so they can never be clustered on this axis.
pub fn horizontal_distance(a: &Rect, b: &Rect) -> f64 {
    if overlap_ratio_h(a, b) <= 0.0 {
        return f64::INFINITY;
    }

    let gap = if a.x0 <= b.x0 {
        b.x0 - a.x1
    } else {
        a.x0 - b.x1
    };
    gap.max(0.0)
}

/// Vertical gap between two rectangles that share a horizontal projection.
///
/// The y-axis analogue of [`horizontal_distance`].
pub fn vertical_distance(a: &Rect, b: &Rect) -> f64 {
    if overlap_ratio_v(a, b) <= 0.0 {
        return f64::INFINITY;
    }

    let gap = if a.y0 <= b.y0 {
        b.y0 - a.y1
    } else {
        a.y0 - b.y1
    };
    gap.max(0.0)
}

/// Median of a sample. Even-length samples average the two middle
/// elements; the empty sample yields 0.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(crate::utils::safe_float_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Arithmetic mean; 0 for the empty sample.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0 for the empty sample.
pub fn stdev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let avg = mean(values);
    let sum_squares: f64 = values.iter().map(|v| (v - avg) * (v - avg)).sum();
    (sum_squares / values.len() as f64).sqrt()
}

/// Restrict a value to `[lo, hi]`.
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    value.clamp(lo, hi)
}

/// Normalise an angle in degrees to `[0, 360)`.
pub fn normalize_angle(degrees: f64) -> f64 {
    let mut angle = degrees % 360.0;
    if angle < 0.0 {
        angle += 360.0;
    }
    angle
}

/// Round an angle to the nearest multiple of `step` degrees.
pub fn quantize_angle(degrees: f64, step: f64) -> f64 {
    (degrees / step).round() * step
}

/// Reading direction of a text run, derived from its rotation angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReadingDirection {
    /// Left to right (horizontal text)
    Ltr,
    /// Right to left (text rotated 180 degrees)
    Rtl,
    /// Top to bottom (text rotated 90 degrees)
    Ttb,
    /// Bottom to top (text rotated 270 degrees)
    Btt,
}

impl ReadingDirection {
    /// Whether lines run vertically (glyph columns rather than rows).
    pub fn is_vertical(&self) -> bool {
        matches!(self, ReadingDirection::Ttb | ReadingDirection::Btt)
    }
}

/// Infer the reading direction from a rotation angle in degrees.
///
/// `[0, 45) ∪ [315, 360)` → Ltr, `[45, 135)` → Ttb, `[135, 225)` → Rtl,
/// `[225, 315)` → Btt.
pub fn infer_reading_direction(degrees: f64) -> ReadingDirection {
    let angle = normalize_angle(degrees);
    if !(45.0..315.0).contains(&angle) {
        ReadingDirection::Ltr
    } else if angle < 135.0 {
        ReadingDirection::Ttb
    } else if angle < 225.0 {
        ReadingDirection::Rtl
    } else {
        ReadingDirection::Btt
    }
}

/// Rotate a point around the origin by `degrees`.
pub fn rotate_point(x: f64, y: f64, degrees: f64) -> (f64, f64) {
    let rad = degrees.to_radians();
    let (sin, cos) = rad.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

/// Rotate a rectangle around the origin by `degrees`.
///
/// Returns the axis-aligned bounding box of the four rotated corners.
pub fn rotate_rect(rect: &Rect, degrees: f64) -> Rect {
    let corners = [
        rotate_point(rect.x0, rect.y0, degrees),
        rotate_point(rect.x1, rect.y0, degrees),
        rotate_point(rect.x1, rect.y1, degrees),
        rotate_point(rect.x0, rect.y1, degrees),
    ];

    let mut out = Rect::new(
        f64::INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NEG_INFINITY,
    );
    for (x, y) in corners {
        out.x0 = out.x0.min(x);
        out.y0 = out.y0.min(y);
        out.x1 = out.x1.max(x);
        out.y1 = out.y1.max(y);
    }
    out
}
