//! Axis-aligned bounding boxes.

use crate::{Axis, Point3, Vec3};

/// Axis-aligned bounding box in 3D.
///
/// The empty box has `min = +inf` and `max = -inf` on every axis, so it is
/// the identity for [`Bounds3::union`] and never intersects a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Bounds3 {
    /// Create bounds spanning two corner points, in any order.
    pub fn new(a: Point3, b: Point3) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Create an empty (inverted) box suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Degenerate box containing a single point.
    pub fn from_point(p: Point3) -> Self {
        Self { min: p, max: p }
    }

    /// True if the box contains no points.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this box to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &Bounds3) -> Bounds3 {
        Bounds3 {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// Smallest box containing `self` and `p`.
    pub fn union_point(&self, p: &Point3) -> Bounds3 {
        let mut b = *self;
        b.include_point(p);
        b
    }

    /// Vector from `min` to `max`. Zero for an empty box.
    pub fn diagonal(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::zeros();
        }
        self.max - self.min
    }

    /// Midpoint of the box.
    pub fn centroid(&self) -> Point3 {
        Point3::from((self.min.coords + self.max.coords) * 0.5)
    }

    /// Total surface area. Zero for an empty or flat-and-thin box.
    pub fn surface_area(&self) -> f64 {
        let d = self.diagonal();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Enclosed volume. Zero for an empty box.
    pub fn volume(&self) -> f64 {
        let d = self.diagonal();
        d.x * d.y * d.z
    }

    /// Axis along which the box is widest. Ties go to the later axis.
    pub fn maximum_extent(&self) -> Axis {
        let d = self.diagonal();
        if d.x > d.y && d.x > d.z {
            Axis::X
        } else if d.y > d.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Position of `p` relative to the box corners: `(0,0,0)` at `min`,
    /// `(1,1,1)` at `max`. Axes with zero extent report 0.
    pub fn offset(&self, p: &Point3) -> Vec3 {
        let mut o = p - self.min;
        for i in 0..3 {
            let extent = self.max[i] - self.min[i];
            if extent > 0.0 {
                o[i] /= extent;
            } else {
                o[i] = 0.0;
            }
        }
        o
    }

    /// True if `other` lies entirely inside `self` (boundaries included).
    /// The empty box is contained in every box.
    pub fn contains(&self, other: &Bounds3) -> bool {
        if other.is_empty() {
            return true;
        }
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.min.z <= other.min.z
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
            && self.max.z >= other.max.z
    }

    /// Test if two boxes overlap (touching counts as overlap).
    pub fn overlaps(&self, other: &Bounds3) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Corner selector: `0` is `min`, `1` is `max`.
    #[inline]
    pub fn corner(&self, i: usize) -> &Point3 {
        if i == 0 {
            &self.min
        } else {
            &self.max
        }
    }
}

impl Default for Bounds3 {
    fn default() -> Self {
        Self::empty()
    }
}
