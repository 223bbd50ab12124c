//! Ray representation and ray-box slab tests.

use crate::{gamma, Bounds3, Point3, Vec3};

/// A ray in 3D space with a mutable far limit.
///
/// Queries accept hits with `0 < t < t_max`. Nearest-hit traversal shrinks
/// `t_max` every time a closer hit is found.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    origin: Point3,
    direction: Vec3,
    /// Far end of the valid parametric range.
    pub t_max: f64,
    /// Precomputed reciprocal of direction components for fast box tests.
    inv_direction: Vec3,
    /// Sign of direction components (0 if positive, 1 if negative).
    sign: [usize; 3],
}

impl Ray {
    /// Create a new unbounded ray from origin and direction.
    ///
    /// The direction will be normalized.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        Self::with_t_max(origin, direction, f64::INFINITY)
    }

    /// Create a ray whose valid range ends at `t_max`.
    pub fn with_t_max(origin: Point3, direction: Vec3, t_max: f64) -> Self {
        let dir = direction.normalize();
        let inv = Vec3::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);
        let sign = [
            usize::from(inv.x < 0.0),
            usize::from(inv.y < 0.0),
            usize::from(inv.z < 0.0),
        ];
        Self {
            origin,
            direction: dir,
            t_max,
            inv_direction: inv,
            sign,
        }
    }

    /// Origin point of the ray.
    #[inline]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Unit direction of the ray.
    #[inline]
    pub fn direction(&self) -> &Vec3 {
        &self.direction
    }

    /// Component-wise reciprocal of the direction.
    #[inline]
    pub fn inv_direction(&self) -> &Vec3 {
        &self.inv_direction
    }

    /// Per-axis "direction is negative" flags as corner selectors
    /// (1 if negative, 0 otherwise).
    #[inline]
    pub fn sign(&self) -> [usize; 3] {
        self.sign
    }

    /// True if the direction is negative along axis `i`.
    #[inline]
    pub fn dir_is_neg(&self, i: usize) -> bool {
        self.sign[i] == 1
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction
    }

    /// Clip the ray against a box using the slab method.
    ///
    /// Returns the parametric overlap `(t0, t1)` of the box with `[0, t_max]`,
    /// or `None` if they are disjoint. Far slab distances are widened by
    /// `1 + 2 * gamma(3)` so rounding never rejects a grazing hit.
    pub fn intersect_bounds(&self, bounds: &Bounds3) -> Option<(f64, f64)> {
        if bounds.is_empty() {
            return None;
        }
        let mut t0 = 0.0;
        let mut t1 = self.t_max;
        for i in 0..3 {
            let mut t_near = (bounds.min[i] - self.origin[i]) * self.inv_direction[i];
            let mut t_far = (bounds.max[i] - self.origin[i]) * self.inv_direction[i];
            if t_near > t_far {
                std::mem::swap(&mut t_near, &mut t_far);
            }
            t_far *= 1.0 + 2.0 * gamma(3);
            // NaN from a zero direction on a slab boundary leaves t0/t1 alone.
            if t_near > t0 {
                t0 = t_near;
            }
            if t_far < t1 {
                t1 = t_far;
            }
            if t0 > t1 {
                return None;
            }
        }
        Some((t0, t1))
    }

    /// Boolean slab test using the precomputed reciprocal direction and
    /// sign flags to pick near and far faces without branching on them.
    #[inline]
    pub fn hits_bounds(&self, bounds: &Bounds3) -> bool {
        let widen = 1.0 + 2.0 * gamma(3);
        let o = &self.origin;
        let inv = &self.inv_direction;

        let mut t_min = (bounds.corner(self.sign[0]).x - o.x) * inv.x;
        let mut t_max = (bounds.corner(1 - self.sign[0]).x - o.x) * inv.x * widen;
        let ty_min = (bounds.corner(self.sign[1]).y - o.y) * inv.y;
        let ty_max = (bounds.corner(1 - self.sign[1]).y - o.y) * inv.y * widen;

        if t_min > ty_max || ty_min > t_max {
            return false;
        }
        if ty_min > t_min {
            t_min = ty_min;
        }
        if ty_max < t_max {
            t_max = ty_max;
        }

        let tz_min = (bounds.corner(self.sign[2]).z - o.z) * inv.z;
        let tz_max = (bounds.corner(1 - self.sign[2]).z - o.z) * inv.z * widen;

        if t_min > tz_max || tz_min > t_max {
            return false;
        }
        if tz_min > t_min {
            t_min = tz_min;
        }
        if tz_max < t_max {
            t_max = tz_max;
        }

        t_min < self.t_max && t_max > 0.0
    }
}
