#![warn(missing_docs)]

//! Math types for the lumen ray tracer.
//!
//! Thin wrappers around nalgebra providing the handful of types the
//! acceleration structures need: points, vectors, axis-aligned bounds and
//! rays with precomputed reciprocal directions.

mod bounds;
mod ray;

pub use bounds::Bounds3;
pub use ray::Ray;

use nalgebra::Vector3;

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A point in 2D parameter space.
pub type Point2 = nalgebra::Point2<f64>;

/// Machine epsilon scaled for conservative rounding-error bounds.
pub const MACHINE_EPSILON: f64 = f64::EPSILON * 0.5;

/// Conservative bound on the relative error accumulated by `n` floating
/// point operations.
#[inline]
pub fn gamma(n: u32) -> f64 {
    let n = f64::from(n) * MACHINE_EPSILON;
    n / (1.0 - n)
}

/// One of the three coordinate axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The x axis.
    X,
    /// The y axis.
    Y,
    /// The z axis.
    Z,
}

impl Axis {
    /// Component index of this axis (0, 1 or 2).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Axis for a component index. Indices wrap modulo 3.
    #[inline]
    pub fn from_index(i: usize) -> Self {
        match i % 3 {
            0 => Axis::X,
            1 => Axis::Y,
            _ => Axis::Z,
        }
    }

    /// The next axis in cyclic order (x → y → z → x).
    #[inline]
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }
}
