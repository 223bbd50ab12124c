//! Ray-triangle intersection (Möller-Trumbore).

use lumen_math::{Bounds3, Point2, Point3, Ray, Vec3};

use crate::{Primitive, SurfaceInteraction};

/// Determinants smaller than this are treated as a ray parallel to the plane.
const PARALLEL_EPSILON: f64 = 1e-12;

/// A single triangle in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Vertex positions.
    pub vertices: [Point3; 3],
    /// Id reported in [`SurfaceInteraction::prim_id`].
    pub id: usize,
}

impl Triangle {
    /// Create a triangle.
    pub fn new(a: Point3, b: Point3, c: Point3, id: usize) -> Self {
        Self {
            vertices: [a, b, c],
            id,
        }
    }

    /// Returns `(t, u, v)` with barycentrics `u`, `v` for a hit inside
    /// `(0, ray.t_max)`.
    fn hit(&self, ray: &Ray) -> Option<(f64, f64, f64)> {
        let [p0, p1, p2] = self.vertices;
        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let d = ray.direction();

        let pvec = d.cross(&e2);
        let det = e1.dot(&pvec);
        if det.abs() < PARALLEL_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let tvec = ray.origin() - p0;
        let u = tvec.dot(&pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let qvec = tvec.cross(&e1);
        let v = d.dot(&qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = e2.dot(&qvec) * inv_det;
        if t > 0.0 && t < ray.t_max {
            Some((t, u, v))
        } else {
            None
        }
    }

    fn normal(&self) -> Vec3 {
        let [p0, p1, p2] = self.vertices;
        (p1 - p0).cross(&(p2 - p0)).normalize()
    }
}

impl Primitive for Triangle {
    fn world_bound(&self) -> Bounds3 {
        let [p0, p1, p2] = self.vertices;
        Bounds3::new(p0, p1).union_point(&p2)
    }

    fn intersect(&self, ray: &mut Ray) -> Option<SurfaceInteraction> {
        let (t, u, v) = self.hit(ray)?;
        ray.t_max = t;
        Some(SurfaceInteraction {
            t,
            point: ray.at(t),
            normal: self.normal(),
            uv: Point2::new(u, v),
            prim_id: self.id,
        })
    }

    fn intersect_p(&self, ray: &Ray) -> bool {
        self.hit(ray).is_some()
    }
}
