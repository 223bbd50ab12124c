//! Ray-sphere intersection (quadratic equation).

use std::f64::consts::PI;

use lumen_math::{Bounds3, Point2, Point3, Ray, Vec3};

use crate::{Primitive, SurfaceInteraction};

/// A full sphere in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Center of the sphere.
    pub center: Point3,
    /// Radius of the sphere.
    pub radius: f64,
    /// Id reported in [`SurfaceInteraction::prim_id`].
    pub id: usize,
}

impl Sphere {
    /// Create a sphere.
    pub fn new(center: Point3, radius: f64, id: usize) -> Self {
        Self { center, radius, id }
    }

    /// Nearest root of the ray/sphere quadratic inside `(0, ray.t_max)`.
    fn nearest_t(&self, ray: &Ray) -> Option<f64> {
        let oc = ray.origin() - self.center;
        let d = ray.direction();

        // Quadratic: |oc + t*d|^2 = r^2
        let a = d.dot(d);
        let half_b = oc.dot(d);
        let c = oc.dot(&oc) - self.radius * self.radius;

        let discriminant = half_b * half_b - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        let t0 = (-half_b - sqrt_disc) / a;
        let t1 = (-half_b + sqrt_disc) / a;

        [t0, t1].into_iter().find(|&t| t > 0.0 && t < ray.t_max)
    }

    /// Compute the (u, v) surface parameters for a point on the sphere.
    ///
    /// u = longitude / 2π in [0, 1), v = colatitude / π in [0, 1].
    fn uv(&self, normal: &Vec3) -> Point2 {
        let mut phi = normal.y.atan2(normal.x);
        if phi < 0.0 {
            phi += 2.0 * PI;
        }
        let theta = normal.z.clamp(-1.0, 1.0).acos();
        Point2::new(phi / (2.0 * PI), theta / PI)
    }
}

impl Primitive for Sphere {
    fn world_bound(&self) -> Bounds3 {
        let r = Vec3::new(self.radius, self.radius, self.radius);
        Bounds3::new(self.center - r, self.center + r)
    }

    fn intersect(&self, ray: &mut Ray) -> Option<SurfaceInteraction> {
        let t = self.nearest_t(ray)?;
        let point = ray.at(t);
        let normal = (point - self.center) / self.radius;
        ray.t_max = t;
        Some(SurfaceInteraction {
            t,
            point,
            normal,
            uv: self.uv(&normal),
            prim_id: self.id,
        })
    }

    fn intersect_p(&self, ray: &Ray) -> bool {
        self.nearest_t(ray).is_some()
    }
}
