//! Scene description files.
//!
//! A scene file is TOML with a `[scene]` table naming a procedural scene, an
//! optional `[accelerator]` table, and an optional `[camera]` table:
//!
//! ```toml
//! [scene]
//! kind = "sphere_grid"
//! size = 10
//! spacing = 3.0
//!
//! [accelerator]
//! type = "kdtree"
//! isect_cost = 80
//!
//! [camera]
//! width = 128
//! height = 96
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use lumen_accel::AcceleratorConfig;
use lumen_math::{Bounds3, Point3, Ray, Vec3};
use lumen_shapes::{Primitive, Sphere, Triangle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

/// Whole scene file.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneFile {
    pub scene: SceneConfig,
    #[serde(default)]
    pub accelerator: AcceleratorConfig,
    #[serde(default)]
    pub camera: CameraConfig,
}

impl SceneFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading scene file {}", path.display()))?;
        let file: SceneFile =
            toml::from_str(&text).with_context(|| format!("parsing scene file {}", path.display()))?;
        file.accelerator
            .validate()
            .context("invalid [accelerator] table")?;
        file.scene.validate()?;
        Ok(file)
    }
}

/// Procedural scene generators.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SceneConfig {
    /// Unit spheres on a `size`^3 lattice.
    SphereGrid {
        size: usize,
        #[serde(default = "default_spacing")]
        spacing: f64,
        #[serde(default = "default_radius")]
        radius: f64,
    },
    /// Small random triangles in a cube of half-width `extent`.
    RandomTriangles {
        count: usize,
        #[serde(default)]
        seed: u64,
        #[serde(default = "default_extent")]
        extent: f64,
    },
}

fn default_spacing() -> f64 {
    3.0
}

fn default_radius() -> f64 {
    1.0
}

fn default_extent() -> f64 {
    50.0
}

impl SceneConfig {
    fn validate(&self) -> Result<()> {
        match *self {
            SceneConfig::SphereGrid { radius, spacing, .. } => {
                anyhow::ensure!(radius > 0.0, "sphere_grid radius must be positive, got {radius}");
                anyhow::ensure!(spacing.is_finite(), "sphere_grid spacing must be finite");
            }
            SceneConfig::RandomTriangles { extent, .. } => {
                anyhow::ensure!(extent > 0.0, "random_triangles extent must be positive, got {extent}");
            }
        }
        Ok(())
    }

    /// Generate the primitives.
    pub fn build(&self) -> Vec<Arc<dyn Primitive>> {
        match *self {
            SceneConfig::SphereGrid { size, spacing, radius } => {
                let mut prims: Vec<Arc<dyn Primitive>> = Vec::with_capacity(size * size * size);
                for i in 0..size {
                    for j in 0..size {
                        for k in 0..size {
                            let center = Point3::new(i as f64, j as f64, k as f64) * spacing;
                            let id = prims.len();
                            prims.push(Arc::new(Sphere::new(center, radius, id)));
                        }
                    }
                }
                prims
            }
            SceneConfig::RandomTriangles { count, seed, extent } => {
                let mut rng = StdRng::seed_from_u64(seed);
                let edge = extent / 25.0;
                (0..count)
                    .map(|i| {
                        let a = random_point(&mut rng, extent);
                        let b = a + random_point(&mut rng, edge).coords;
                        let c = a + random_point(&mut rng, edge).coords;
                        Arc::new(Triangle::new(a, b, c, i)) as Arc<dyn Primitive>
                    })
                    .collect()
            }
        }
    }
}

/// Pinhole camera placed in front of the scene, looking down +z.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
    /// Vertical field of view in degrees.
    pub fov: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 160,
            height: 120,
            fov: 45.0,
        }
    }
}

impl CameraConfig {
    /// One primary ray per pixel, framing `bounds`.
    pub fn primary_rays(&self, bounds: &Bounds3) -> Vec<Ray> {
        if bounds.is_empty() || self.width == 0 || self.height == 0 {
            return Vec::new();
        }
        let center = bounds.centroid();
        let radius = 0.5 * bounds.diagonal().norm();
        let half_fov = 0.5 * self.fov.to_radians();
        let distance = radius / half_fov.tan().max(1e-3) + radius;
        let eye = center - Vec3::new(0.0, 0.0, distance.max(1.0));

        let aspect = f64::from(self.width) / f64::from(self.height);
        let half_h = half_fov.tan();
        let half_w = half_h * aspect;

        let mut rays = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                let u = ((f64::from(x) + 0.5) / f64::from(self.width)) * 2.0 - 1.0;
                let v = 1.0 - ((f64::from(y) + 0.5) / f64::from(self.height)) * 2.0;
                rays.push(Ray::new(eye, Vec3::new(u * half_w, v * half_h, 1.0)));
            }
        }
        rays
    }
}

fn random_point(rng: &mut StdRng, extent: f64) -> Point3 {
    Point3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    )
}

/// Rays between random points of a box twice the size of `bounds`.
pub fn random_rays(bounds: &Bounds3, count: usize, seed: u64) -> Vec<Ray> {
    if bounds.is_empty() {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let center = bounds.centroid();
    let extent = bounds.diagonal().amax().max(1.0);
    (0..count)
        .map(|_| {
            let origin = center + random_point(&mut rng, extent).coords;
            let target = center + random_point(&mut rng, 0.5 * extent).coords;
            let dir = target - origin;
            let dir = if dir.norm() > 1e-9 { dir } else { Vec3::new(0.0, 0.0, 1.0) };
            Ray::new(origin, dir)
        })
        .collect()
}
