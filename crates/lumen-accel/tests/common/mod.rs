//! Scene and ray generators shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use lumen_accel::{AcceleratorConfig, BvhConfig, KdTreeConfig, SplitMethod};
use lumen_math::{Point3, Ray, Vec3};
use lumen_shapes::{Primitive, Sphere, Triangle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

fn random_point(rng: &mut StdRng, extent: f64) -> Point3 {
    Point3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    )
}

/// Spheres of radius 0.1..1.5 scattered in a 20-unit cube.
pub fn random_spheres(n: usize, seed: u64) -> Vec<Arc<dyn Primitive>> {
    let mut rng = rng(seed);
    (0..n)
        .map(|i| {
            let center = random_point(&mut rng, 10.0);
            let radius = rng.gen_range(0.1..1.5);
            Arc::new(Sphere::new(center, radius, i)) as Arc<dyn Primitive>
        })
        .collect()
}

/// Small triangles scattered in a 20-unit cube.
pub fn random_triangles(n: usize, seed: u64) -> Vec<Arc<dyn Primitive>> {
    let mut rng = rng(seed);
    (0..n)
        .map(|i| {
            let a = random_point(&mut rng, 10.0);
            let b = a + random_point(&mut rng, 2.0).coords;
            let c = a + random_point(&mut rng, 2.0).coords;
            Arc::new(Triangle::new(a, b, c, i)) as Arc<dyn Primitive>
        })
        .collect()
}

/// Half spheres, half triangles.
pub fn random_mixed(n: usize, seed: u64) -> Vec<Arc<dyn Primitive>> {
    let mut prims = random_spheres(n / 2, seed);
    prims.extend(random_triangles(n - n / 2, seed.wrapping_add(1)));
    prims
}

/// Unit spheres on an `n`x`n`x`n` lattice with the given spacing. Sphere
/// `(i, j, k)` is centred at `spacing * (i, j, k)` and has id
/// `i * n * n + j * n + k`.
pub fn sphere_grid(n: usize, spacing: f64) -> Vec<Arc<dyn Primitive>> {
    let mut prims = Vec::with_capacity(n * n * n);
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let center = Point3::new(i as f64, j as f64, k as f64) * spacing;
                let id = i * n * n + j * n + k;
                prims.push(Arc::new(Sphere::new(center, 1.0, id)) as Arc<dyn Primitive>);
            }
        }
    }
    prims
}

/// Rays from a shell around the scene aimed through it, with every fourth
/// ray starting inside the scene.
pub fn random_rays(n: usize, seed: u64) -> Vec<Ray> {
    let mut rng = rng(seed);
    (0..n)
        .map(|i| {
            let origin = if i % 4 == 0 {
                random_point(&mut rng, 8.0)
            } else {
                random_point(&mut rng, 15.0)
            };
            let target = random_point(&mut rng, 10.0);
            let mut dir = target - origin;
            if dir.norm() < 1e-6 {
                dir = Vec3::new(1.0, 0.3, 0.2);
            }
            Ray::new(origin, dir)
        })
        .collect()
}

/// Every split method plus a few kd-tree tunings.
pub fn all_configs() -> Vec<AcceleratorConfig> {
    let mut configs = Vec::new();
    for split_method in [SplitMethod::Sah, SplitMethod::Middle, SplitMethod::EqualCounts] {
        for max_prims_in_node in [1, 4] {
            configs.push(AcceleratorConfig::Bvh(BvhConfig {
                max_prims_in_node,
                split_method,
            }));
        }
    }
    configs.push(AcceleratorConfig::KdTree(KdTreeConfig::default()));
    configs.push(AcceleratorConfig::KdTree(KdTreeConfig {
        max_prims: 4,
        empty_bonus: 0.0,
        ..KdTreeConfig::default()
    }));
    configs.push(AcceleratorConfig::KdTree(KdTreeConfig {
        max_depth: 3,
        ..KdTreeConfig::default()
    }));
    configs
}

/// Address of the primitive behind a handle, for identity comparisons.
pub fn handle_addr(p: &Arc<dyn Primitive>) -> usize {
    Arc::as_ptr(p) as *const () as usize
}
