//! End-to-end scenes with known answers.

mod common;

use std::sync::Arc;

use approx::assert_relative_eq;
use lumen_accel::{Accelerator, AcceleratorConfig, Bvh, BvhConfig, KdTree, KdTreeConfig};
use lumen_math::{Bounds3, Point3, Ray, Vec3};
use lumen_shapes::{LinearAggregate, Primitive, SurfaceInteraction, Triangle};

use common::{all_configs, random_rays, random_spheres, sphere_grid};

/// Step offset past each hit before re-casting.
const NUDGE: f64 = 1e-6;

/// Follow a ray through `count` successive surfaces, re-casting from just
/// past each hit. Returns every hit with its distance from the first origin.
fn successive_hits(scene: &dyn Primitive, origin: Point3, dir: Vec3, count: usize) -> Vec<(SurfaceInteraction, f64)> {
    let mut hits = Vec::new();
    let mut ray = Ray::new(origin, dir);
    let mut travelled = 0.0;
    for _ in 0..count {
        let Some(hit) = scene.intersect(&mut ray) else {
            break;
        };
        travelled += hit.t;
        hits.push((hit, travelled));
        let next_origin = hit.point + *ray.direction() * NUDGE;
        travelled += NUDGE;
        ray = Ray::new(next_origin, *ray.direction());
    }
    hits
}

#[test]
fn sphere_grid_diagonal_walk() {
    let prims = sphere_grid(10, 3.0);
    assert_eq!(prims.len(), 1000);

    let origin = Point3::new(-5.0, -5.0, -5.0);
    let dir = Vec3::new(1.0, 1.0, 1.0);
    let oracle = LinearAggregate::new(prims.clone());
    let expected = successive_hits(&oracle, origin, dir, 5);
    assert_eq!(expected.len(), 5);

    let ids: Vec<usize> = expected.iter().map(|(h, _)| h.prim_id).collect();
    assert_eq!(ids, vec![0, 0, 111, 111, 222]);
    assert_relative_eq!(expected[0].0.t, 75.0_f64.sqrt() - 1.0, epsilon = 1e-9);

    for config in [
        AcceleratorConfig::Bvh(BvhConfig::default()),
        AcceleratorConfig::KdTree(KdTreeConfig::default()),
    ] {
        let accel = Accelerator::build(prims.clone(), &config);
        let got = successive_hits(&accel, origin, dir, 5);
        assert_eq!(got.len(), 5, "{config:?}");

        for w in got.windows(2) {
            assert!(w[1].1 > w[0].1, "{config:?}: distances must strictly increase");
        }
        for ((g, gd), (e, ed)) in got.iter().zip(&expected) {
            assert_eq!(g.t, e.t, "{config:?}");
            assert_eq!(g.prim_id, e.prim_id, "{config:?}");
            assert_eq!(gd, ed, "{config:?}");
        }
    }
}

#[test]
fn ray_missing_the_only_box() {
    let tri: Arc<dyn Primitive> = Arc::new(Triangle::new(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        0,
    ));
    let away = Ray::new(Point3::new(5.0, 5.0, 5.0), Vec3::new(1.0, 1.0, 1.0));
    let beside = Ray::new(Point3::new(3.0, 3.0, -1.0), Vec3::new(0.0, 0.0, 1.0));
    let through = Ray::new(Point3::new(0.25, 0.25, -1.0), Vec3::new(0.0, 0.0, 1.0));

    for config in all_configs() {
        let accel = Accelerator::build(vec![tri.clone()], &config);
        for ray in [away, beside] {
            assert!(!accel.intersect_p(&ray), "{config:?}");
            let mut trial = ray;
            assert!(accel.intersect(&mut trial).is_none(), "{config:?}");
            assert_eq!(trial.t_max, f64::INFINITY);
        }
        let mut trial = through;
        let hit = accel.intersect(&mut trial).expect("ray through the triangle");
        assert_relative_eq!(hit.t, 1.0, epsilon = 1e-12);
        assert_eq!(trial.t_max, hit.t);
    }
}

#[test]
fn empty_scene() {
    let bvh = Bvh::new(Vec::new(), &BvhConfig::default());
    let kd = KdTree::new(Vec::new(), &KdTreeConfig::default());

    assert!(bvh.world_bound().is_empty());
    assert!(kd.world_bound().is_empty());
    assert_eq!(bvh.world_bound().volume(), 0.0);
    assert_eq!(bvh.stats().total_primitives, 0);
    assert_eq!(kd.stats().leaves, 1);

    // Empty bounds are the identity for union.
    let unit = Bounds3::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
    assert_eq!(kd.world_bound().union(&unit), unit);

    for ray in random_rays(50, 7) {
        let mut trial = ray;
        assert!(bvh.intersect(&mut trial).is_none());
        assert!(kd.intersect(&mut trial).is_none());
        assert!(!bvh.intersect_p(&ray));
        assert!(!kd.intersect_p(&ray));
    }
}

#[test]
fn expensive_kd_split_becomes_a_leaf() {
    let config = KdTreeConfig {
        isect_cost: 1,
        traversal_cost: 1000,
        ..KdTreeConfig::default()
    };

    let few = random_spheres(10, 61);
    let tree = KdTree::new(few.clone(), &config);
    assert_eq!(tree.nodes().len(), 1);
    assert!(tree.nodes()[0].is_leaf());
    assert_eq!(tree.stats().primitive_refs, 10);

    // Still exact, just slow.
    let oracle = LinearAggregate::new(few);
    for ray in random_rays(100, 62) {
        let mut a = ray;
        let mut b = ray;
        assert_eq!(tree.intersect(&mut a).map(|h| h.t), oracle.intersect(&mut b).map(|h| h.t));
    }

    // Too many primitives for the early exit: three bad refinements in a
    // row end the descent instead.
    let many = KdTree::new(random_spheres(40, 63), &config);
    assert!(many.nodes().len() > 1);
    assert!(many.stats().depth_reached <= 2);
}

#[test]
fn identical_primitives_terminate() {
    let prims: Vec<Arc<dyn Primitive>> = (0..50)
        .map(|i| {
            Arc::new(lumen_shapes::Sphere::new(Point3::new(1.0, 2.0, 3.0), 0.5, i)) as Arc<dyn Primitive>
        })
        .collect();

    for config in all_configs() {
        let accel = Accelerator::build(prims.clone(), &config);
        let mut ray = Ray::new(Point3::new(1.0, 2.0, -10.0), Vec3::new(0.0, 0.0, 1.0));
        let hit = accel.intersect(&mut ray).expect("stacked spheres are hit");
        assert_relative_eq!(hit.t, 12.5, epsilon = 1e-9);
    }
}

#[test]
fn nan_bounds_primitive_is_harmless() {
    let mut prims = random_spheres(50, 71);
    let nan = Arc::new(lumen_shapes::Sphere::new(Point3::new(f64::NAN, 0.0, 0.0), 1.0, 50));
    prims.insert(17, nan as Arc<dyn Primitive>);
    let oracle = LinearAggregate::new(prims.clone());

    for config in all_configs() {
        let accel = Accelerator::build(prims.clone(), &config);
        let bound = accel.world_bound();
        for i in 0..3 {
            assert!(bound.min[i].is_finite() && bound.max[i].is_finite(), "{config:?}");
        }
        assert_eq!(bound, oracle.world_bound(), "{config:?}");

        for ray in random_rays(200, 72) {
            let mut a = ray;
            let mut b = ray;
            assert_eq!(
                accel.intersect(&mut a).map(|h| h.t),
                oracle.intersect(&mut b).map(|h| h.t),
                "{config:?}"
            );
            assert_eq!(accel.intersect_p(&ray), oracle.intersect_p(&ray), "{config:?}");
        }
    }
}
