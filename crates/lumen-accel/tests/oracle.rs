//! Both structures must agree exactly with a brute-force scan.

mod common;

use lumen_accel::Accelerator;
use lumen_shapes::{LinearAggregate, Primitive};

use common::{all_configs, random_mixed, random_rays, random_spheres, random_triangles};

fn check_against_oracle(prims: Vec<std::sync::Arc<dyn Primitive>>, ray_seed: u64) {
    let oracle = LinearAggregate::new(prims.clone());
    let rays = random_rays(300, ray_seed);

    for config in all_configs() {
        let accel = Accelerator::build(prims.clone(), &config);
        for (i, ray) in rays.iter().enumerate() {
            let mut expected_ray = *ray;
            let expected = oracle.intersect(&mut expected_ray);
            let mut actual_ray = *ray;
            let actual = accel.intersect(&mut actual_ray);

            match (expected, actual) {
                (None, None) => {
                    assert_eq!(actual_ray.t_max, ray.t_max, "{config:?} ray {i}: miss must not touch t_max");
                }
                (Some(e), Some(a)) => {
                    assert_eq!(a.t, e.t, "{config:?} ray {i}: wrong hit distance");
                    assert_eq!(a.point, e.point, "{config:?} ray {i}: wrong hit point");
                    assert_eq!(actual_ray.t_max, a.t, "{config:?} ray {i}: t_max not narrowed");
                }
                (e, a) => panic!("{config:?} ray {i}: oracle {e:?} vs accelerator {a:?}"),
            }

            assert_eq!(
                accel.intersect_p(ray),
                actual.is_some(),
                "{config:?} ray {i}: intersect_p disagrees with intersect"
            );
        }
    }
}

#[test]
fn oracle_random_spheres() {
    for (n, seed) in [(1, 1), (2, 2), (7, 3), (50, 4), (200, 5)] {
        check_against_oracle(random_spheres(n, seed), seed + 100);
    }
}

#[test]
fn oracle_random_triangles() {
    for (n, seed) in [(1, 11), (3, 12), (64, 13), (200, 14)] {
        check_against_oracle(random_triangles(n, seed), seed + 100);
    }
}

#[test]
fn oracle_mixed_scene() {
    check_against_oracle(random_mixed(150, 21), 121);
}

#[test]
fn oracle_respects_initial_t_max() {
    let prims = random_spheres(120, 31);
    let oracle = LinearAggregate::new(prims.clone());
    for config in all_configs() {
        let accel = Accelerator::build(prims.clone(), &config);
        for mut ray in random_rays(200, 131) {
            ray.t_max = 6.0;
            let mut expected_ray = ray;
            let mut actual_ray = ray;
            let expected = oracle.intersect(&mut expected_ray).map(|h| h.t);
            let actual = accel.intersect(&mut actual_ray).map(|h| h.t);
            assert_eq!(actual, expected, "{config:?}");
            assert_eq!(accel.intersect_p(&ray), oracle.intersect_p(&ray), "{config:?}");
        }
    }
}
