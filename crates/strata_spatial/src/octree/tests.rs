use super::*;
use crate::math::Ray;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn sphere(x: f32, y: f32, z: f32, radius: f32) -> BoundingSphere {
    BoundingSphere::new(Vec3::new(x, y, z), radius)
}

fn sorted(mut ids: Vec<SphereId>) -> Vec<SphereId> {
    ids.sort();
    ids
}

fn brute_force_ray(tree: &Octree, ray: &Ray) -> Vec<SphereId> {
    sorted(
        tree.spheres()
            .filter(|(_, s)| ray.intersects_sphere(s))
            .map(|(id, _)| id)
            .collect(),
    )
}

fn assert_valid(tree: &Octree) {
    if let Err(err) = tree.validate() {
        panic!("invariant broken: {err}");
    }
}

// =============================================================================
// Insertion
// =============================================================================

#[test]
fn test_empty_tree() {
    let tree = Octree::new();
    assert!(tree.is_empty());
    assert_eq!(tree.root(), None);
    assert_eq!(tree.node_count(), 0);
    assert_valid(&tree);
}

#[test]
fn test_first_sphere_creates_root_leaf() {
    let mut tree = Octree::new();
    let id = tree.add_sphere(sphere(1.0, 2.0, 3.0, 2.5));

    // The cell is rounded up to a power of two and snapped around the sphere
    let root = tree.root_octant().unwrap();
    assert!(root.is_leaf());
    assert_eq!(root.center(), Vec3::new(0.0, 4.0, 4.0));
    assert_eq!(root.half_size(), 4.0);
    assert!(root.contains(Vec3::new(1.0, 2.0, 3.0)));
    assert_eq!(root.data_position(), Some(Vec3::new(1.0, 2.0, 3.0)));
    assert_eq!(root.max_radius(), 2.5);
    assert_eq!(tree.leaf_of(id), tree.root());
    assert_valid(&tree);
}

#[test]
fn test_root_leaf_uses_configured_size() {
    let mut tree = Octree::with_config(OctreeConfig::new(8.0));
    tree.add_sphere(sphere(0.0, 0.0, 0.0, 0.5));
    assert_eq!(tree.root_octant().unwrap().half_size(), 8.0);
}

#[test]
fn test_coincident_spheres_share_leaf() {
    let mut tree = Octree::new();
    let a = tree.add_sphere(sphere(0.25, 0.25, 0.25, 0.5));
    let b = tree.add_sphere(sphere(0.25, 0.25, 0.25, 1.5));

    assert_eq!(tree.node_count(), 1);
    assert_eq!(tree.leaf_of(a), tree.leaf_of(b));
    let root = tree.root_octant().unwrap();
    assert_eq!(root.spheres(), &[a, b]);
    assert_eq!(root.max_radius(), 1.5);
    assert_valid(&tree);
}

#[test]
fn test_split_pushes_until_separated() {
    let mut tree = Octree::new();
    let a = tree.add_sphere(sphere(0.0, 0.0, 0.0, 0.5));
    let b = tree.add_sphere(sphere(0.5, 0.5, 0.5, 0.5));

    // Both positions address slot 7 of the root, so an intermediate branch
    // is needed before they part ways
    assert_eq!(tree.len(), 2);
    assert_eq!(tree.node_count(), 4);
    assert_ne!(tree.leaf_of(a), tree.leaf_of(b));

    let root = tree.root_octant().unwrap();
    assert_eq!(root.total_count(), 2);
    assert_eq!(root.leaf_count(), 2);
    assert_eq!(root.children().count(), 1);
    assert_valid(&tree);
}

#[test]
fn test_root_expands_to_fit() {
    let mut tree = Octree::new();
    let a = tree.add_sphere(sphere(0.0, 0.0, 0.0, 1.0));
    let mut last_half = tree.root_octant().unwrap().half_size();

    for (i, x) in [3.0, -20.0, 150.0, -1000.0].into_iter().enumerate() {
        tree.add_sphere(sphere(x, x * 0.5, -x, 1.0));
        let root = tree.root_octant().unwrap();
        assert!(root.half_size() >= last_half, "root shrank at step {i}");
        assert!(root.contains(Vec3::new(x, x * 0.5, -x)));
        last_half = root.half_size();
        assert_valid(&tree);
    }

    assert!(tree.leaf_at(Vec3::ZERO).is_some());
    assert_eq!(tree.leaf_at(Vec3::ZERO), tree.leaf_of(a));
    // Doubling from 1.0 keeps the half-size a power of two
    let mut half = last_half;
    while half > 1.0 {
        half /= 2.0;
    }
    assert_eq!(half, 1.0);
}

/// Every child sits exactly where its parent's subdivision puts it
fn assert_exact_geometry(tree: &Octree) {
    tree.walk_tree(|_, octant| {
        for (index, child) in octant.children() {
            let child = tree.node(child).unwrap();
            let (center, half_size) = octant.child_geometry(index);
            assert_eq!(child.center(), center, "child {index} center");
            assert_eq!(child.half_size(), half_size, "child {index} half-size");
        }
    });
}

#[test]
fn test_rehomed_root_keeps_exact_geometry() {
    let mut tree = Octree::new();
    tree.add_sphere(sphere(0.1, 0.1, 0.1, 0.25));
    tree.add_sphere(sphere(0.6, 0.6, 0.6, 0.25));
    assert!(!tree.root_octant().unwrap().is_leaf());

    // Grows the branch root twice, rehoming the old root as a child
    tree.add_sphere(sphere(5.0, 5.0, 5.0, 0.25));
    let root = tree.root_octant().unwrap();
    assert_eq!(root.center(), Vec3::new(3.0, 3.0, 3.0));
    assert_eq!(root.half_size(), 4.0);

    assert_exact_geometry(&tree);
    assert_valid(&tree);
}

#[test]
fn test_random_positions_keep_exact_geometry() {
    let mut rng = StdRng::seed_from_u64(0xd1ad);
    let mut tree = Octree::new();
    for _ in 0..200 {
        let center = Vec3::new(
            rng.random_range(-0.3..0.3),
            rng.random_range(-0.3..0.3),
            rng.random_range(-0.3..0.3),
        ) * rng.random_range(1.0_f32..400.0);
        tree.add_sphere(BoundingSphere::new(center, 0.1));
    }
    assert_exact_geometry(&tree);
    assert_valid(&tree);
}

#[test]
fn test_add_spheres_keeps_order() {
    let mut tree = Octree::new();
    let ids = tree.add_spheres((0..10).map(|i| sphere(i as f32 * 2.0, 0.0, 0.0, 0.5)));
    assert_eq!(ids.len(), 10);
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(tree.sphere(*id).unwrap().center.x, i as f32 * 2.0);
    }
    assert_valid(&tree);
}

#[test]
fn test_depth_limit_stores_as_coincident() {
    let mut tree = Octree::with_config(OctreeConfig::default().with_max_depth(2));
    let a = tree.add_sphere(sphere(0.0, 0.0, 0.0, 0.1));
    let b = tree.add_sphere(sphere(0.001, 0.001, 0.001, 0.1));

    assert_eq!(tree.node_count(), 1);
    assert_eq!(tree.leaf_of(a), tree.leaf_of(b));
    assert_valid(&tree);

    let ray = Ray::from_points(Vec3::new(0.001, 0.001, 10.0), Vec3::new(0.001, 0.001, -10.0));
    assert_eq!(tree.spheres_on_ray(&ray).len(), 2);
}

// =============================================================================
// Removal
// =============================================================================

#[test]
fn test_remove_collapses_to_single_leaf() {
    let mut tree = Octree::new();
    let a = tree.add_sphere(sphere(0.0, 0.0, 0.0, 1.0));
    let b = tree.add_sphere(sphere(3.0, 0.0, 0.0, 2.0));
    assert!(!tree.root_octant().unwrap().is_leaf());

    assert_eq!(tree.remove_sphere(b), Some(sphere(3.0, 0.0, 0.0, 2.0)));
    assert_eq!(tree.node_count(), 1);
    let root = tree.root_octant().unwrap();
    assert!(root.is_leaf());
    assert_eq!(root.spheres(), &[a]);
    assert_eq!(root.max_radius(), 1.0);
    assert_valid(&tree);

    assert!(tree.remove_sphere(a).is_some());
    assert_eq!(tree.root(), None);
    assert_eq!(tree.node_count(), 0);
    assert_valid(&tree);
}

#[test]
fn test_remove_collapses_intermediate_branches() {
    let mut tree = Octree::new();
    let a = tree.add_sphere(sphere(0.0, 0.0, 0.0, 0.5));
    let b = tree.add_sphere(sphere(0.5, 0.5, 0.5, 0.5));
    assert_eq!(tree.node_count(), 4);

    tree.remove_sphere(b);
    assert_eq!(tree.node_count(), 1);
    assert_eq!(tree.leaf_of(a), tree.root());
    assert_valid(&tree);
}

#[test]
fn test_remove_one_of_coincident() {
    let mut tree = Octree::new();
    let a = tree.add_sphere(sphere(1.0, 1.0, 1.0, 3.0));
    let b = tree.add_sphere(sphere(1.0, 1.0, 1.0, 1.0));

    tree.remove_sphere(a);
    let root = tree.root_octant().unwrap();
    assert_eq!(root.spheres(), &[b]);
    assert_eq!(root.max_radius(), 1.0);
    assert_valid(&tree);
}

#[test]
fn test_remove_twice_is_noop() {
    let mut tree = Octree::new();
    let a = tree.add_sphere(sphere(0.0, 0.0, 0.0, 1.0));
    tree.add_sphere(sphere(5.0, 5.0, 5.0, 1.0));

    assert!(tree.remove_sphere(a).is_some());
    let nodes = tree.node_count();
    assert!(tree.remove_sphere(a).is_none());
    assert!(tree.remove_sphere(SphereId::default()).is_none());
    assert_eq!(tree.node_count(), nodes);
    assert_eq!(tree.len(), 1);
    assert_valid(&tree);
}

#[test]
fn test_clear() {
    let mut tree = Octree::new();
    tree.add_spheres((0..20).map(|i| sphere(i as f32, 0.0, 0.0, 0.5)));
    tree.clear();
    assert!(tree.is_empty());
    assert_eq!(tree.node_count(), 0);
    assert_valid(&tree);
}

// =============================================================================
// Update
// =============================================================================

#[test]
fn test_update_radius_only() {
    let mut tree = Octree::new();
    let a = tree.add_sphere(sphere(0.0, 0.0, 0.0, 1.0));
    tree.add_sphere(sphere(3.0, 0.0, 0.0, 1.0));
    let leaf = tree.leaf_of(a);

    assert!(tree.update_sphere(a, sphere(0.0, 0.0, 0.0, 4.0)));
    assert_eq!(tree.leaf_of(a), leaf);
    assert_eq!(tree.root_octant().unwrap().max_radius(), 4.0);
    assert_valid(&tree);

    assert!(tree.update_sphere(a, sphere(0.0, 0.0, 0.0, 0.25)));
    assert_eq!(tree.root_octant().unwrap().max_radius(), 1.0);
    assert_valid(&tree);
}

#[test]
fn test_update_moves_within_leaf() {
    let mut tree = Octree::new();
    let a = tree.add_sphere(sphere(0.0, 0.0, 0.0, 1.0));
    tree.add_sphere(sphere(3.0, 0.0, 0.0, 1.0));
    let leaf = tree.leaf_of(a).unwrap();
    let nodes = tree.node_count();

    assert!(tree.update_sphere(a, sphere(0.5, 0.5, 0.5, 1.0)));
    assert_eq!(tree.leaf_of(a), Some(leaf));
    assert_eq!(tree.node_count(), nodes);
    assert_eq!(
        tree.node(leaf).unwrap().data_position(),
        Some(Vec3::new(0.5, 0.5, 0.5))
    );
    assert_valid(&tree);
}

#[test]
fn test_update_detaches_from_shared_leaf() {
    let mut tree = Octree::new();
    let a = tree.add_sphere(sphere(0.0, 0.0, 0.0, 1.0));
    let b = tree.add_sphere(sphere(0.0, 0.0, 0.0, 1.0));
    tree.add_sphere(sphere(3.0, 0.0, 0.0, 1.0));

    assert!(tree.update_sphere(b, sphere(5.0, 5.0, 5.0, 1.0)));
    assert_ne!(tree.leaf_of(a), tree.leaf_of(b));
    assert_eq!(tree.node(tree.leaf_of(a).unwrap()).unwrap().spheres(), &[a]);
    assert_eq!(tree.leaf_at(Vec3::new(5.0, 5.0, 5.0)), tree.leaf_of(b));
    assert_valid(&tree);
}

#[test]
fn test_update_far_move_keeps_handle() {
    let mut tree = Octree::new();
    let a = tree.add_sphere(sphere(0.0, 0.0, 0.0, 1.0));
    let b = tree.add_sphere(sphere(1.0, 1.0, 1.0, 1.0));

    assert!(tree.update_sphere(a, sphere(1000.0, -500.0, 20.0, 2.0)));
    assert!(tree.contains(a));
    assert_eq!(tree.sphere(a).unwrap().radius, 2.0);
    assert_eq!(tree.leaf_at(Vec3::new(1000.0, -500.0, 20.0)), tree.leaf_of(a));
    assert_eq!(tree.leaf_at(Vec3::new(1.0, 1.0, 1.0)), tree.leaf_of(b));
    assert_valid(&tree);
}

#[test]
fn test_update_with_corrupt_index_leaves_bounds_alone() {
    let mut tree = Octree::new();
    let a = tree.add_sphere(sphere(0.0, 0.0, 0.0, 1.0));
    tree.add_sphere(sphere(3.0, 0.0, 0.0, 1.0));
    let root = tree.root().unwrap();
    tree.sphere_leaves.insert(a, root);

    assert!(!tree.update_sphere(a, sphere(0.0, 0.0, 0.0, 9.0)));
    assert_eq!(tree.sphere(a), Some(&sphere(0.0, 0.0, 0.0, 1.0)));
}

#[test]
fn test_update_unknown_sphere() {
    let mut tree = Octree::new();
    let a = tree.add_sphere(sphere(0.0, 0.0, 0.0, 1.0));
    tree.remove_sphere(a);
    assert!(!tree.update_sphere(a, sphere(1.0, 1.0, 1.0, 1.0)));
    assert!(tree.is_empty());
    assert_valid(&tree);
}

// =============================================================================
// Queries
// =============================================================================

#[test]
fn test_ray_hit_and_miss() {
    let mut tree = Octree::new();
    let id = tree.add_sphere(sphere(0.0, 0.0, 0.0, 1.0));
    tree.add_sphere(sphere(10.0, 10.0, 10.0, 1.0));

    let hit = Ray::from_points(Vec3::new(0.5, 0.5, 10.0), Vec3::new(0.5, 0.5, -10.0));
    assert_eq!(tree.spheres_on_ray(&hit), vec![id]);

    let miss = Ray::from_points(Vec3::new(2.0, 2.0, 10.0), Vec3::new(2.0, 2.0, -10.0));
    assert!(tree.spheres_on_ray(&miss).is_empty());

    // Pointing away from the sphere
    let away = Ray::from_points(Vec3::new(0.5, 0.5, 10.0), Vec3::new(0.5, 0.5, 20.0));
    assert!(tree.spheres_on_ray(&away).is_empty());
}

#[test]
fn test_large_radius_in_small_cell_is_found() {
    let mut tree = Octree::new();
    let big = tree.add_sphere(sphere(0.1, 0.1, 0.1, 20.0));
    tree.add_spheres((0..8).map(|i| sphere(i as f32 * 0.3, 0.2, 0.1, 0.05)));

    // Passes far from the big sphere's cell but well within its radius
    let ray = Ray::from_points(Vec3::new(15.0, -30.0, 0.0), Vec3::new(15.0, 30.0, 0.0));
    assert_eq!(tree.spheres_on_ray(&ray), vec![big]);
}

#[test]
fn test_grazing_ray_finds_nested_spheres() {
    let mut tree = Octree::new();
    let mut ids = Vec::new();
    for i in 0..6 {
        let offset = 0.5_f32.powi(i);
        ids.push(tree.add_sphere(sphere(offset, offset, offset, offset * 0.1)));
    }
    assert_valid(&tree);

    for (i, id) in ids.iter().enumerate() {
        let target = *tree.sphere(*id).unwrap();
        let edge = target.center + Vec3::new(target.radius * 0.99, 0.0, 0.0);
        let ray = Ray::from_points(edge + Vec3::new(0.0, 0.0, 50.0), edge);
        let hits = tree.spheres_on_ray(&ray);
        assert!(hits.contains(id), "sphere {i} missed by grazing ray");
        assert_eq!(sorted(hits), brute_force_ray(&tree, &ray));
    }
}

#[test]
fn test_callback_receives_bounds() {
    let mut tree = Octree::new();
    tree.add_sphere(sphere(0.0, 0.0, -5.0, 2.0));
    let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

    let mut radii = Vec::new();
    tree.for_each_sphere_on_ray(&ray, |_, bounds| radii.push(bounds.radius));
    assert_eq!(radii, vec![2.0]);
}

// =============================================================================
// Randomized
// =============================================================================

#[test]
fn test_random_operations_keep_invariants() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut tree = Octree::new();
    let mut live: Vec<SphereId> = Vec::new();

    for step in 0..600 {
        let roll = rng.random_range(0..10);
        if live.is_empty() || roll < 5 {
            // Cluster some inserts so coincident and deep leaves show up
            let center = if rng.random_bool(0.2) && !live.is_empty() {
                let other = live[rng.random_range(0..live.len())];
                tree.sphere(other).unwrap().center
            } else {
                Vec3::new(
                    rng.random_range(-50.0..50.0),
                    rng.random_range(-50.0..50.0),
                    rng.random_range(-50.0..50.0),
                )
            };
            let radius = rng.random_range(0.0..3.0);
            live.push(tree.add_sphere(BoundingSphere::new(center, radius)));
        } else if roll < 8 {
            let index = rng.random_range(0..live.len());
            let id = live.swap_remove(index);
            assert!(tree.remove_sphere(id).is_some());
        } else {
            let id = live[rng.random_range(0..live.len())];
            let current = *tree.sphere(id).unwrap();
            let center = current.center
                + Vec3::new(
                    rng.random_range(-4.0..4.0),
                    rng.random_range(-4.0..4.0),
                    rng.random_range(-4.0..4.0),
                );
            assert!(tree.update_sphere(id, BoundingSphere::new(center, current.radius)));
        }

        if let Err(err) = tree.validate() {
            panic!("step {step}: {err}");
        }
        assert_eq!(tree.len(), live.len());
    }

    for _ in 0..50 {
        let from = Vec3::new(
            rng.random_range(-80.0..80.0),
            rng.random_range(-80.0..80.0),
            rng.random_range(-80.0..80.0),
        );
        let to = Vec3::new(
            rng.random_range(-80.0..80.0),
            rng.random_range(-80.0..80.0),
            rng.random_range(-80.0..80.0),
        );
        let ray = Ray::from_points(from, to);
        assert_eq!(sorted(tree.spheres_on_ray(&ray)), brute_force_ray(&tree, &ray));
    }

    for id in live.drain(..) {
        tree.remove_sphere(id);
    }
    assert_eq!(tree.node_count(), 0);
    assert_valid(&tree);
}
