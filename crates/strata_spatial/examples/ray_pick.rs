//! Ray Picking Demo
//!
//! Scatters spheres on a grid, drifts a few of them around and picks along
//! a camera ray each step.
//!
//! Run with: RUST_LOG=strata_spatial=debug cargo run -p strata_spatial --example ray_pick

use strata_spatial::{BoundingSphere, Octree, OctreeConfig, Ray, Vec3};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut tree = Octree::with_config(OctreeConfig::new(4.0));
    let mut ids = Vec::new();
    for x in -5..=5 {
        for z in -5..=5 {
            let center = Vec3::new(x as f32 * 3.0, 0.0, z as f32 * 3.0);
            ids.push(tree.add_sphere(BoundingSphere::new(center, 1.0)));
        }
    }
    tracing::info!(
        spheres = tree.len(),
        octants = tree.node_count(),
        "scene built"
    );

    let camera = Ray::from_points(Vec3::new(0.0, 20.0, 30.0), Vec3::ZERO);
    for step in 0..5 {
        for (i, id) in ids.iter().enumerate().step_by(7) {
            let Some(current) = tree.sphere(*id).copied() else {
                continue;
            };
            let drift = Vec3::new((i % 3) as f32 - 1.0, 0.0, 1.5);
            tree.update_sphere(*id, BoundingSphere::new(current.center + drift, current.radius));
        }

        match tree.raycast_nearest(&camera) {
            Some((id, distance)) => tracing::info!(step, ?id, distance, "picked"),
            None => tracing::info!(step, "nothing under the cursor"),
        }
    }

    if let Err(err) = tree.validate() {
        tracing::error!(%err, "octree invariant broken");
    }
}
