//! Hit-testing and traversal

use super::{NodeId, Octant, OctantKind, Octree, SphereId};
use crate::math::{BoundingSphere, Ray};
use smallvec::{smallvec, SmallVec};
use strata_core::Vec3;

/// Traversal stack; deep enough for typical trees without spilling
type NodeStack = SmallVec<[NodeId; 32]>;

impl Octree {
    /// Call `callback` for every sphere the ray passes through
    ///
    /// No ordering is guaranteed. Branches are skipped only when the ray
    /// misses a sphere that encloses everything beneath them.
    pub fn for_each_sphere_on_ray<F>(&self, ray: &Ray, callback: F)
    where
        F: FnMut(SphereId, &BoundingSphere),
    {
        self.for_each_match(
            |center, radius| ray.intersects_sphere_at(center, radius),
            |sphere| ray.intersects_sphere(sphere),
            callback,
        );
    }

    /// Call `callback` for every sphere overlapping `test`
    pub fn for_each_intersecting_sphere<F>(&self, test: &BoundingSphere, callback: F)
    where
        F: FnMut(SphereId, &BoundingSphere),
    {
        self.for_each_match(
            |center, radius| test.intersects(&BoundingSphere::new(center, radius)),
            |sphere| test.intersects(sphere),
            callback,
        );
    }

    /// Collect the spheres the ray passes through
    pub fn spheres_on_ray(&self, ray: &Ray) -> Vec<SphereId> {
        let mut hits = Vec::new();
        self.for_each_sphere_on_ray(ray, |id, _| hits.push(id));
        hits
    }

    /// Closest sphere along the ray and the distance to its surface
    pub fn raycast_nearest(&self, ray: &Ray) -> Option<(SphereId, f32)> {
        let mut nearest: Option<(SphereId, f32)> = None;
        self.for_each_sphere_on_ray(ray, |id, sphere| {
            if let Some(t) = ray.intersect_sphere_distance(sphere) {
                if nearest.map_or(true, |(_, best)| t < best) {
                    nearest = Some((id, t));
                }
            }
        });
        nearest
    }

    fn for_each_match<O, S, F>(&self, octant_test: O, sphere_test: S, mut callback: F)
    where
        O: Fn(Vec3, f32) -> bool,
        S: Fn(&BoundingSphere) -> bool,
        F: FnMut(SphereId, &BoundingSphere),
    {
        let Some(root) = self.root else {
            return;
        };
        let mut stack: NodeStack = smallvec![root];
        while let Some(node) = stack.pop() {
            let octant = &self.nodes[node];
            match &octant.kind {
                OctantKind::Leaf { spheres, .. } => {
                    for &id in spheres {
                        if let Some(sphere) = self.spheres.get(id) {
                            if sphere_test(sphere) {
                                callback(id, sphere);
                            }
                        }
                    }
                }
                OctantKind::Branch { children, .. } => {
                    if octant_test(octant.center, octant.bounding_radius()) {
                        stack.extend(children.iter().flatten().copied());
                    }
                }
            }
        }
    }

    /// Visit every octant in pre-order, children in index order
    pub fn walk_tree<F>(&self, visitor: F)
    where
        F: FnMut(NodeId, &Octant),
    {
        if let Some(root) = self.root {
            self.walk_branch(root, visitor);
        }
    }

    /// Visit `node` and its descendants in pre-order
    pub fn walk_branch<F>(&self, node: NodeId, mut visitor: F)
    where
        F: FnMut(NodeId, &Octant),
    {
        if !self.nodes.contains_key(node) {
            return;
        }
        let mut stack: NodeStack = smallvec![node];
        while let Some(node) = stack.pop() {
            let octant = &self.nodes[node];
            visitor(node, octant);
            if let OctantKind::Branch { children, .. } = &octant.kind {
                stack.extend(children.iter().rev().flatten().copied());
            }
        }
    }
}
