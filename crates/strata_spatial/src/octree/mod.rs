//! Loose bounding-sphere octree
//!
//! A dynamic, non-uniform-depth octree that indexes bounding spheres by
//! their centers and answers ray and sphere hit-tests.
//!
//! # Structure
//!
//! - A sphere is stored in the shallowest leaf whose cell contains its
//!   center; spheres sharing an identical center share a leaf.
//! - Spheres may extend past their cell. Branches track the largest radius
//!   beneath them so queries can prune conservatively.
//! - The root grows (doubling its half-size) when a sphere lands outside
//!   it, and branches left with a single leaf collapse into that leaf.
//!
//! # Example
//!
//! ```rust
//! use strata_spatial::{BoundingSphere, Octree, Ray, Vec3};
//!
//! let mut tree = Octree::new();
//! let id = tree.add_sphere(BoundingSphere::new(Vec3::ZERO, 1.0));
//!
//! let ray = Ray::from_points(Vec3::new(0.5, 0.5, 10.0), Vec3::new(0.5, 0.5, -10.0));
//! let mut hits = Vec::new();
//! tree.for_each_sphere_on_ray(&ray, |hit, _| hits.push(hit));
//! assert_eq!(hits, vec![id]);
//! ```

mod octant;
mod query;
mod validate;

#[cfg(test)]
mod tests;

pub use octant::{LeafSpheres, NodeId, Octant, OctantKind, SphereId};
pub use validate::InvariantError;

use crate::config::OctreeConfig;
use crate::math::BoundingSphere;
use octant::{can_subdivide, child_geometry, child_index, root_cell};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use smallvec::{smallvec, SmallVec};
use strata_core::Vec3;

/// Dynamic spatial index over bounding spheres
pub struct Octree {
    config: OctreeConfig,
    nodes: SlotMap<NodeId, Octant>,
    spheres: SlotMap<SphereId, BoundingSphere>,
    /// Sphere -> owning leaf
    sphere_leaves: FxHashMap<SphereId, NodeId>,
    root: Option<NodeId>,
}

impl Default for Octree {
    fn default() -> Self {
        Self::new()
    }
}

impl Octree {
    /// Create an empty octree with the default configuration
    pub fn new() -> Self {
        Self::with_config(OctreeConfig::default())
    }

    /// Create an empty octree
    pub fn with_config(config: OctreeConfig) -> Self {
        Self {
            config,
            nodes: SlotMap::with_key(),
            spheres: SlotMap::with_key(),
            sphere_leaves: FxHashMap::default(),
            root: None,
        }
    }

    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Root octant handle, `None` when the tree is empty
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Root octant, `None` when the tree is empty
    pub fn root_octant(&self) -> Option<&Octant> {
        self.root.and_then(|root| self.nodes.get(root))
    }

    /// Look up an octant
    pub fn node(&self, id: NodeId) -> Option<&Octant> {
        self.nodes.get(id)
    }

    /// Number of octants currently allocated
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Current bounds of a registered sphere
    pub fn sphere(&self, id: SphereId) -> Option<&BoundingSphere> {
        self.spheres.get(id)
    }

    /// Leaf currently holding a sphere
    pub fn leaf_of(&self, id: SphereId) -> Option<NodeId> {
        self.sphere_leaves.get(&id).copied()
    }

    /// Check if a sphere is registered
    pub fn contains(&self, id: SphereId) -> bool {
        self.sphere_leaves.contains_key(&id)
    }

    /// Number of spheres in the tree
    pub fn len(&self) -> usize {
        self.sphere_leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sphere_leaves.is_empty()
    }

    /// Iterate over all registered spheres
    pub fn spheres(&self) -> impl Iterator<Item = (SphereId, &BoundingSphere)> {
        self.spheres.iter()
    }

    /// Leaf a point would be stored in, if one exists for its slot
    pub fn leaf_at(&self, point: Vec3) -> Option<NodeId> {
        let mut node = self.root?;
        if !self.nodes[node].contains(point) {
            return None;
        }
        loop {
            let octant = &self.nodes[node];
            match octant.kind {
                OctantKind::Leaf { .. } => return Some(node),
                OctantKind::Branch { children, .. } => {
                    node = children[octant.child_index(point)]?;
                }
            }
        }
    }

    /// Remove every sphere and octant
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.spheres.clear();
        self.sphere_leaves.clear();
        self.root = None;
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Insert a sphere and return its handle
    pub fn add_sphere(&mut self, sphere: BoundingSphere) -> SphereId {
        debug_assert!(sphere.is_valid(), "invalid bounding sphere: {sphere:?}");
        let id = self.spheres.insert(sphere);
        self.attach(id, sphere);
        id
    }

    /// Insert several spheres, returning their handles in order
    pub fn add_spheres<I>(&mut self, spheres: I) -> Vec<SphereId>
    where
        I: IntoIterator<Item = BoundingSphere>,
    {
        spheres
            .into_iter()
            .map(|sphere| self.add_sphere(sphere))
            .collect()
    }

    /// Remove a sphere
    ///
    /// Returns the sphere's last bounds, or `None` (and does nothing) if the
    /// handle is unknown or was already removed.
    pub fn remove_sphere(&mut self, id: SphereId) -> Option<BoundingSphere> {
        if !self.detach(id) {
            return None;
        }
        self.spheres.remove(id)
    }

    /// Replace the bounds of a registered sphere
    ///
    /// Radius-only changes and moves that stay inside the sphere's leaf are
    /// applied in place; anything else re-inserts the sphere. The handle is
    /// preserved. Returns `false` and does nothing for unknown handles.
    pub fn update_sphere(&mut self, id: SphereId, sphere: BoundingSphere) -> bool {
        debug_assert!(sphere.is_valid(), "invalid bounding sphere: {sphere:?}");
        let Some(&leaf) = self.sphere_leaves.get(&id) else {
            return false;
        };
        let (position, occupants) = match self.nodes.get(leaf).map(|octant| &octant.kind) {
            Some(OctantKind::Leaf { position, spheres }) => (*position, spheres.len()),
            _ => return false,
        };
        let Some(stored) = self.spheres.get_mut(id) else {
            return false;
        };
        *stored = sphere;

        if position == sphere.center {
            self.refresh_upward(Some(leaf));
            return true;
        }

        if occupants == 1 && self.addresses(leaf, sphere.center) {
            if let OctantKind::Leaf { position, .. } = &mut self.nodes[leaf].kind {
                *position = sphere.center;
            }
            self.refresh_upward(Some(leaf));
            return true;
        }

        // Shared leaves keep their other occupants; a sole occupant that
        // left its cell takes its leaf with it. Both reduce to detach + attach.
        self.detach(id);
        self.attach(id, sphere);
        true
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    fn attach(&mut self, id: SphereId, sphere: BoundingSphere) {
        let pos = sphere.center;

        let Some(root) = self.root else {
            let min_half = sphere.radius.max(self.config.initial_half_size);
            let (center, half_size) = root_cell(pos, min_half);
            let node = self.new_leaf(center, half_size, None, pos, smallvec![id], sphere.radius);
            self.root = Some(node);
            tracing::debug!(half_size, "octree: created root leaf");
            return;
        };

        let mut node = self.expand_root_to(root, pos);
        loop {
            let octant = &self.nodes[node];
            match &octant.kind {
                OctantKind::Branch { children, .. } => {
                    let index = octant.child_index(pos);
                    if let Some(child) = children[index] {
                        node = child;
                        continue;
                    }
                    let (center, half_size) = octant.child_geometry(index);
                    let leaf = self.new_leaf(
                        center,
                        half_size,
                        Some(node),
                        pos,
                        smallvec![id],
                        sphere.radius,
                    );
                    self.set_child(node, index, Some(leaf));
                    self.refresh_upward(Some(node));
                    return;
                }
                OctantKind::Leaf { position, .. } => {
                    let position = *position;
                    if position == pos || !self.splits_apart(node, position, pos) {
                        if position != pos {
                            tracing::warn!(
                                ?position,
                                ?pos,
                                "octree: cell cannot subdivide further, storing as coincident"
                            );
                        }
                        self.push_to_leaf(node, id, sphere.radius);
                        return;
                    }
                    self.split_leaf(node, id, pos, sphere.radius);
                    return;
                }
            }
        }
    }

    /// Grow the root until it contains `pos`, returning the new root
    fn expand_root_to(&mut self, mut root: NodeId, pos: Vec3) -> NodeId {
        while !self.nodes[root].contains(pos) {
            let octant = &self.nodes[root];
            let (center, half_size) = (octant.center, octant.half_size);
            if !half_size.is_finite() {
                break;
            }
            let toward = |p: f32, c: f32| if p >= c { c + half_size } else { c - half_size };
            let new_center = Vec3::new(
                toward(pos.x, center.x),
                toward(pos.y, center.y),
                toward(pos.z, center.z),
            );
            let new_half = half_size * 2.0;

            if octant.is_leaf() {
                // A lone leaf just grows; its data stays inside the larger cell
                let octant = &mut self.nodes[root];
                octant.center = new_center;
                octant.half_size = new_half;
            } else {
                let index = child_index(new_center, center);
                if child_geometry(new_center, new_half, index).0 != center {
                    tracing::warn!(?center, new_half, "octree: root expansion lost precision");
                }
                let mut branch = Octant::branch(new_center, new_half);
                if let OctantKind::Branch { children, .. } = &mut branch.kind {
                    children[index] = Some(root);
                }
                let new_root = self.nodes.insert(branch);
                self.nodes[root].parent = Some(new_root);
                self.refresh_aggregates(new_root);
                root = new_root;
                self.root = Some(root);
            }
            tracing::debug!(half_size = new_half, "octree: expanded root");
        }
        root
    }

    /// Whether two distinct positions in a leaf's cell separate into
    /// different children before subdivision runs out
    fn splits_apart(&self, leaf: NodeId, a: Vec3, b: Vec3) -> bool {
        let octant = &self.nodes[leaf];
        let (mut center, mut half_size) = (octant.center, octant.half_size);
        let mut depth = self.depth_of(leaf);
        loop {
            if depth >= self.config.max_depth || !can_subdivide(center, half_size) {
                return false;
            }
            let ia = child_index(center, a);
            if ia != child_index(center, b) {
                return true;
            }
            (center, half_size) = child_geometry(center, half_size, ia);
            depth += 1;
        }
    }

    /// Turn a leaf into a branch and push its data and the new sphere down
    /// until they occupy different child slots
    fn split_leaf(&mut self, leaf: NodeId, id: SphereId, pos: Vec3, radius: f32) {
        let old_radius = self.nodes[leaf].max_radius;
        let placeholder = Octant::branch(Vec3::ZERO, 0.0).kind;
        let (old_spheres, old_pos) = match std::mem::replace(&mut self.nodes[leaf].kind, placeholder)
        {
            OctantKind::Leaf { spheres, position } => (spheres, position),
            OctantKind::Branch { .. } => return,
        };

        let mut current = leaf;
        loop {
            let octant = &self.nodes[current];
            let old_index = octant.child_index(old_pos);
            let new_index = octant.child_index(pos);
            let (old_center, half_size) = octant.child_geometry(old_index);

            if old_index != new_index {
                let (new_center, _) = octant.child_geometry(new_index);
                let old_leaf = self.new_leaf(
                    old_center,
                    half_size,
                    Some(current),
                    old_pos,
                    old_spheres,
                    old_radius,
                );
                self.set_child(current, old_index, Some(old_leaf));
                let new_leaf =
                    self.new_leaf(new_center, half_size, Some(current), pos, smallvec![id], radius);
                self.set_child(current, new_index, Some(new_leaf));
                break;
            }

            let mut branch = Octant::branch(old_center, half_size);
            branch.parent = Some(current);
            let child = self.nodes.insert(branch);
            self.set_child(current, old_index, Some(child));
            current = child;
        }

        tracing::trace!(?leaf, "octree: split leaf");
        self.refresh_upward(Some(current));
    }

    fn push_to_leaf(&mut self, leaf: NodeId, id: SphereId, radius: f32) {
        let octant = &mut self.nodes[leaf];
        if let OctantKind::Leaf { spheres, .. } = &mut octant.kind {
            spheres.push(id);
        }
        octant.max_radius = octant.max_radius.max(radius);
        self.sphere_leaves.insert(id, leaf);
        let parent = octant.parent;
        self.refresh_upward(parent);
    }

    fn new_leaf(
        &mut self,
        center: Vec3,
        half_size: f32,
        parent: Option<NodeId>,
        position: Vec3,
        spheres: LeafSpheres,
        max_radius: f32,
    ) -> NodeId {
        let mut octant = Octant::leaf(center, half_size, position);
        octant.parent = parent;
        octant.max_radius = max_radius;
        octant.kind = OctantKind::Leaf { spheres, position };
        let node = self.nodes.insert(octant);
        for &id in self.nodes[node].spheres() {
            self.sphere_leaves.insert(id, node);
        }
        node
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Unlink a sphere from the tree, keeping its bounds registered
    fn detach(&mut self, id: SphereId) -> bool {
        let Some(leaf) = self.sphere_leaves.remove(&id) else {
            return false;
        };

        let remaining = match &mut self.nodes[leaf].kind {
            OctantKind::Leaf { spheres, .. } => {
                spheres.retain(|s| *s != id);
                spheres.len()
            }
            OctantKind::Branch { .. } => 0,
        };

        if remaining > 0 {
            self.refresh_upward(Some(leaf));
            return true;
        }

        let parent = self.nodes[leaf].parent;
        self.nodes.remove(leaf);
        match parent {
            None => {
                self.root = None;
                tracing::debug!("octree: emptied");
            }
            Some(parent) => {
                self.replace_child(parent, leaf, None);
                self.collapse_upward(parent);
                self.shrink_root();
            }
        }
        true
    }

    /// Refresh aggregates from `start` to the root, folding branches that
    /// are left with a single leaf into that leaf
    fn collapse_upward(&mut self, start: NodeId) {
        let mut cursor = Some(start);
        while let Some(node) = cursor {
            self.refresh_aggregates(node);
            let octant = &self.nodes[node];
            let parent = octant.parent;
            if !octant.is_leaf() && octant.leaf_count() <= 1 {
                self.collapse_branch(node);
            }
            cursor = parent;
        }
    }

    /// Replace a branch holding at most one leaf with that leaf
    fn collapse_branch(&mut self, branch: NodeId) {
        let mut doomed: SmallVec<[NodeId; 8]> = smallvec![branch];
        let mut survivor = None;
        let mut cursor = branch;
        while let Some((_, child)) = self.nodes[cursor].children().next() {
            if self.nodes[child].is_leaf() {
                survivor = Some(child);
                break;
            }
            doomed.push(child);
            cursor = child;
        }

        let octant = &self.nodes[branch];
        let (center, half_size, parent) = (octant.center, octant.half_size, octant.parent);
        for node in doomed {
            self.nodes.remove(node);
        }

        if let Some(leaf) = survivor {
            let octant = &mut self.nodes[leaf];
            octant.center = center;
            octant.half_size = half_size;
            octant.parent = parent;
        }
        match parent {
            Some(parent) => self.replace_child(parent, branch, survivor),
            None => self.root = survivor,
        }
        tracing::trace!(?branch, ?survivor, "octree: collapsed branch");
    }

    /// Drop root branches that have a single child
    fn shrink_root(&mut self) {
        while let Some(root) = self.root {
            let only = {
                let mut children = self.nodes[root].children();
                match (children.next(), children.next()) {
                    (Some((_, only)), None) => only,
                    _ => return,
                }
            };
            self.nodes.remove(root);
            self.nodes[only].parent = None;
            self.root = Some(only);
            tracing::debug!(half_size = self.nodes[only].half_size, "octree: shrank root");
        }
    }

    // =========================================================================
    // Bookkeeping
    // =========================================================================

    fn set_child(&mut self, parent: NodeId, index: usize, child: Option<NodeId>) {
        if let OctantKind::Branch { children, .. } = &mut self.nodes[parent].kind {
            children[index] = child;
        }
    }

    fn replace_child(&mut self, parent: NodeId, old: NodeId, new: Option<NodeId>) {
        if let Some(index) = self.slot_of(parent, old) {
            self.set_child(parent, index, new);
        }
    }

    fn slot_of(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.nodes[parent]
            .children()
            .find(|&(_, c)| c == child)
            .map(|(index, _)| index)
    }

    fn depth_of(&self, node: NodeId) -> u32 {
        let mut depth = 0;
        let mut cursor = self.nodes[node].parent;
        while let Some(parent) = cursor {
            depth += 1;
            cursor = self.nodes[parent].parent;
        }
        depth
    }

    /// Whether descending from the root by `point` ends at `leaf`
    fn addresses(&self, leaf: NodeId, point: Vec3) -> bool {
        let mut node = leaf;
        while let Some(parent) = self.nodes[node].parent {
            if self.slot_of(parent, node) != Some(self.nodes[parent].child_index(point)) {
                return false;
            }
            node = parent;
        }
        self.nodes[node].contains(point)
    }

    /// Recompute one octant's aggregates from its immediate contents
    fn refresh_aggregates(&mut self, node: NodeId) {
        let octant = &self.nodes[node];
        match &octant.kind {
            OctantKind::Leaf { spheres, .. } => {
                let max_radius = spheres
                    .iter()
                    .filter_map(|id| self.spheres.get(*id))
                    .fold(0.0_f32, |acc, s| acc.max(s.radius));
                self.nodes[node].max_radius = max_radius;
            }
            OctantKind::Branch { children, .. } => {
                let (mut total, mut leaves, mut max_radius) = (0, 0, 0.0_f32);
                for child in children.iter().flatten() {
                    let child = &self.nodes[*child];
                    total += child.total_count();
                    leaves += child.leaf_count();
                    max_radius = max_radius.max(child.max_radius);
                }
                let octant = &mut self.nodes[node];
                octant.max_radius = max_radius;
                if let OctantKind::Branch {
                    total_count,
                    leaf_count,
                    ..
                } = &mut octant.kind
                {
                    *total_count = total;
                    *leaf_count = leaves;
                }
            }
        }
    }

    fn refresh_upward(&mut self, start: Option<NodeId>) {
        let mut cursor = start;
        while let Some(node) = cursor {
            self.refresh_aggregates(node);
            cursor = self.nodes[node].parent;
        }
    }
}
