//! Octant - a single node of the octree
//!
//! Octants live in the octree's arena and reference each other by
//! [`NodeId`]. A leaf holds the ids of spheres sharing one position; a
//! branch holds up to eight children plus subtree aggregates.
//!
//! Child index bits: bit 0 = x, bit 1 = y, bit 2 = z. A coordinate at or
//! above the octant center sets the bit.

use slotmap::new_key_type;
use smallvec::SmallVec;
use strata_core::Vec3;

new_key_type! {
    /// Handle to an octant in the octree arena
    pub struct NodeId;
    /// Handle to a sphere registered with the octree
    pub struct SphereId;
}

/// Smallest f32 above the square root of 3, so corner distances round up
pub(crate) const SQRT_3: f32 = 1.732_050_9;

/// Bound on `|center| / half_size` for a new root, keeping child centers
/// well inside the f32 mantissa
const ROOT_LATTICE_SPAN: f32 = 4_194_304.0;

/// Sphere ids stored in a leaf; almost always a single entry
pub type LeafSpheres = SmallVec<[SphereId; 2]>;

/// Leaf or branch payload of an octant
#[derive(Clone, Debug)]
pub enum OctantKind {
    Leaf {
        /// Spheres whose centers all sit at `position`
        spheres: LeafSpheres,
        /// Shared center of the stored spheres
        position: Vec3,
    },
    Branch {
        children: [Option<NodeId>; 8],
        total_count: usize,
        leaf_count: usize,
    },
}

/// A cubic cell of the octree
#[derive(Clone, Debug)]
pub struct Octant {
    pub(crate) center: Vec3,
    pub(crate) half_size: f32,
    pub(crate) parent: Option<NodeId>,
    pub(crate) max_radius: f32,
    pub(crate) kind: OctantKind,
}

impl Octant {
    pub(crate) fn leaf(center: Vec3, half_size: f32, position: Vec3) -> Self {
        Self {
            center,
            half_size,
            parent: None,
            max_radius: 0.0,
            kind: OctantKind::Leaf {
                spheres: LeafSpheres::new(),
                position,
            },
        }
    }

    pub(crate) fn branch(center: Vec3, half_size: f32) -> Self {
        Self {
            center,
            half_size,
            parent: None,
            max_radius: 0.0,
            kind: OctantKind::Branch {
                children: [None; 8],
                total_count: 0,
                leaf_count: 0,
            },
        }
    }

    /// Center of the cell
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Half the edge length of the cell
    pub fn half_size(&self) -> f32 {
        self.half_size
    }

    /// Parent octant, `None` for the root
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Largest radius of any sphere in this subtree
    pub fn max_radius(&self) -> f32 {
        self.max_radius
    }

    pub fn kind(&self) -> &OctantKind {
        &self.kind
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, OctantKind::Leaf { .. })
    }

    /// Number of spheres in this subtree
    pub fn total_count(&self) -> usize {
        match &self.kind {
            OctantKind::Leaf { spheres, .. } => spheres.len(),
            OctantKind::Branch { total_count, .. } => *total_count,
        }
    }

    /// Number of leaves in this subtree (1 for a leaf)
    pub fn leaf_count(&self) -> usize {
        match &self.kind {
            OctantKind::Leaf { .. } => 1,
            OctantKind::Branch { leaf_count, .. } => *leaf_count,
        }
    }

    /// Sphere ids of a leaf; empty for branches
    pub fn spheres(&self) -> &[SphereId] {
        match &self.kind {
            OctantKind::Leaf { spheres, .. } => spheres,
            OctantKind::Branch { .. } => &[],
        }
    }

    /// Shared position of a leaf's spheres
    pub fn data_position(&self) -> Option<Vec3> {
        match &self.kind {
            OctantKind::Leaf { position, .. } => Some(*position),
            OctantKind::Branch { .. } => None,
        }
    }

    /// Child slot `index` of a branch
    pub fn child(&self, index: usize) -> Option<NodeId> {
        match &self.kind {
            OctantKind::Branch { children, .. } => children[index],
            OctantKind::Leaf { .. } => None,
        }
    }

    /// Occupied child slots of a branch as `(index, node)` pairs
    pub fn children(&self) -> impl Iterator<Item = (usize, NodeId)> + '_ {
        let slots: &[Option<NodeId>] = match &self.kind {
            OctantKind::Branch { children, .. } => children,
            OctantKind::Leaf { .. } => &[],
        };
        slots
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.map(|id| (i, id)))
    }

    /// Child slot addressed by `point`
    pub fn child_index(&self, point: Vec3) -> usize {
        child_index(self.center, point)
    }

    /// Center and half-size of child slot `index`
    pub fn child_geometry(&self, index: usize) -> (Vec3, f32) {
        child_geometry(self.center, self.half_size, index)
    }

    /// Check if `point` lies inside the cell
    ///
    /// Lower faces are inclusive and upper faces exclusive, matching the
    /// way [`Octant::child_index`] splits a parent between its children.
    pub fn contains(&self, point: Vec3) -> bool {
        let inside = |p: f32, c: f32| c - self.half_size <= p && p < c + self.half_size;
        inside(point.x, self.center.x)
            && inside(point.y, self.center.y)
            && inside(point.z, self.center.z)
    }

    /// Conservative radius around the cell center that encloses every
    /// sphere stored beneath it
    ///
    /// Stored positions always fall inside the cell, so the cell's corner
    /// distance plus the largest sphere radius bounds the subtree.
    pub fn bounding_radius(&self) -> f32 {
        self.half_size * SQRT_3 + self.max_radius
    }
}

pub(crate) fn child_index(center: Vec3, point: Vec3) -> usize {
    (point.x >= center.x) as usize
        | ((point.y >= center.y) as usize) << 1
        | ((point.z >= center.z) as usize) << 2
}

pub(crate) fn child_geometry(center: Vec3, half_size: f32, index: usize) -> (Vec3, f32) {
    let h = half_size * 0.5;
    let offset = |bit: usize| if index & bit != 0 { h } else { -h };
    (
        Vec3::new(
            center.x + offset(1),
            center.y + offset(2),
            center.z + offset(4),
        ),
        h,
    )
}

/// Power-of-two cell for the first sphere of a tree
///
/// The center is snapped to a multiple of the half-size, so the `±h` steps
/// taken by subdivision and root growth are exact in f32.
pub(crate) fn root_cell(point: Vec3, min_half_size: f32) -> (Vec3, f32) {
    let extent = point.x.abs().max(point.y.abs()).max(point.z.abs());
    let target = min_half_size.max(extent / ROOT_LATTICE_SPAN);
    let mut half_size = 1.0_f32;
    while half_size < target && half_size < f32::MAX / 4.0 {
        half_size *= 2.0;
    }
    while half_size * 0.5 >= target && half_size * 0.5 >= f32::MIN_POSITIVE {
        half_size *= 0.5;
    }
    let snap = |p: f32| (p / half_size).round() * half_size;
    (
        Vec3::new(snap(point.x), snap(point.y), snap(point.z)),
        half_size,
    )
}

/// Whether `a + b` is exactly representable (error-free two-sum)
fn sum_is_exact(a: f32, b: f32) -> bool {
    let sum = a + b;
    let b_part = sum - a;
    let a_part = sum - b_part;
    (a - a_part) + (b - b_part) == 0.0
}

/// Whether a cell can be split into children whose centers are exact
pub(crate) fn can_subdivide(center: Vec3, half_size: f32) -> bool {
    let h = half_size * 0.5;
    h >= f32::MIN_POSITIVE
        && [center.x, center.y, center.z]
            .into_iter()
            .all(|c| sum_is_exact(c, h) && sum_is_exact(c, -h))
}
