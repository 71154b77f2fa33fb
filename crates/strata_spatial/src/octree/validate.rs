//! Structural self-check

use super::{NodeId, OctantKind, Octree, SphereId};
use thiserror::Error;

/// A broken structural invariant found by [`Octree::validate`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantError {
    #[error("root octant {0:?} has a parent")]
    RootHasParent(NodeId),

    #[error("octant {child:?} does not point back to its parent {parent:?}")]
    WrongParent { parent: NodeId, child: NodeId },

    #[error("octant {0:?} is referenced but not allocated")]
    MissingNode(NodeId),

    #[error("branch {node:?} holds only {leaves} leaf(s)")]
    RedundantBranch { node: NodeId, leaves: usize },

    #[error("child {child:?} in slot {index} does not match its parent's subdivision")]
    Geometry { child: NodeId, index: usize },

    #[error("octant {0:?} has stale aggregates")]
    StaleAggregate(NodeId),

    #[error("leaf {0:?} holds no spheres")]
    EmptyLeaf(NodeId),

    #[error("sphere {sphere:?} is stored in {leaf:?} but indexed elsewhere")]
    IndexMismatch { sphere: SphereId, leaf: NodeId },

    #[error("sphere {sphere:?} is not reachable by descending to its center")]
    Misplaced { sphere: SphereId },

    #[error("sphere counts disagree: index {indexed}, registry {registered}, tree {stored}")]
    CountMismatch {
        indexed: usize,
        registered: usize,
        stored: usize,
    },

    #[error("{0} octant(s) are allocated but unreachable from the root")]
    OrphanNodes(usize),
}

/// Aggregates recomputed from scratch for one subtree
struct Subtree {
    total: usize,
    leaves: usize,
    max_radius: f32,
}

impl Octree {
    /// Check every structural invariant by brute force
    ///
    /// Intended for tests and debugging; cost is linear in the tree size.
    pub fn validate(&self) -> Result<(), InvariantError> {
        let Some(root) = self.root else {
            let orphans = self.nodes.len();
            if orphans > 0 {
                return Err(InvariantError::OrphanNodes(orphans));
            }
            return self.check_counts(0);
        };

        let octant = self
            .nodes
            .get(root)
            .ok_or(InvariantError::MissingNode(root))?;
        if octant.parent.is_some() {
            return Err(InvariantError::RootHasParent(root));
        }

        let mut reached = 0;
        let subtree = self.check_subtree(root, &mut reached)?;

        if reached != self.nodes.len() {
            return Err(InvariantError::OrphanNodes(self.nodes.len() - reached));
        }
        self.check_counts(subtree.total)
    }

    fn check_counts(&self, stored: usize) -> Result<(), InvariantError> {
        let (indexed, registered) = (self.sphere_leaves.len(), self.spheres.len());
        if indexed != registered || registered != stored {
            return Err(InvariantError::CountMismatch {
                indexed,
                registered,
                stored,
            });
        }
        Ok(())
    }

    fn check_subtree(&self, node: NodeId, reached: &mut usize) -> Result<Subtree, InvariantError> {
        let octant = self
            .nodes
            .get(node)
            .ok_or(InvariantError::MissingNode(node))?;
        *reached += 1;

        let subtree = match &octant.kind {
            OctantKind::Leaf { spheres, .. } => {
                if spheres.is_empty() {
                    return Err(InvariantError::EmptyLeaf(node));
                }
                let mut max_radius = 0.0_f32;
                for &sphere in spheres {
                    if self.sphere_leaves.get(&sphere) != Some(&node) {
                        return Err(InvariantError::IndexMismatch { sphere, leaf: node });
                    }
                    let bounds = self
                        .spheres
                        .get(sphere)
                        .ok_or(InvariantError::IndexMismatch { sphere, leaf: node })?;
                    if self.leaf_at(bounds.center) != Some(node) {
                        return Err(InvariantError::Misplaced { sphere });
                    }
                    max_radius = max_radius.max(bounds.radius);
                }
                Subtree {
                    total: spheres.len(),
                    leaves: 1,
                    max_radius,
                }
            }
            OctantKind::Branch {
                children,
                total_count,
                leaf_count,
            } => {
                let mut subtree = Subtree {
                    total: 0,
                    leaves: 0,
                    max_radius: 0.0,
                };
                for (index, child) in children.iter().enumerate() {
                    let Some(child) = *child else { continue };
                    let child_octant = self
                        .nodes
                        .get(child)
                        .ok_or(InvariantError::MissingNode(child))?;
                    if child_octant.parent != Some(node) {
                        return Err(InvariantError::WrongParent {
                            parent: node,
                            child,
                        });
                    }

                    let (center, half_size) = octant.child_geometry(index);
                    if child_octant.center != center || child_octant.half_size != half_size {
                        return Err(InvariantError::Geometry { child, index });
                    }

                    let child_subtree = self.check_subtree(child, reached)?;
                    subtree.total += child_subtree.total;
                    subtree.leaves += child_subtree.leaves;
                    subtree.max_radius = subtree.max_radius.max(child_subtree.max_radius);
                }

                if subtree.leaves < 2 {
                    return Err(InvariantError::RedundantBranch {
                        node,
                        leaves: subtree.leaves,
                    });
                }
                if *total_count != subtree.total || *leaf_count != subtree.leaves {
                    return Err(InvariantError::StaleAggregate(node));
                }
                subtree
            }
        };

        if octant.max_radius != subtree.max_radius {
            return Err(InvariantError::StaleAggregate(node));
        }
        Ok(subtree)
    }
}
