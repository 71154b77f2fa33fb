//! Strata Spatial Index
//!
//! A loose bounding-sphere octree for picking and proximity queries over
//! scene objects that move, grow and disappear at runtime.
//!
//! # Features
//!
//! - **Dynamic**: insert, remove and update spheres without rebuilding
//! - **Loose**: spheres are indexed by center and may overlap cell bounds
//! - **Stable handles**: a [`SphereId`] survives updates that move the sphere
//! - **Hit-testing**: ray and sphere queries with conservative pruning
//!
//! # Quick Start
//!
//! ```rust
//! use strata_spatial::{BoundingSphere, Octree, Ray, Vec3};
//!
//! let mut tree = Octree::new();
//! let near = tree.add_sphere(BoundingSphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0));
//! tree.add_sphere(BoundingSphere::new(Vec3::new(0.0, 0.0, -9.0), 1.0));
//!
//! let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
//! let (hit, _distance) = tree.raycast_nearest(&ray).unwrap();
//! assert_eq!(hit, near);
//! ```

pub mod config;
pub mod math;
pub mod octree;

pub use config::OctreeConfig;
pub use math::{BoundingSphere, Ray, Vec3};
pub use octree::{InvariantError, NodeId, Octant, OctantKind, Octree, SphereId};
