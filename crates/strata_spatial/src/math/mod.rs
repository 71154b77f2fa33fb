//! Geometry used by the spatial index

mod bounds;
mod ray;

pub use bounds::BoundingSphere;
pub use ray::Ray;

// Re-export the vector type from strata_core
pub use strata_core::Vec3;
