//! Strata Core
//!
//! Value types shared by the Strata crates:
//!
//! - **Vec3**: 3D vector used for sphere centers, ray origins and directions
//! - **Color**: RGBA color with hex conversion, used by color tweens
//!
//! # Example
//!
//! ```rust
//! use strata_core::{Color, Vec3};
//!
//! let a = Vec3::new(1.0, 2.0, 3.0);
//! let b = Vec3::new(4.0, 6.0, 3.0);
//! assert_eq!(a.distance(b), 5.0);
//!
//! let orange = Color::parse("#ff8000").unwrap();
//! assert_eq!(orange.to_hex(), 0xff8000);
//! ```

pub mod color;
pub mod vector;

pub use color::Color;
pub use vector::Vec3;
