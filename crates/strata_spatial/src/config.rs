//! Octree configuration

use serde::{Deserialize, Serialize};

/// Configuration for an [`Octree`](crate::Octree)
///
/// Deserializable so hosts can keep it next to their scene settings:
///
/// ```toml
/// initial_half_size = 4.0
/// max_depth = 48
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Minimum half-width of the root leaf created for the first sphere,
    /// rounded up to a power of two
    pub initial_half_size: f32,
    /// Subdivision depth below which non-identical positions are stored
    /// together as coincident spheres
    pub max_depth: u32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            initial_half_size: 1.0,
            max_depth: 64,
        }
    }
}

impl OctreeConfig {
    /// Create a configuration with the given root size
    pub fn new(initial_half_size: f32) -> Self {
        Self {
            initial_half_size,
            ..Self::default()
        }
    }

    /// Set the maximum subdivision depth
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OctreeConfig::default();
        assert_eq!(config.initial_half_size, 1.0);
        assert_eq!(config.max_depth, 64);
    }

    #[test]
    fn test_partial_toml() {
        let config: OctreeConfig = toml::from_str("initial_half_size = 4.0").unwrap();
        assert_eq!(config.initial_half_size, 4.0);
        assert_eq!(config.max_depth, 64);
    }

    #[test]
    fn test_json() {
        let config: OctreeConfig =
            serde_json::from_str(r#"{"initial_half_size": 0.5, "max_depth": 12}"#).unwrap();
        assert_eq!(config, OctreeConfig::new(0.5).with_max_depth(12));
    }
}
