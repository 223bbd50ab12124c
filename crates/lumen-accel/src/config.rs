//! Build parameters for the acceleration structures.
//!
//! All settings deserialize from TOML with defaults for every field, so an
//! empty table is a valid configuration:
//!
//! ```toml
//! type = "kdtree"
//! isect_cost = 80
//! traversal_cost = 1
//! empty_bonus = 0.5
//! max_prims = 1
//! max_depth = -1
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AccelError, Result};

/// Largest leaf size the BVH builder accepts; larger requests are clamped.
pub const MAX_PRIMS_IN_NODE_LIMIT: usize = 255;

/// How the BVH builder chooses where to split a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitMethod {
    /// Surface area heuristic over 12 centroid buckets.
    #[default]
    #[serde(rename = "sah")]
    Sah,
    /// Spatial midpoint of the centroid bounds.
    #[serde(rename = "middle")]
    Middle,
    /// Object median by centroid.
    #[serde(rename = "equal", alias = "equalcounts")]
    EqualCounts,
    /// Linear BVH from Morton codes. Not implemented; builds with SAH.
    #[serde(rename = "hlbvh")]
    Hlbvh,
}

impl FromStr for SplitMethod {
    type Err = AccelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sah" => Ok(Self::Sah),
            "middle" => Ok(Self::Middle),
            "equal" | "equalcounts" => Ok(Self::EqualCounts),
            "hlbvh" => Ok(Self::Hlbvh),
            _ => Err(AccelError::UnknownSplitMethod(s.to_string())),
        }
    }
}

impl SplitMethod {
    /// Canonical lowercase name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sah => "sah",
            Self::Middle => "middle",
            Self::EqualCounts => "equal",
            Self::Hlbvh => "hlbvh",
        }
    }
}

impl fmt::Display for SplitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// BVH build parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhConfig {
    /// Leaf size below which the SAH builder may stop splitting.
    pub max_prims_in_node: usize,
    /// Split heuristic.
    pub split_method: SplitMethod,
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self {
            max_prims_in_node: 4,
            split_method: SplitMethod::Sah,
        }
    }
}

impl BvhConfig {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.max_prims_in_node == 0 {
            return Err(AccelError::InvalidParameter {
                name: "max_prims_in_node",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// `max_prims_in_node` clamped to what a leaf can hold.
    pub fn effective_max_prims(&self) -> usize {
        self.max_prims_in_node.clamp(1, MAX_PRIMS_IN_NODE_LIMIT)
    }
}

/// K-d tree build parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdTreeConfig {
    /// Estimated cost of one primitive intersection test.
    pub isect_cost: i32,
    /// Estimated cost of visiting one interior node.
    pub traversal_cost: i32,
    /// Fraction of the cost discounted when a split leaves one side empty.
    pub empty_bonus: f64,
    /// Nodes with at most this many primitives become leaves.
    pub max_prims: usize,
    /// Maximum tree depth; `<= 0` derives `round(8 + 1.3 * log2(N))`.
    pub max_depth: i32,
}

impl Default for KdTreeConfig {
    fn default() -> Self {
        Self {
            isect_cost: 80,
            traversal_cost: 1,
            empty_bonus: 0.5,
            max_prims: 1,
            max_depth: -1,
        }
    }
}

impl KdTreeConfig {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.isect_cost < 0 {
            return Err(AccelError::InvalidParameter {
                name: "isect_cost",
                reason: format!("must be non-negative, got {}", self.isect_cost),
            });
        }
        if self.traversal_cost < 0 {
            return Err(AccelError::InvalidParameter {
                name: "traversal_cost",
                reason: format!("must be non-negative, got {}", self.traversal_cost),
            });
        }
        if !(0.0..=1.0).contains(&self.empty_bonus) {
            return Err(AccelError::InvalidParameter {
                name: "empty_bonus",
                reason: format!("must lie in [0, 1], got {}", self.empty_bonus),
            });
        }
        Ok(())
    }

    /// Depth limit for a tree over `prim_count` primitives.
    pub fn resolved_max_depth(&self, prim_count: usize) -> usize {
        if self.max_depth > 0 {
            return self.max_depth as usize;
        }
        if prim_count == 0 {
            return 0;
        }
        let log2 = prim_count.ilog2();
        (8.0 + 1.3 * f64::from(log2)).round() as usize
    }
}

/// Which acceleration structure to build, with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AcceleratorConfig {
    /// Bounding volume hierarchy.
    #[serde(rename = "bvh")]
    Bvh(BvhConfig),
    /// K-d tree.
    #[serde(rename = "kdtree")]
    KdTree(KdTreeConfig),
}

impl Default for AcceleratorConfig {
    fn default() -> Self {
        Self::Bvh(BvhConfig::default())
    }
}

impl AcceleratorConfig {
    /// Default configuration for an accelerator by name (`bvh` or `kdtree`).
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bvh" => Ok(Self::Bvh(BvhConfig::default())),
            "kdtree" | "kd" => Ok(Self::KdTree(KdTreeConfig::default())),
            _ => Err(AccelError::UnknownAccelerator(name.to_string())),
        }
    }

    /// Short name of the selected accelerator.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bvh(_) => "bvh",
            Self::KdTree(_) => "kdtree",
        }
    }

    /// Check parameter ranges of the selected accelerator.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Bvh(c) => c.validate(),
            Self::KdTree(c) => c.validate(),
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_method_from_str() {
        assert_eq!("sah".parse::<SplitMethod>().unwrap(), SplitMethod::Sah);
        assert_eq!("Middle".parse::<SplitMethod>().unwrap(), SplitMethod::Middle);
        assert_eq!("equal".parse::<SplitMethod>().unwrap(), SplitMethod::EqualCounts);
        assert_eq!("hlbvh".parse::<SplitMethod>().unwrap(), SplitMethod::Hlbvh);
        assert!(matches!(
            "octree".parse::<SplitMethod>(),
            Err(AccelError::UnknownSplitMethod(_))
        ));
    }

    #[test]
    fn test_split_method_display_round_trips() {
        for m in [
            SplitMethod::Sah,
            SplitMethod::Middle,
            SplitMethod::EqualCounts,
            SplitMethod::Hlbvh,
        ] {
            assert_eq!(m.to_string().parse::<SplitMethod>().unwrap(), m);
        }
    }

    #[test]
    fn test_bvh_toml_defaults() {
        let config = AcceleratorConfig::from_toml_str("type = \"bvh\"").unwrap();
        assert_eq!(config, AcceleratorConfig::Bvh(BvhConfig::default()));
    }

    #[test]
    fn test_bvh_toml_fields() {
        let config = AcceleratorConfig::from_toml_str(
            "type = \"bvh\"\nmax_prims_in_node = 2\nsplit_method = \"middle\"",
        )
        .unwrap();
        let AcceleratorConfig::Bvh(bvh) = config else {
            panic!("expected bvh config");
        };
        assert_eq!(bvh.max_prims_in_node, 2);
        assert_eq!(bvh.split_method, SplitMethod::Middle);
    }

    #[test]
    fn test_kdtree_toml_fields() {
        let config = AcceleratorConfig::from_toml_str(
            "type = \"kdtree\"\nisect_cost = 40\nempty_bonus = 0.25\nmax_depth = 12",
        )
        .unwrap();
        let AcceleratorConfig::KdTree(kd) = config else {
            panic!("expected kdtree config");
        };
        assert_eq!(kd.isect_cost, 40);
        assert_eq!(kd.traversal_cost, 1);
        assert_eq!(kd.empty_bonus, 0.25);
        assert_eq!(kd.max_depth, 12);
    }

    #[test]
    fn test_toml_rejects_bad_values() {
        assert!(matches!(
            AcceleratorConfig::from_toml_str("type = \"bvh\"\nmax_prims_in_node = 0"),
            Err(AccelError::InvalidParameter { name: "max_prims_in_node", .. })
        ));
        assert!(matches!(
            AcceleratorConfig::from_toml_str("type = \"kdtree\"\nempty_bonus = 1.5"),
            Err(AccelError::InvalidParameter { name: "empty_bonus", .. })
        ));
        assert!(matches!(
            AcceleratorConfig::from_toml_str("type = \"octree\""),
            Err(AccelError::Parse(_))
        ));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(AcceleratorConfig::from_name("bvh").unwrap().name(), "bvh");
        assert_eq!(AcceleratorConfig::from_name("KdTree").unwrap().name(), "kdtree");
        assert!(AcceleratorConfig::from_name("grid").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("lumen-accel-config-{}.toml", std::process::id()));
        std::fs::write(&path, "type = \"kdtree\"\nmax_prims = 2\n").unwrap();
        let loaded = AcceleratorConfig::load(&path);
        std::fs::remove_file(&path).unwrap();

        let AcceleratorConfig::KdTree(kd) = loaded.unwrap() else {
            panic!("expected kdtree config");
        };
        assert_eq!(kd.max_prims, 2);
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("lumen-accel-no-such-dir").join("accel.toml");
        assert!(matches!(AcceleratorConfig::load(&path), Err(AccelError::Io(_))));
    }

    #[test]
    fn test_max_prims_clamped() {
        let config = BvhConfig {
            max_prims_in_node: 1000,
            ..BvhConfig::default()
        };
        assert_eq!(config.effective_max_prims(), MAX_PRIMS_IN_NODE_LIMIT);
    }

    #[test]
    fn test_resolved_max_depth() {
        let config = KdTreeConfig::default();
        assert_eq!(config.resolved_max_depth(0), 0);
        assert_eq!(config.resolved_max_depth(1), 8);
        // 8 + 1.3 * 10 = 21
        assert_eq!(config.resolved_max_depth(1024), 21);
        // floor(log2(1000)) = 9, 8 + 11.7 = 19.7
        assert_eq!(config.resolved_max_depth(1000), 20);

        let fixed = KdTreeConfig {
            max_depth: 5,
            ..KdTreeConfig::default()
        };
        assert_eq!(fixed.resolved_max_depth(1_000_000), 5);
    }
}
