//! Viewer configuration
//!
//! All tunables of the layered proxy live in one TOML document:
//!
//! ```toml
//! [proxy]
//! radius = 6.0
//! width_segments = 256
//! height_segments = 256
//!
//! [group]
//! position = { x = 0.0, y = 1.7, z = 0.0 }
//! recenter_on_first_frame = true
//!
//! [depth]
//! scale = 0.3
//! background_epsilon = 0.001
//! midground_epsilon = 0.002
//! foreground_epsilon = 0.003
//!
//! [disocclusion]
//! offset = 0.05
//! steepness = 30.0
//! midpoint = 0.15
//!
//! [playback]
//! initial_layer_count = 3
//! ```
//!
//! Every table and field is optional; missing values take the defaults above.

use crate::alpha::DisocclusionCurve;
use crate::error::{ParallaxError, Result};
use crate::layer::LayerRole;
use crate::math::Vec3;
use crate::warp::DEFAULT_DEPTH_SCALE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete viewer configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub proxy: ProxyConfig,
    pub group: GroupConfig,
    pub depth: DepthConfig,
    pub disocclusion: DisocclusionCurve,
    pub playback: PlaybackConfig,
}

/// Shared spherical proxy tessellation
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            radius: 6.0,
            width_segments: 256,
            height_segments: 256,
        }
    }
}

/// Placement of the proxy group in the scene
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Initial world position of the sphere center
    pub position: Vec3,
    /// Move the group onto the head position on the first update
    pub recenter_on_first_frame: bool,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.7, 0.0),
            recenter_on_first_frame: true,
        }
    }
}

/// Jump depth encoding constants
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DepthConfig {
    /// Numerator `k` of `k / (d + eps)`
    pub scale: f32,
    pub background_epsilon: f32,
    pub midground_epsilon: f32,
    pub foreground_epsilon: f32,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_DEPTH_SCALE,
            background_epsilon: LayerRole::Background.default_epsilon(),
            midground_epsilon: LayerRole::Midground.default_epsilon(),
            foreground_epsilon: LayerRole::Foreground.default_epsilon(),
        }
    }
}

impl DepthConfig {
    /// Epsilon used by a layer's depth encoding
    pub fn epsilon(&self, role: LayerRole) -> f32 {
        match role {
            LayerRole::Background => self.background_epsilon,
            LayerRole::Midground => self.midground_epsilon,
            LayerRole::Foreground => self.foreground_epsilon,
        }
    }
}

/// Playback and visibility defaults
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Layer count applied when the player is created (clamped to 1..=3)
    pub initial_layer_count: i32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            initial_layer_count: 3,
        }
    }
}

impl ViewerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: ViewerConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!("loaded viewer config from {}", path.display());
        Ok(config)
    }

    /// Farthest a warped vertex can land from the sphere center
    ///
    /// A raw depth of zero scales the proxy by `scale / epsilon`; the smallest
    /// epsilon gives the largest radius.
    pub fn max_warp_radius(&self) -> f32 {
        let min_epsilon = LayerRole::ALL
            .into_iter()
            .map(|role| self.depth.epsilon(role))
            .fold(f32::INFINITY, f32::min);
        self.proxy.radius * self.depth.scale / min_epsilon
    }

    /// Check every value against its valid range
    pub fn validate(&self) -> Result<()> {
        if !positive(self.proxy.radius) {
            return Err(invalid(format!(
                "proxy.radius must be positive, got {}",
                self.proxy.radius
            )));
        }
        if self.proxy.width_segments < 3 || self.proxy.height_segments < 2 {
            return Err(invalid(format!(
                "proxy needs at least 3x2 segments, got {}x{}",
                self.proxy.width_segments, self.proxy.height_segments
            )));
        }
        if !positive(self.depth.scale) {
            return Err(invalid(format!(
                "depth.scale must be positive, got {}",
                self.depth.scale
            )));
        }
        for role in LayerRole::ALL {
            let epsilon = self.depth.epsilon(role);
            if !positive(epsilon) {
                return Err(invalid(format!(
                    "{} epsilon must be positive, got {}",
                    role.name(),
                    epsilon
                )));
            }
        }
        if !self.disocclusion.steepness.is_finite() || !self.disocclusion.midpoint.is_finite() {
            return Err(invalid("disocclusion curve must be finite".to_string()));
        }
        Ok(())
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn invalid(message: String) -> ParallaxError {
    ParallaxError::InvalidConfig(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.proxy.width_segments, 256);
        assert!((config.depth.scale - 0.3).abs() < 1e-6);
        assert!((config.group.position.y - 1.7).abs() < 1e-6);
    }

    #[test]
    fn test_partial_document() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [proxy]
            radius = 10.0

            [depth]
            foreground_epsilon = 0.01
            "#,
        )
        .unwrap();
        assert!((config.proxy.radius - 10.0).abs() < 1e-6);
        assert_eq!(config.proxy.height_segments, 256);
        assert!((config.depth.epsilon(LayerRole::Foreground) - 0.01).abs() < 1e-6);
        assert!((config.depth.epsilon(LayerRole::Background) - 0.001).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_non_positive_epsilon() {
        let err = ViewerConfig::from_toml_str("[depth]\nmidground_epsilon = 0.0").unwrap_err();
        assert!(matches!(err, ParallaxError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_coarse_proxy() {
        let err = ViewerConfig::from_toml_str("[proxy]\nwidth_segments = 2").unwrap_err();
        assert!(matches!(err, ParallaxError::InvalidConfig(_)));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = ViewerConfig::from_toml_str("[proxy\nradius = 1").unwrap_err();
        assert!(matches!(err, ParallaxError::ConfigParse(_)));
    }

    #[test]
    fn test_max_warp_radius_uses_smallest_epsilon() {
        let config = ViewerConfig::default();
        assert!((config.max_warp_radius() - 1800.0).abs() < 1e-2);

        let mut config = ViewerConfig::default();
        config.depth.foreground_epsilon = 0.0005;
        assert!((config.max_warp_radius() - 3600.0).abs() < 1e-1);
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = ViewerConfig::default();
        let text = toml::to_string(&config).unwrap();
        assert_eq!(ViewerConfig::from_toml_str(&text).unwrap(), config);
    }
}
