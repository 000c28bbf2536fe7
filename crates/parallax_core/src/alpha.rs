//! Foreground disocclusion correction
//!
//! Close to the sphere center the foreground's depth errors open holes, so
//! its mask is faded toward opaque there and trusted again as the head moves
//! away. The blend weight is a logistic curve of the head's distance from the
//! sphere center.

use crate::math::Vec3;
use serde::{Deserialize, Serialize};

/// Logistic fade between "opaque" and "raw mask"
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisocclusionCurve {
    /// Constant added to the measured distance
    pub offset: f32,
    /// Logistic steepness `k`
    pub steepness: f32,
    /// Logistic midpoint `c`
    pub midpoint: f32,
}

impl Default for DisocclusionCurve {
    fn default() -> Self {
        Self {
            offset: 0.05,
            steepness: 30.0,
            midpoint: 0.15,
        }
    }
}

impl DisocclusionCurve {
    /// Head distance fed into the curve.
    ///
    /// Sums dy² + dz² + dz²: the x difference is not used and z counts twice.
    pub fn distance(&self, head_position: Vec3, sphere_center: Vec3) -> f32 {
        let dy = head_position.y - sphere_center.y;
        let dz = head_position.z - sphere_center.z;
        self.offset + (dy * dy + dz * dz + dz * dz).sqrt()
    }

    /// Logistic weight `S` of the raw mask at `distance`
    pub fn weight(&self, distance: f32) -> f32 {
        1.0 / (1.0 + (-self.steepness * (distance - self.midpoint)).exp())
    }

    /// Corrected alpha: `|(1 - S) + raw * S|`
    pub fn correct(&self, raw_alpha: f32, distance: f32) -> f32 {
        let s = self.weight(distance);
        ((1.0 - s) * 1.0 + raw_alpha * s).abs()
    }

    /// Corrected alpha for a head pose
    pub fn correct_for_head(&self, raw_alpha: f32, head_position: Vec3, sphere_center: Vec3) -> f32 {
        self.correct(raw_alpha, self.distance(head_position, sphere_center))
    }
}
