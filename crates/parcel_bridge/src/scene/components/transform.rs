//! Transform component
//!
//! Pure data: position, rotation and scale relative to the entity's parent.
//! Scenes send transforms as JSON; [`TransformComponent::from_json`] is the
//! single place that schema is parsed.

use crate::foundation::math::{is_finite_vec3, quat_from_lanes, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Transform component
///
/// Default is the identity: origin, no rotation, unit scale.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformComponent {
    /// Position relative to the parent
    pub position: Vec3,

    /// Rotation relative to the parent
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Vec3Json {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct QuatJson {
    x: f32,
    y: f32,
    z: f32,
    w: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct TransformJson {
    position: Vec3Json,
    rotation: QuatJson,
    scale: Vec3Json,
}

impl From<Vec3Json> for Vec3 {
    fn from(v: Vec3Json) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<&Vec3> for Vec3Json {
    fn from(v: &Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl TransformComponent {
    /// Create identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create from position, rotation and scale
    pub fn from_transform(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Builder pattern: Set position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Builder pattern: Set rotation from quaternion
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder pattern: Set rotation from Euler angles (radians)
    pub fn with_rotation_euler(mut self, roll: f32, pitch: f32, yaw: f32) -> Self {
        self.rotation = Quat::from_euler_angles(roll, pitch, yaw);
        self
    }

    /// Builder pattern: Set scale (non-uniform)
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Compose a child transform under this one
    pub fn combine(&self, child: &Self) -> Self {
        Self {
            position: self.position + self.rotation * self.scale.component_mul(&child.position),
            rotation: self.rotation * child.rotation,
            scale: self.scale.component_mul(&child.scale),
        }
    }

    /// Parse `{"position":{..},"rotation":{..},"scale":{..}}`.
    ///
    /// All three parts are required and each replaces the previous value
    /// wholesale.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let raw: TransformJson = serde_json::from_str(json).map_err(|e| e.to_string())?;
        let position = Vec3::from(raw.position);
        let scale = Vec3::from(raw.scale);
        if !is_finite_vec3(&position) || !is_finite_vec3(&scale) {
            return Err("transform contains non-finite values".to_string());
        }
        let QuatJson { x, y, z, w } = raw.rotation;
        let rotation = quat_from_lanes(x, y, z, w)
            .ok_or_else(|| "rotation is not a usable quaternion".to_string())?;
        Ok(Self {
            position,
            rotation,
            scale,
        })
    }

    /// Serialize to the JSON shape accepted by [`Self::from_json`]
    pub fn to_json(&self) -> String {
        let raw = TransformJson {
            position: Vec3Json::from(&self.position),
            rotation: QuatJson {
                x: self.rotation.i,
                y: self.rotation.j,
                z: self.rotation.k,
                w: self.rotation.w,
            },
            scale: Vec3Json::from(&self.scale),
        };
        // Plain structs of floats always serialize
        serde_json::to_string(&raw).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        let t = TransformComponent::default();
        assert_eq!(t.position, Vec3::zeros());
        assert_eq!(t.rotation, Quat::identity());
        assert_eq!(t.scale, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn parses_full_payload() {
        let json = r#"{"position":{"x":5,"y":1,"z":5},
            "rotation":{"x":0,"y":0,"z":0,"w":1},
            "scale":{"x":0.7,"y":0.7,"z":0.7}}"#;
        let t = TransformComponent::from_json(json).expect("valid transform");
        assert_eq!(t.position, Vec3::new(5.0, 1.0, 5.0));
        assert_eq!(t.scale, Vec3::new(0.7, 0.7, 0.7));
    }

    #[test]
    fn partial_payload_is_rejected() {
        assert!(TransformComponent::from_json(r#"{"position":{"x":1,"y":2,"z":3}}"#).is_err());
    }

    #[test]
    fn zero_rotation_is_rejected() {
        let json = r#"{"position":{"x":0,"y":0,"z":0},
            "rotation":{"x":0,"y":0,"z":0,"w":0},
            "scale":{"x":1,"y":1,"z":1}}"#;
        assert!(TransformComponent::from_json(json).is_err());
    }

    #[test]
    fn json_output_parses_back() {
        let t = TransformComponent::identity()
            .with_position(Vec3::new(51.0, 13.0, 52.0))
            .with_rotation_euler(0.3, 0.2, 0.1)
            .with_scale(Vec3::new(1.7, 3.7, -0.7));
        let back = TransformComponent::from_json(&t.to_json()).expect("round trip");
        assert_eq!(back.position, t.position);
        assert_eq!(back.scale, t.scale);
        assert!((back.rotation.angle_to(&t.rotation)).abs() < 1e-5);
    }
}
