//! Math types for PetalSonic occlusion
//!
//! The occlusion engine works on the horizontal plane only, so every position
//! and direction is a [`Vec2`].

pub use glam::Vec2;

/// Position and optional facing of an emitter on the 2D plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2 {
    pub position: Vec2,
    pub facing: Option<Vec2>,
}

impl Pose2 {
    pub fn new(position: Vec2, facing: Vec2) -> Self {
        Self {
            position,
            facing: Some(facing),
        }
    }

    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            facing: None,
        }
    }

    /// Normalized facing, falling back to +X when none is set or the facing is degenerate.
    pub fn forward(&self) -> Vec2 {
        self.facing
            .and_then(|facing| facing.try_normalize())
            .unwrap_or(Vec2::X)
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.position.distance(other.position)
    }
}

impl Default for Pose2 {
    fn default() -> Self {
        Self::from_position(Vec2::ZERO)
    }
}

impl From<Vec2> for Pose2 {
    fn from(position: Vec2) -> Self {
        Self::from_position(position)
    }
}

/// Specular reflection of `direction` about a surface with normal `normal`.
///
/// `normal` is expected to be unit length; the result keeps the length of `direction`.
pub fn reflect(direction: Vec2, normal: Vec2) -> Vec2 {
    direction - 2.0 * direction.dot(normal) * normal
}

/// Rotates `direction` counter-clockwise by `degrees`.
pub fn rotate_degrees(direction: Vec2, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians()).rotate(direction)
}

/// Closest point to `point` on the segment `start..end`.
pub fn closest_point_on_segment(start: Vec2, end: Vec2, point: Vec2) -> Vec2 {
    let segment = end - start;
    let length_squared = segment.length_squared();
    if length_squared <= f32::EPSILON {
        return start;
    }
    let t = ((point - start).dot(segment) / length_squared).clamp(0.0, 1.0);
    start + segment * t
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
