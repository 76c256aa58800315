//! Fans probe rays across a cone and aggregates how many connect.

use super::geometry::{GeometryProbe, ProbeContext};
use crate::math::{Vec2, rotate_degrees};

/// Angular offsets (degrees) of `ray_count` rays spread evenly over
/// `[-cone_degrees / 2, +cone_degrees / 2]`.
///
/// A single ray points straight along the base direction. Non-positive ray
/// counts produce no offsets.
pub fn fan_offsets(cone_degrees: f32, ray_count: i32) -> impl Iterator<Item = f32> {
    let count = ray_count.max(0) as usize;
    let half = cone_degrees * 0.5;
    let step = if count > 1 {
        cone_degrees / (count - 1) as f32
    } else {
        0.0
    };
    (0..count).map(move |i| {
        if count == 1 {
            0.0
        } else {
            -half + step * i as f32
        }
    })
}

/// Cone angle that spreads `ray_count` rays around the full circle without the
/// first and last ray landing on the same angle.
pub fn spatial_cone_degrees(ray_count: i32) -> f32 {
    if ray_count <= 0 {
        return 0.0;
    }
    360.0 - 360.0 / ray_count as f32
}

/// Aggregates [`GeometryProbe`] results over a fan of directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeSampler {
    pub probe: GeometryProbe,
}

impl ConeSampler {
    pub fn new(probe: GeometryProbe) -> Self {
        Self { probe }
    }

    /// Fraction of rays in the cone that fail to connect to the listener.
    ///
    /// Returns 0.0 when every ray connects, 1.0 when none do, and 0.0 without
    /// probing when `ray_count <= 0` or the base direction is degenerate.
    pub fn sample_cone(
        &self,
        ctx: &ProbeContext<'_>,
        origin: Vec2,
        base_direction: Vec2,
        cone_degrees: f32,
        ray_count: i32,
        listener: Vec2,
    ) -> f32 {
        if ray_count <= 0 {
            return 0.0;
        }
        let Some(base) = base_direction.try_normalize() else {
            return 0.0;
        };

        let reached = fan_offsets(cone_degrees, ray_count)
            .filter(|&offset| {
                self.probe
                    .probe(ctx, origin, rotate_degrees(base, offset), listener)
            })
            .count();

        1.0 - reached as f32 / ray_count as f32
    }

    /// Full-circle variant of [`sample_cone`](Self::sample_cone).
    ///
    /// The base direction only decides where the evenly spaced rays start.
    /// Rays that escape without passing near the listener count as not
    /// reached, so a source in an open field reads high spatial occlusion.
    pub fn sample_spatial(
        &self,
        ctx: &ProbeContext<'_>,
        origin: Vec2,
        base_direction: Vec2,
        ray_count: i32,
        listener: Vec2,
    ) -> f32 {
        let base = base_direction.try_normalize().unwrap_or(Vec2::X);
        self.sample_cone(
            ctx,
            origin,
            base,
            spatial_cone_degrees(ray_count),
            ray_count,
            listener,
        )
    }
}
