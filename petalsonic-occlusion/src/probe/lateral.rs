//! Cheap three-ray probe producing discretized occlusion.

use super::geometry::ProbeContext;
use crate::config::{DirectionalMode, LateralSettings};
use crate::math::{Vec2, lerp};

/// Raw outcome of the three lateral rays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LateralOutcome {
    /// Number of rays (direct plus two lateral, 0..=3) that hit an obstacle
    pub blocked_count: u8,
    /// Distance of the direct ray's hit from the listener, as a fraction of the
    /// source-listener distance (0 = at the listener, 1 = at the source)
    pub direct_hit_fraction: Option<f32>,
    pub directional: f32,
    pub spatial: f32,
}

/// Direct ray plus two rays offset perpendicular to the source-listener axis,
/// all aimed at the listener, without bounces or hit radius.
#[derive(Debug, Clone, PartialEq)]
pub struct LateralTriProbe {
    pub settings: LateralSettings,
}

impl LateralTriProbe {
    pub fn new(settings: LateralSettings) -> Self {
        Self { settings }
    }

    pub fn tri_probe(&self, ctx: &ProbeContext<'_>, source: Vec2, listener: Vec2) -> LateralOutcome {
        let axis = listener - source;
        let Some(axis_direction) = axis.try_normalize() else {
            return LateralOutcome {
                blocked_count: 0,
                direct_hit_fraction: None,
                directional: 0.0,
                spatial: 0.0,
            };
        };

        let side = axis_direction.perp() * self.settings.lateral_offset;
        let direct = segment_hit_fraction(ctx, source, listener).map(|along| 1.0 - along);
        let blocked_count = [source + side, source - side]
            .into_iter()
            .map(|origin| segment_hit_fraction(ctx, origin, listener))
            .chain(std::iter::once(direct))
            .filter(Option::is_some)
            .count() as u8;

        let directional = match (direct, self.settings.directional_mode) {
            (None, _) => 0.0,
            (Some(_), DirectionalMode::Binary) => 1.0,
            (Some(fraction), DirectionalMode::Fractional { min_blocked_floor }) => {
                lerp(min_blocked_floor, 1.0, 1.0 - fraction)
            }
        };

        LateralOutcome {
            blocked_count,
            direct_hit_fraction: direct,
            directional,
            spatial: self.settings.levels.level(blocked_count),
        }
    }
}

/// Casts a single unbounced segment toward `target` and returns the hit
/// position as a fraction of the segment length.
fn segment_hit_fraction(ctx: &ProbeContext<'_>, origin: Vec2, target: Vec2) -> Option<f32> {
    let segment = target - origin;
    let length = segment.length();
    let direction = segment.try_normalize()?;
    let hit = ctx
        .surface
        .cast_ray(origin, direction, length, ctx.layer_mask)?;
    (hit.distance < length).then(|| (hit.distance / length).clamp(0.0, 1.0))
}
