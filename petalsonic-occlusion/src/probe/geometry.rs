//! Single bouncing probe ray.

use crate::math::{Vec2, closest_point_on_segment, reflect};
use crate::scene::{LayerMask, ObstacleSurface};

/// Shared inputs for every ray cast during one occlusion computation.
#[derive(Clone, Copy)]
pub struct ProbeContext<'a> {
    pub surface: &'a dyn ObstacleSurface,
    pub layer_mask: LayerMask,
    /// Distance a bounced ray is pushed off the surface before the next cast
    pub surface_nudge: f32,
}

impl<'a> ProbeContext<'a> {
    pub fn new(surface: &'a dyn ObstacleSurface) -> Self {
        Self {
            surface,
            layer_mask: LayerMask::ALL,
            surface_nudge: 1e-3,
        }
    }

    pub fn with_layer_mask(mut self, mask: LayerMask) -> Self {
        self.layer_mask = mask;
        self
    }

    pub fn with_surface_nudge(mut self, nudge: f32) -> Self {
        self.surface_nudge = nudge;
        self
    }
}

/// What happened to one probe ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeOutcome {
    /// Some segment of the path passed within the hit radius of the listener
    pub reached: bool,
    /// Reflections performed before the path ended
    pub bounces: u32,
    /// Ray casts issued against the surface
    pub casts: u32,
}

/// Casts a ray that reflects off obstacles and checks whether any segment of
/// its path passes within `hit_radius` of the listener.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryProbe {
    pub max_distance: f32,
    pub max_bounces: u32,
    pub hit_radius: f32,
}

impl GeometryProbe {
    pub fn new(max_distance: f32, max_bounces: u32, hit_radius: f32) -> Self {
        Self {
            max_distance,
            max_bounces,
            hit_radius,
        }
    }

    /// Returns true if the bounced path from `origin` along `direction` connects to `listener`.
    pub fn probe(
        &self,
        ctx: &ProbeContext<'_>,
        origin: Vec2,
        direction: Vec2,
        listener: Vec2,
    ) -> bool {
        self.trace(ctx, origin, direction, listener).reached
    }

    /// Traces the full bounce chain.
    ///
    /// Each segment runs from the current origin to the hit point, or to the
    /// end of the remaining distance on a miss. Once a segment comes within the
    /// hit radius (inclusive) the path counts as connecting and tracing stops.
    pub fn trace(
        &self,
        ctx: &ProbeContext<'_>,
        origin: Vec2,
        direction: Vec2,
        listener: Vec2,
    ) -> ProbeOutcome {
        let mut outcome = ProbeOutcome {
            reached: false,
            bounces: 0,
            casts: 0,
        };

        let Some(mut direction) = direction.try_normalize() else {
            return outcome;
        };
        if !(self.max_distance > 0.0) {
            return outcome;
        }

        let radius_squared = self.hit_radius.max(0.0).powi(2);
        let mut origin = origin;
        let mut remaining = self.max_distance;

        loop {
            let hit = ctx
                .surface
                .cast_ray(origin, direction, remaining, ctx.layer_mask);
            outcome.casts += 1;

            let end = hit.map_or(origin + direction * remaining, |hit| hit.point);
            let closest = closest_point_on_segment(origin, end, listener);
            if closest.distance_squared(listener) <= radius_squared {
                outcome.reached = true;
                break;
            }

            // Open space: the ray escapes without connecting.
            let Some(hit) = hit else {
                break;
            };

            remaining -= hit.distance;
            if outcome.bounces >= self.max_bounces || remaining <= 0.0 {
                break;
            }

            let mut normal = hit.normal.try_normalize().unwrap_or(-direction);
            if normal.dot(direction) > 0.0 {
                normal = -normal;
            }
            direction = reflect(direction, normal)
                .try_normalize()
                .unwrap_or(-direction);
            origin = hit.point + normal * ctx.surface_nudge;
            outcome.bounces += 1;
        }

        outcome
    }
}
