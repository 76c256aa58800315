//! Obstacle query trait consumed by the occlusion probes.
//!
//! The occlusion engine never owns scene geometry. Callers hand it something
//! that implements [`ObstacleSurface`] every tick, typically a thin adapter
//! over their physics or collision world.

use crate::math::Vec2;
use std::cell::Cell;

/// Bit mask selecting which obstacle layers a ray interacts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);

    /// Mask containing only layer `index` (0..32).
    pub const fn layer(index: u32) -> Self {
        Self(1 << (index % 32))
    }

    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Closest intersection of a ray with obstacle geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// World-space hit point
    pub point: Vec2,

    /// Surface normal at the hit point (normalized)
    ///
    /// Used for bounce reflection. Either orientation is accepted; probes flip
    /// it to face the incoming ray.
    pub normal: Vec2,

    /// Distance from the ray origin to `point`
    pub distance: f32,
}

impl RayHit {
    pub fn new(point: Vec2, normal: Vec2, distance: f32) -> Self {
        Self {
            point,
            normal,
            distance,
        }
    }
}

/// Read-only ray query surface for opaque obstacles.
///
/// # Notes
///
/// - `direction` is normalized by the caller
/// - Return the **closest** hit within `max_distance`, or `None`
/// - Only obstacles whose layers intersect `mask` may block the ray
pub trait ObstacleSurface {
    fn cast_ray(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit>;
}

impl<T: ObstacleSurface + ?Sized> ObstacleSurface for &T {
    fn cast_ray(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit> {
        (**self).cast_ray(origin, direction, max_distance, mask)
    }
}

impl<T: ObstacleSurface + ?Sized> ObstacleSurface for Box<T> {
    fn cast_ray(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit> {
        (**self).cast_ray(origin, direction, max_distance, mask)
    }
}

/// Wraps a surface and counts every ray cast issued through it.
///
/// The scheduler uses this to report per-tick ray volume.
pub struct CountingSurface<'a> {
    inner: &'a dyn ObstacleSurface,
    casts: Cell<usize>,
}

impl<'a> CountingSurface<'a> {
    pub fn new(inner: &'a dyn ObstacleSurface) -> Self {
        Self {
            inner,
            casts: Cell::new(0),
        }
    }

    pub fn casts(&self) -> usize {
        self.casts.get()
    }
}

impl ObstacleSurface for CountingSurface<'_> {
    fn cast_ray(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit> {
        self.casts.set(self.casts.get() + 1);
        self.inner.cast_ray(origin, direction, max_distance, mask)
    }
}
