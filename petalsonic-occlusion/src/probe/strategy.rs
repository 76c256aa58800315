//! Interchangeable occlusion models behind one interface.

use super::cone::ConeSampler;
use super::geometry::{GeometryProbe, ProbeContext};
use super::lateral::LateralTriProbe;
use crate::config::{ConeSettings, LateralSettings, ProbeModel, SourceProfile};
use crate::math::{Pose2, Vec2};
use crate::result::OcclusionResult;

/// Directional and spatial occlusion pair produced by a strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occlusion {
    pub directional: f32,
    pub spatial: f32,
}

/// Computes occlusion for a source that is in range of the listener.
///
/// Range cutoff and missing listeners are handled before a strategy runs, see
/// [`compute_occlusion`].
pub trait OcclusionStrategy {
    fn compute(&self, ctx: &ProbeContext<'_>, source: Pose2, listener: Vec2) -> Occlusion;
}

/// Bouncing-ray cone model: a narrow cone toward the listener for directional
/// occlusion and a full circle for spatial occlusion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConeStrategy {
    pub settings: ConeSettings,
    sampler: ConeSampler,
}

impl ConeStrategy {
    pub fn new(settings: ConeSettings, max_distance: f32, hit_radius: f32) -> Self {
        let sampler = ConeSampler::new(GeometryProbe::new(
            max_distance,
            settings.max_bounces,
            hit_radius,
        ));
        Self { settings, sampler }
    }
}

impl OcclusionStrategy for ConeStrategy {
    fn compute(&self, ctx: &ProbeContext<'_>, source: Pose2, listener: Vec2) -> Occlusion {
        let directional = self.sampler.sample_cone(
            ctx,
            source.position,
            listener - source.position,
            self.settings.directional_cone_degrees,
            self.settings.directional_rays,
            listener,
        );
        let spatial = self.sampler.sample_spatial(
            ctx,
            source.position,
            source.forward(),
            self.settings.spatial_rays,
            listener,
        );
        Occlusion {
            directional,
            spatial,
        }
    }
}

/// Three-ray lateral model with discretized spatial levels.
#[derive(Debug, Clone, PartialEq)]
pub struct LateralStrategy {
    probe: LateralTriProbe,
}

impl LateralStrategy {
    pub fn new(settings: LateralSettings) -> Self {
        Self {
            probe: LateralTriProbe::new(settings),
        }
    }
}

impl OcclusionStrategy for LateralStrategy {
    fn compute(&self, ctx: &ProbeContext<'_>, source: Pose2, listener: Vec2) -> Occlusion {
        let outcome = self.probe.tri_probe(ctx, source.position, listener);
        Occlusion {
            directional: outcome.directional,
            spatial: outcome.spatial,
        }
    }
}

/// Builds the strategy selected by `profile.model`.
pub fn build_strategy(profile: &SourceProfile) -> Box<dyn OcclusionStrategy> {
    match &profile.model {
        ProbeModel::Cone(settings) => Box::new(ConeStrategy::new(
            settings.clone(),
            profile.max_distance,
            profile.hit_radius,
        )),
        ProbeModel::Lateral(settings) => Box::new(LateralStrategy::new(settings.clone())),
    }
}

/// Full occlusion computation for one source, including the short-circuits
/// that skip ray casting entirely.
///
/// - no listener ⇒ neutral result
/// - non-positive `max_distance` ⇒ disabled
/// - distance beyond `max_distance` ⇒ out of range
/// - source on top of the listener ⇒ clear
pub fn compute_occlusion(
    ctx: &ProbeContext<'_>,
    strategy: &dyn OcclusionStrategy,
    profile: &SourceProfile,
    source: Pose2,
    listener: Option<Vec2>,
    now: f64,
) -> OcclusionResult {
    let Some(listener) = listener else {
        return OcclusionResult::no_listener(now);
    };

    let distance = source.position.distance(listener);
    if !(profile.max_distance > 0.0) {
        return OcclusionResult::disabled(distance, now);
    }
    if distance > profile.max_distance {
        return OcclusionResult::out_of_range(distance, now);
    }
    if distance <= f32::EPSILON {
        return OcclusionResult::computed(0.0, 0.0, distance, now);
    }

    let occlusion = strategy.compute(ctx, source, listener);
    OcclusionResult::computed(occlusion.directional, occlusion.spatial, distance, now)
}
