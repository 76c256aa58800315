//! Ray probing strategies.
//!
//! - [`GeometryProbe`]: one ray, reflecting off obstacles up to a bounce limit
//! - [`ConeSampler`]: fans probes over a cone and returns the blocked fraction
//! - [`LateralTriProbe`]: three straight rays mapped onto discrete levels
//! - [`OcclusionStrategy`]: common interface selected per source profile

pub mod cone;
pub mod geometry;
pub mod lateral;
pub mod strategy;

pub use cone::{ConeSampler, fan_offsets, spatial_cone_degrees};
pub use geometry::{GeometryProbe, ProbeContext, ProbeOutcome};
pub use lateral::{LateralOutcome, LateralTriProbe};
pub use strategy::{
    ConeStrategy, LateralStrategy, Occlusion, OcclusionStrategy, build_strategy,
    compute_occlusion,
};
