//! Occlusion output values.

/// Why a result holds the values it does.
///
/// Only [`OcclusionStatus::Computed`] results come from casting rays. The other
/// variants all report zero occlusion but mean different things, so a playback
/// layer can e.g. mute out-of-range sources instead of playing them unfiltered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OcclusionStatus {
    /// Rays were cast against the scene
    Computed,
    /// Source was farther from the listener than the probe range
    OutOfRange,
    /// No listener could be resolved
    NoListener,
    /// Probing is disabled by the source profile (e.g. non-positive range)
    Disabled,
}

/// Directional and spatial occlusion of one source.
///
/// Both occlusion values are always in `[0, 1]`, where 0 is fully clear and 1
/// fully blocked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcclusionResult {
    /// Blockage along the focused cone toward the listener
    pub directional: f32,
    /// Blockage of the source's surroundings
    pub spatial: f32,
    /// Straight-line source-to-listener distance at computation time
    pub distance: f32,
    /// Engine time (seconds) the result was computed at
    pub timestamp: f64,
    pub status: OcclusionStatus,
}

fn unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl OcclusionResult {
    /// Ray-probed result; values are clamped into `[0, 1]`.
    pub fn computed(directional: f32, spatial: f32, distance: f32, timestamp: f64) -> Self {
        Self {
            directional: unit(directional),
            spatial: unit(spatial),
            distance,
            timestamp,
            status: OcclusionStatus::Computed,
        }
    }

    pub fn out_of_range(distance: f32, timestamp: f64) -> Self {
        Self::clear(distance, timestamp, OcclusionStatus::OutOfRange)
    }

    /// Neutral result used when no listener exists
    pub fn no_listener(timestamp: f64) -> Self {
        Self::clear(0.0, timestamp, OcclusionStatus::NoListener)
    }

    pub fn disabled(distance: f32, timestamp: f64) -> Self {
        Self::clear(distance, timestamp, OcclusionStatus::Disabled)
    }

    fn clear(distance: f32, timestamp: f64, status: OcclusionStatus) -> Self {
        Self {
            directional: 0.0,
            spatial: 0.0,
            distance,
            timestamp,
            status,
        }
    }

    pub fn is_out_of_range(&self) -> bool {
        self.status == OcclusionStatus::OutOfRange
    }

    /// Returns true if rays were actually cast to produce this result
    pub fn is_probed(&self) -> bool {
        self.status == OcclusionStatus::Computed
    }
}
