use crate::error::{OcclusionError, Result};
use std::time::Duration;

/// Cone-sampled bouncing-ray settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ConeSettings {
    /// Reflections allowed per probe ray (0 = plain line of sight)
    pub max_bounces: u32,
    /// Rays fanned toward the listener. Non-positive disables directional probing.
    pub directional_rays: i32,
    /// Full opening angle of the directional cone, in degrees
    pub directional_cone_degrees: f32,
    /// Rays spread over the full circle. Non-positive disables spatial probing.
    pub spatial_rays: i32,
}

impl Default for ConeSettings {
    fn default() -> Self {
        Self {
            max_bounces: 1,
            directional_rays: 5,
            directional_cone_degrees: 30.0,
            spatial_rays: 16,
        }
    }
}

/// How the lateral model turns the direct ray into a directional value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DirectionalMode {
    /// Blocked direct ray ⇒ 1.0, clear ⇒ 0.0
    #[default]
    Binary,
    /// Scales from `min_blocked_floor` for an obstacle at the source up to 1.0
    /// for one at the listener
    Fractional { min_blocked_floor: f32 },
}

/// Spatial occlusion for one or two blocked lateral rays.
///
/// Zero blocked rays always map to 0.0 and three to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialLevels {
    pub blocked_1: f32,
    pub blocked_2: f32,
}

impl SpatialLevels {
    /// Occlusion level for `blocked_count` blocked rays (saturating at 3).
    pub fn level(&self, blocked_count: u8) -> f32 {
        match blocked_count {
            0 => 0.0,
            1 => self.blocked_1.clamp(0.0, 1.0),
            2 => self.blocked_2.clamp(0.0, 1.0),
            _ => 1.0,
        }
    }
}

impl Default for SpatialLevels {
    fn default() -> Self {
        Self {
            blocked_1: 0.35,
            blocked_2: 0.65,
        }
    }
}

/// Three-ray lateral probe settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LateralSettings {
    /// Perpendicular offset of the two side rays from the source
    pub lateral_offset: f32,
    pub directional_mode: DirectionalMode,
    pub levels: SpatialLevels,
}

impl Default for LateralSettings {
    fn default() -> Self {
        Self {
            lateral_offset: 1.0,
            directional_mode: DirectionalMode::default(),
            levels: SpatialLevels::default(),
        }
    }
}

/// Which probing strategy a source uses
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeModel {
    /// Bouncing rays fanned in a directional cone plus a full circle
    Cone(ConeSettings),
    /// Direct ray plus two laterally offset rays, discretized
    Lateral(LateralSettings),
}

impl Default for ProbeModel {
    fn default() -> Self {
        Self::Cone(ConeSettings::default())
    }
}

/// Per-source occlusion tuning
///
/// Degenerate values such as a non-positive `max_distance` or zero ray counts
/// are legal and simply disable the corresponding probing.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceProfile {
    /// Maximum probe distance; sources farther than this from the listener are not probed
    pub max_distance: f32,
    /// A probe path reaching within this radius of the listener counts as connecting
    pub hit_radius: f32,
    /// Cached results older than this are recomputed
    pub staleness_interval: Duration,
    /// Source or listener displacement (in world units) that invalidates a cached result
    pub movement_threshold: f32,
    /// How long a non-looping source stays tracked after it starts
    pub one_shot_window: Duration,
    pub model: ProbeModel,
}

impl Default for SourceProfile {
    fn default() -> Self {
        Self {
            max_distance: 30.0,
            hit_radius: 1.0,
            staleness_interval: Duration::from_millis(250),
            movement_threshold: 0.5,
            one_shot_window: Duration::from_millis(750),
            model: ProbeModel::default(),
        }
    }
}

impl SourceProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Profile using the cone-sampled model
    pub fn cone(settings: ConeSettings) -> Self {
        Self {
            model: ProbeModel::Cone(settings),
            ..Self::default()
        }
    }

    /// Profile using the three-ray lateral model
    pub fn lateral(settings: LateralSettings) -> Self {
        Self {
            model: ProbeModel::Lateral(settings),
            ..Self::default()
        }
    }

    pub fn max_distance(mut self, distance: f32) -> Self {
        self.max_distance = distance;
        self
    }

    pub fn hit_radius(mut self, radius: f32) -> Self {
        self.hit_radius = radius;
        self
    }

    pub fn staleness_interval(mut self, interval: Duration) -> Self {
        self.staleness_interval = interval;
        self
    }

    pub fn movement_threshold(mut self, threshold: f32) -> Self {
        self.movement_threshold = threshold;
        self
    }

    pub fn one_shot_window(mut self, window: Duration) -> Self {
        self.one_shot_window = window;
        self
    }

    pub fn model(mut self, model: ProbeModel) -> Self {
        self.model = model;
        self
    }

    /// Squared movement threshold, compared against squared displacement
    pub fn movement_threshold_squared(&self) -> f32 {
        self.movement_threshold * self.movement_threshold
    }

    /// Validates that values are usable.
    ///
    /// Zero/negative ray counts and non-positive `max_distance` pass: they mean
    /// "disabled", not "broken".
    pub fn validate(&self) -> Result<()> {
        let values = [
            ("max_distance", self.max_distance),
            ("hit_radius", self.hit_radius),
            ("movement_threshold", self.movement_threshold),
        ];
        for (name, value) in values {
            if value.is_nan() {
                return Err(OcclusionError::Configuration(format!("{name} is NaN")));
            }
        }

        if self.hit_radius < 0.0 {
            return Err(OcclusionError::Configuration(
                "hit_radius must not be negative".into(),
            ));
        }
        if self.movement_threshold < 0.0 {
            return Err(OcclusionError::Configuration(
                "movement_threshold must not be negative".into(),
            ));
        }

        match &self.model {
            ProbeModel::Cone(cone) => {
                if !cone.directional_cone_degrees.is_finite() {
                    return Err(OcclusionError::Configuration(
                        "directional_cone_degrees must be finite".into(),
                    ));
                }
            }
            ProbeModel::Lateral(lateral) => {
                if !lateral.lateral_offset.is_finite() {
                    return Err(OcclusionError::Configuration(
                        "lateral_offset must be finite".into(),
                    ));
                }
                for value in [lateral.levels.blocked_1, lateral.levels.blocked_2] {
                    if !(0.0..=1.0).contains(&value) {
                        return Err(OcclusionError::Configuration(
                            "spatial levels must be between 0.0 and 1.0".into(),
                        ));
                    }
                }
                if let DirectionalMode::Fractional { min_blocked_floor } =
                    lateral.directional_mode
                {
                    if !(0.0..=1.0).contains(&min_blocked_floor) {
                        return Err(OcclusionError::Configuration(
                            "min_blocked_floor must be between 0.0 and 1.0".into(),
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}
