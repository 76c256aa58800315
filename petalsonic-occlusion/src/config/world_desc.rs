use crate::config::SourceProfile;
use crate::scene::LayerMask;

/// Configuration descriptor for an occlusion engine
#[derive(Debug, Clone)]
pub struct OcclusionWorldDesc {
    /// Maximum number of concurrently registered sources
    pub max_sources: usize,
    /// Obstacle layers probe rays interact with
    pub layer_mask: LayerMask,
    /// Distance a bounced ray is pushed off the surface before continuing
    pub surface_nudge: f32,
    /// Profile used by [`OcclusionEngine::register_default`](crate::OcclusionEngine::register_default)
    pub default_profile: SourceProfile,
}

impl Default for OcclusionWorldDesc {
    fn default() -> Self {
        Self {
            max_sources: 64,
            layer_mask: LayerMask::ALL,
            surface_nudge: 1e-3,
            default_profile: SourceProfile::default(),
        }
    }
}
