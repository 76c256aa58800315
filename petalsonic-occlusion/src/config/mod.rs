pub mod source_profile;
pub mod world_desc;

pub use source_profile::{
    ConeSettings, DirectionalMode, LateralSettings, ProbeModel, SourceProfile, SpatialLevels,
};
pub use world_desc::OcclusionWorldDesc;
