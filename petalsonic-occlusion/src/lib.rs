//! # PetalSonic Occlusion
//!
//! Tick-driven acoustic occlusion for 2D scenes. For every registered sound
//! source the engine estimates two perceptual values from ray probes against
//! an obstacle surface:
//!
//! - **directional** occlusion: how blocked the line toward the listener is
//! - **spatial** occlusion: how blocked the source's surroundings are
//!
//! Both are in `[0, 1]` (0 = clear, 1 = fully blocked) and are pushed to an
//! [`OcclusionSink`], typically the playback layer driving filters and gains.
//!
//! ## Quick Start
//!
//! ```no_run
//! use petalsonic_occlusion::*;
//! use petalsonic_occlusion::math::{Pose2, Vec2};
//! use petalsonic_occlusion::scene::{Obstacle, ObstacleScene};
//!
//! // A wall between the source and the listener
//! let scene = ObstacleScene::new().with(Obstacle::segment(
//!     Vec2::new(5.0, -3.0),
//!     Vec2::new(5.0, 3.0),
//! ));
//!
//! // Engine with a fixed listener, forwarding updates over a channel
//! let (sink, updates) = ChannelSink::unbounded();
//! let mut engine = OcclusionEngine::new(
//!     OcclusionWorldDesc::default(),
//!     FixedListener(Vec2::new(10.0, 0.0)),
//!     sink,
//! )?;
//!
//! // Register a looping source
//! let source_id = engine.register_source(
//!     || Some(Pose2::from_position(Vec2::ZERO)),
//!     SourceProfile::default().max_distance(25.0),
//!     LoopMode::Infinite,
//!     0.0,
//! )?;
//!
//! // Tick once per simulation frame
//! let report = engine.tick(0.0, &scene);
//! println!("{} sources recomputed", report.recomputed.len());
//!
//! for update in updates.try_iter() {
//!     println!("{}: {:.2} / {:.2}", update.source_id, update.directional, update.spatial);
//! }
//! # let _ = source_id;
//! # Ok::<(), OcclusionError>(())
//! ```
//!
//! ## Key Components
//!
//! - **[`OcclusionEngine`]**: Owns sources, cache and scheduler; the main API
//! - **[`SourceProfile`]**: Per-source tunables and choice of probing model
//! - **[`ObstacleSurface`](scene::ObstacleSurface)**: Ray query trait implemented by your collision world
//! - **[`OcclusionResult`]**: Directional/spatial pair plus distance and status
//! - **[`OcclusionEvent`]**: Registration, pruning and listener notifications
//!
//! ## Architecture
//!
//! Each tick flows through four layers:
//!
//! 1. **Scheduler**: Picks one source in round-robin rotation plus every source that is due or has moved
//! 2. **Cache**: Serves the memorized result unless stale, forced, or invalidated by movement
//! 3. **Strategy**: Cone sampling of bouncing rays, or the three-ray lateral probe
//! 4. **Geometry probe**: Casts rays against the surface, reflecting off obstacles
//!
//! Everything runs synchronously on the calling thread. The obstacle surface
//! is only read.
//!
//! ## Features
//!
//! - Specular ray bounces with a per-source bounce limit
//! - Range cutoff that skips ray casting entirely
//! - Playback-window gating for one-shot sounds
//! - Weak source and listener handles, pruned or re-resolved lazily
//! - Per-tick diagnostics via [`TickReport`]

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod listener;
pub mod math;
pub mod probe;
pub mod registry;
pub mod result;
pub mod scene;
pub mod scheduler;
pub mod sink;

pub use cache::{CacheEntry, CacheLookup, OcclusionCache, OcclusionRequest};
pub use config::{
    ConeSettings, DirectionalMode, LateralSettings, OcclusionWorldDesc, ProbeModel,
    SourceProfile, SpatialLevels,
};
pub use engine::OcclusionEngine;
pub use error::OcclusionError;
pub use events::OcclusionEvent;
pub use listener::{Anchor, FixedListener, ListenerResolver, ListenerSlot, NoListener};
pub use probe::OcclusionStrategy;
pub use registry::{EmitterRegistry, LoopMode, SourceId, SourceLocator};
pub use result::{OcclusionResult, OcclusionStatus};
pub use scheduler::{EmitterScheduler, TickReport};
pub use sink::{ChannelSink, NullSink, OcclusionSink, OcclusionUpdate, RecordingSink};
