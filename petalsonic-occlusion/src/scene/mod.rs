//! Obstacle geometry queried by the occlusion probes.
//!
//! # Overview
//!
//! 1. **ObstacleSurface** - Trait answering "closest hit along this ray" queries
//! 2. **LayerMask** - Restricts which obstacles a probe interacts with
//! 3. **ObstacleScene** - Reference surface made of segments, boxes and circles
//!
//! # Example
//!
//! ```rust,ignore
//! use petalsonic_occlusion::scene::{ObstacleSurface, RayHit, LayerMask};
//! use petalsonic_occlusion::math::Vec2;
//!
//! struct MyPhysicsSurface {
//!     // Your collision world...
//! }
//!
//! impl ObstacleSurface for MyPhysicsSurface {
//!     fn cast_ray(&self, origin: Vec2, direction: Vec2, max_distance: f32, mask: LayerMask)
//!         -> Option<RayHit> {
//!         // Forward to your physics engine's raycast
//!         None
//!     }
//! }
//!
//! engine.tick(now, &MyPhysicsSurface { /* ... */ });
//! ```

pub mod obstacles;
pub mod surface;

pub use obstacles::{Obstacle, ObstacleScene, ObstacleShape};
pub use surface::{CountingSurface, LayerMask, ObstacleSurface, RayHit};
