//! Per-source memo of the last occlusion result.
//!
//! A cached result is served until one of the following happens:
//! - the caller forces a recompute
//! - the source profile's staleness interval has elapsed
//! - the source or the listener moved farther than the movement threshold
//!   (compared as squared distances)

use crate::config::SourceProfile;
use crate::math::{Pose2, Vec2};
use crate::probe::{OcclusionStrategy, ProbeContext, compute_occlusion};
use crate::registry::SourceId;
use crate::result::OcclusionResult;
use std::collections::HashMap;

/// Last computed result plus the positions it was computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheEntry {
    pub result: OcclusionResult,
    pub source_position: Vec2,
    pub listener_position: Option<Vec2>,
}

/// Everything needed to (re)compute one source's occlusion.
pub struct OcclusionRequest<'a> {
    pub strategy: &'a dyn OcclusionStrategy,
    pub profile: &'a SourceProfile,
    pub source: Pose2,
    pub listener: Option<Vec2>,
}

/// Result of a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheLookup {
    pub result: OcclusionResult,
    /// True if the strategy ran (or a short-circuit result was produced) for this lookup
    pub recomputed: bool,
}

#[derive(Debug, Default)]
pub struct OcclusionCache {
    entries: HashMap<SourceId, CacheEntry>,
}

impl OcclusionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the memorized result for `source_id`, recomputing it when forced,
    /// stale, or invalidated by movement.
    pub fn get(
        &mut self,
        source_id: SourceId,
        request: &OcclusionRequest<'_>,
        ctx: &ProbeContext<'_>,
        now: f64,
        force: bool,
    ) -> CacheLookup {
        if !force {
            if let Some(entry) = self.entries.get(&source_id) {
                if !Self::needs_recompute(entry, request, now) {
                    return CacheLookup {
                        result: entry.result,
                        recomputed: false,
                    };
                }
            }
        }

        let result = compute_occlusion(
            ctx,
            request.strategy,
            request.profile,
            request.source,
            request.listener,
            now,
        );
        log::trace!(
            "Recomputed occlusion for {} (forced: {}): directional {:.3}, spatial {:.3}, {:?}",
            source_id,
            force,
            result.directional,
            result.spatial,
            result.status
        );

        self.entries.insert(
            source_id,
            CacheEntry {
                result,
                source_position: request.source.position,
                listener_position: request.listener,
            },
        );

        CacheLookup {
            result,
            recomputed: true,
        }
    }

    fn needs_recompute(entry: &CacheEntry, request: &OcclusionRequest<'_>, now: f64) -> bool {
        now - entry.result.timestamp >= request.profile.staleness_interval.as_secs_f64()
            || Self::has_moved(entry, request.profile, request.source.position, request.listener)
    }

    fn has_moved(
        entry: &CacheEntry,
        profile: &SourceProfile,
        source: Vec2,
        listener: Option<Vec2>,
    ) -> bool {
        let threshold_squared = profile.movement_threshold_squared();
        if entry.source_position.distance_squared(source) > threshold_squared {
            return true;
        }

        match (entry.listener_position, listener) {
            (Some(before), Some(after)) => before.distance_squared(after) > threshold_squared,
            (None, None) => false,
            // Listener appeared or vanished.
            _ => true,
        }
    }

    /// Returns true if `source_id` has no entry, or its entry was computed
    /// from positions that moved past the profile's movement threshold.
    ///
    /// Staleness is not considered here; the scheduler tracks it per source.
    pub fn is_invalidated(
        &self,
        source_id: SourceId,
        profile: &SourceProfile,
        source: Vec2,
        listener: Option<Vec2>,
    ) -> bool {
        self.entries
            .get(&source_id)
            .is_none_or(|entry| Self::has_moved(entry, profile, source, listener))
    }

    pub fn peek(&self, source_id: SourceId) -> Option<&CacheEntry> {
        self.entries.get(&source_id)
    }

    pub fn remove(&mut self, source_id: SourceId) -> Option<CacheEntry> {
        self.entries.remove(&source_id)
    }

    /// Drops every entry, e.g. after the obstacle layout changed.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
