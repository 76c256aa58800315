//! Per-tick selection of the sources that recompute occlusion.
//!
//! Each tick recomputes one source in round-robin rotation, regardless of
//! staleness, plus every source whose own recompute interval has passed or
//! whose cached result was invalidated by source or listener movement. Work
//! per tick stays at one guaranteed slot plus the independently due sources
//! instead of the whole population.

use crate::cache::{OcclusionCache, OcclusionRequest};
use crate::events::OcclusionEvent;
use crate::math::Vec2;
use crate::probe::ProbeContext;
use crate::registry::{EmitterRegistry, SourceId};
use crate::scene::{CountingSurface, LayerMask, ObstacleSurface};
use crate::sink::OcclusionSink;
use crossbeam_channel::Sender;
use std::time::{Duration, Instant};

/// Sources selected for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickPlan {
    pub round_robin: Option<SourceId>,
    /// Sources to process in registration order, with whether the cache is bypassed
    pub scheduled: Vec<(SourceId, bool)>,
    /// One-shot sources whose tracking window closed since they were last seen
    pub expired: Vec<SourceId>,
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub now: f64,
    pub round_robin: Option<SourceId>,
    /// Sources whose occlusion was recomputed and applied to the sink
    pub recomputed: Vec<SourceId>,
    pub pruned: usize,
    pub expired: usize,
    pub ray_casts: usize,
    pub elapsed: Duration,
}

/// Borrowed collaborators for one tick.
pub struct TickContext<'a> {
    pub surface: &'a dyn ObstacleSurface,
    pub layer_mask: LayerMask,
    pub surface_nudge: f32,
    pub listener: Option<Vec2>,
    pub sink: &'a mut dyn OcclusionSink,
    pub events: &'a Sender<OcclusionEvent>,
}

#[derive(Debug, Clone, Default)]
pub struct EmitterScheduler {
    /// Registration sequence of the last round-robin pick
    last_sequence: Option<u64>,
}

impl EmitterScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects this tick's sources and advances the rotation.
    ///
    /// Sources that are neither picked nor due are located to check their
    /// cache entry against the movement threshold; no rays are cast here.
    pub fn plan(
        &mut self,
        now: f64,
        registry: &EmitterRegistry,
        cache: &OcclusionCache,
        listener: Option<Vec2>,
    ) -> TickPlan {
        let round_robin = registry.next_after(self.last_sequence);
        if let Some(id) = round_robin {
            self.last_sequence = registry.sequence_of(id);
        }

        let mut plan = TickPlan {
            round_robin,
            ..TickPlan::default()
        };

        for &id in registry.ids() {
            let Some(emitter) = registry.get(id) else {
                continue;
            };
            if !emitter.is_tracking(now) {
                if !emitter.window_reported {
                    plan.expired.push(id);
                }
                continue;
            }
            let forced = round_robin == Some(id);
            let scheduled = forced
                || emitter.is_occlusion_due(now)
                || emitter.locate().is_some_and(|pose| {
                    cache.is_invalidated(id, &emitter.profile, pose.position, listener)
                });
            if scheduled {
                plan.scheduled.push((id, forced));
            }
        }

        plan
    }

    /// Runs one scheduling pass.
    ///
    /// Sources whose locator no longer resolves are pruned when encountered.
    /// The sink receives one update per recompute; results served from the
    /// cache are not re-applied.
    pub fn tick(
        &mut self,
        now: f64,
        registry: &mut EmitterRegistry,
        cache: &mut OcclusionCache,
        mut ctx: TickContext<'_>,
    ) -> TickReport {
        let start = Instant::now();
        let plan = self.plan(now, registry, cache, ctx.listener);
        let counting = CountingSurface::new(ctx.surface);
        let probe_ctx = ProbeContext::new(&counting)
            .with_layer_mask(ctx.layer_mask)
            .with_surface_nudge(ctx.surface_nudge);

        let mut report = TickReport {
            now,
            round_robin: plan.round_robin,
            ..TickReport::default()
        };

        for id in plan.expired {
            if let Some(emitter) = registry.get_mut(id) {
                emitter.window_reported = true;
                report.expired += 1;
                log::debug!("Tracking window elapsed for {}", id);
                Self::emit(ctx.events, OcclusionEvent::TrackingWindowElapsed { source_id: id });
            }
        }

        for (id, forced) in plan.scheduled {
            let Some(emitter) = registry.get_mut(id) else {
                continue;
            };
            let Some(pose) = emitter.locate() else {
                registry.remove(id);
                cache.remove(id);
                report.pruned += 1;
                log::debug!("Pruned {}: source no longer resolvable", id);
                Self::emit(ctx.events, OcclusionEvent::SourcePruned { source_id: id });
                continue;
            };

            let request = OcclusionRequest {
                strategy: emitter.strategy.as_ref(),
                profile: &emitter.profile,
                source: pose,
                listener: ctx.listener,
            };
            let lookup = cache.get(id, &request, &probe_ctx, now, forced);
            emitter.last_computed = Some(lookup.result.timestamp);

            if lookup.recomputed {
                ctx.sink
                    .apply_occlusion(id, lookup.result.directional, lookup.result.spatial);
                report.recomputed.push(id);
            }
        }

        report.ray_casts = counting.casts();
        report.elapsed = start.elapsed();
        report
    }

    fn emit(events: &Sender<OcclusionEvent>, event: OcclusionEvent) {
        if let Err(err) = events.send(event) {
            log::warn!("Dropped occlusion event {:?}: receiver disconnected", err.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceProfile;
    use crate::math::Pose2;
    use crate::registry::{Emitter, LoopMode, SourceLocator};
    use crate::scene::{Obstacle, ObstacleScene};
    use crate::sink::RecordingSink;
    use crossbeam_channel::{Receiver, unbounded};
    use std::cell::Cell;
    use std::rc::Rc;

    struct Harness {
        registry: EmitterRegistry,
        cache: OcclusionCache,
        scheduler: EmitterScheduler,
        sink: RecordingSink,
        events: Sender<OcclusionEvent>,
        receiver: Receiver<OcclusionEvent>,
        scene: ObstacleScene,
        listener: Option<Vec2>,
    }

    impl Harness {
        fn new() -> Self {
            let (events, receiver) = unbounded();
            Self {
                registry: EmitterRegistry::new(),
                cache: OcclusionCache::new(),
                scheduler: EmitterScheduler::new(),
                sink: RecordingSink::new(),
                events,
                receiver,
                scene: ObstacleScene::new().with(Obstacle::segment(
                    Vec2::new(5.0, -3.0),
                    Vec2::new(5.0, 3.0),
                )),
                listener: Some(Vec2::new(10.0, 0.0)),
            }
        }

        fn add(&mut self, locator: Box<dyn SourceLocator>, loop_mode: LoopMode) -> SourceId {
            let profile = SourceProfile::default()
                .staleness_interval(Duration::from_secs(10))
                .one_shot_window(Duration::from_millis(750));
            self.registry
                .insert(Emitter::new(locator, profile, loop_mode, 0.0))
        }

        fn add_at(&mut self, position: Vec2) -> SourceId {
            self.add(
                Box::new(move || Some(Pose2::from_position(position))),
                LoopMode::Infinite,
            )
        }

        fn tick(&mut self, now: f64) -> TickReport {
            let ctx = TickContext {
                surface: &self.scene,
                layer_mask: LayerMask::ALL,
                surface_nudge: 1e-3,
                listener: self.listener,
                sink: &mut self.sink,
                events: &self.events,
            };
            self.scheduler
                .tick(now, &mut self.registry, &mut self.cache, ctx)
        }

        fn events(&self) -> Vec<OcclusionEvent> {
            self.receiver.try_iter().collect()
        }
    }

    /// Marks every source as computed at `now` so only the rotation schedules work.
    fn settle(harness: &mut Harness, now: f64) {
        for id in harness.registry.ids().to_vec() {
            if let Some(emitter) = harness.registry.get_mut(id) {
                emitter.last_computed = Some(now);
            }
        }
    }

    #[test]
    fn test_round_robin_covers_every_source() {
        let mut harness = Harness::new();
        let ids: Vec<_> = (0..4)
            .map(|i| harness.add_at(Vec2::new(0.0, i as f32)))
            .collect();

        // The first tick fills the cache for every source.
        let report = harness.tick(0.0);
        assert_eq!(report.recomputed, ids);

        let mut picks = Vec::new();
        for tick in 0..ids.len() {
            let report = harness.tick(0.1 + tick as f64 * 0.01);
            assert_eq!(report.recomputed.len(), 1);
            picks.push(report.round_robin.unwrap());
            assert_eq!(report.recomputed[0], report.round_robin.unwrap());
        }
        assert_eq!(picks, vec![ids[1], ids[2], ids[3], ids[0]]);
        assert_eq!(harness.sink.applied(), ids.len() * 2);

        // Rotation wraps around.
        assert_eq!(harness.tick(0.2).round_robin, Some(ids[1]));
    }

    #[test]
    fn test_due_sources_join_the_round_robin_pick() {
        let mut harness = Harness::new();
        let a = harness.add_at(Vec2::ZERO);
        let b = harness.add_at(Vec2::new(0.0, 1.0));
        let c = harness.add_at(Vec2::new(0.0, 2.0));

        // Fresh sources have never been computed, so all are due.
        let report = harness.tick(0.0);
        assert_eq!(report.round_robin, Some(a));
        assert_eq!(report.recomputed, vec![a, b, c]);

        // Only c's interval has run out; the rotation moves on to b.
        settle(&mut harness, 5.0);
        harness.registry.get_mut(c).unwrap().last_computed = Some(0.0);
        let report = harness.tick(10.5);
        assert_eq!(report.round_robin, Some(b));
        assert_eq!(report.recomputed, vec![b, c]);
    }

    #[test]
    fn test_processing_follows_registration_order() {
        let mut harness = Harness::new();
        let ids: Vec<_> = (0..3)
            .map(|i| harness.add_at(Vec2::new(0.0, i as f32)))
            .collect();
        harness.registry.remove(ids[0]);
        let late = harness.add_at(Vec2::new(1.0, 0.0));
        assert_eq!(late.index(), ids[0].index());

        let report = harness.tick(0.0);
        assert_eq!(report.recomputed, vec![ids[1], ids[2], late]);
    }

    #[test]
    fn test_invalid_sources_are_pruned_lazily() {
        let mut harness = Harness::new();
        let pose = Rc::new(Cell::new(Pose2::from_position(Vec2::ZERO)));
        let weak = harness.add(Box::new(Rc::downgrade(&pose)), LoopMode::Infinite);
        let other = harness.add_at(Vec2::new(0.0, 1.0));

        harness.tick(0.0);
        assert!(harness.cache.peek(weak).is_some());
        settle(&mut harness, 0.0);
        drop(pose);

        // Not encountered this tick: the rotation picks `other`.
        let report = harness.tick(0.1);
        assert_eq!(report.round_robin, Some(other));
        assert_eq!(report.pruned, 0);
        assert!(harness.registry.contains(weak));

        let report = harness.tick(0.2);
        assert_eq!(report.pruned, 1);
        assert!(!harness.registry.contains(weak));
        assert!(harness.cache.peek(weak).is_none());
        assert!(
            harness
                .events()
                .contains(&OcclusionEvent::SourcePruned { source_id: weak })
        );
    }

    #[test]
    fn test_expired_one_shot_is_a_no_op() {
        let mut harness = Harness::new();
        let one_shot = harness.add(
            Box::new(|| Some(Pose2::from_position(Vec2::ZERO))),
            LoopMode::Once,
        );

        let report = harness.tick(0.0);
        assert_eq!(report.recomputed, vec![one_shot]);
        let casts_while_tracking = report.ray_casts;
        assert!(casts_while_tracking > 0);

        let report = harness.tick(0.8);
        assert_eq!(report.round_robin, Some(one_shot));
        assert!(report.recomputed.is_empty());
        assert_eq!(report.expired, 1);
        assert_eq!(report.ray_casts, 0);

        // Window event is reported once.
        let report = harness.tick(0.9);
        assert_eq!(report.expired, 0);
        assert_eq!(
            harness.events(),
            vec![OcclusionEvent::TrackingWindowElapsed {
                source_id: one_shot
            }]
        );
        assert_eq!(harness.sink.applied(), 1);
    }

    #[test]
    fn test_sink_receives_computed_values() {
        let mut harness = Harness::new();
        let blocked = harness.add_at(Vec2::ZERO);
        harness.tick(0.0);

        let (directional, spatial) = harness.sink.latest(blocked).unwrap();
        assert!(directional > 0.0);
        assert!((0.0..=1.0).contains(&spatial));
        assert_eq!(
            harness.cache.peek(blocked).unwrap().result.directional,
            directional
        );
    }

    #[test]
    fn test_moved_source_is_recomputed_before_its_interval() {
        let mut harness = Harness::new();
        let pose = Rc::new(Cell::new(Pose2::from_position(Vec2::ZERO)));
        let moving = harness.add(Box::new(Rc::downgrade(&pose)), LoopMode::Infinite);
        let still = harness.add_at(Vec2::new(0.0, 1.0));

        harness.tick(0.0);
        assert_eq!(harness.cache.peek(moving).unwrap().result.distance, 10.0);

        pose.set(Pose2::from_position(Vec2::new(9.0, 0.0)));
        let report = harness.tick(0.1);
        assert_eq!(report.round_robin, Some(still));
        assert_eq!(report.recomputed, vec![moving, still]);
        assert_eq!(harness.cache.peek(moving).unwrap().result.distance, 1.0);

        let report = harness.tick(0.2);
        assert_eq!(report.recomputed, vec![moving]);

        // Movement within the threshold leaves the cached result alone.
        pose.set(Pose2::from_position(Vec2::new(9.2, 0.0)));
        let report = harness.tick(0.3);
        assert_eq!(report.round_robin, Some(still));
        assert_eq!(report.recomputed, vec![still]);
        assert_eq!(harness.cache.peek(moving).unwrap().result.distance, 1.0);
    }

    #[test]
    fn test_listener_movement_recomputes_every_tracked_source() {
        let mut harness = Harness::new();
        let a = harness.add_at(Vec2::ZERO);
        let b = harness.add_at(Vec2::new(0.0, 1.0));
        let c = harness.add_at(Vec2::new(0.0, 2.0));
        harness.tick(0.0);

        harness.listener = Some(Vec2::new(12.0, 0.0));
        let report = harness.tick(0.1);
        assert_eq!(report.recomputed, vec![a, b, c]);
        assert_eq!(harness.sink.applied(), 6);
    }

    #[test]
    fn test_closed_event_receiver_does_not_stop_the_tick() {
        let mut harness = Harness::new();
        let one_shot = harness.add(
            Box::new(|| Some(Pose2::from_position(Vec2::ZERO))),
            LoopMode::Once,
        );
        let (events, receiver) = unbounded();
        harness.events = events;
        drop(receiver);

        harness.tick(0.0);
        let report = harness.tick(0.8);
        assert_eq!(report.expired, 1);
        assert!(harness.registry.get(one_shot).unwrap().window_reported);
    }

    #[test]
    fn test_empty_registry_tick() {
        let mut harness = Harness::new();
        let report = harness.tick(1.0);
        assert_eq!(report.round_robin, None);
        assert!(report.recomputed.is_empty());
        assert_eq!(report.ray_casts, 0);
    }

    #[test]
    fn test_without_listener_sources_read_clear() {
        let mut harness = Harness::new();
        harness.listener = None;
        let id = harness.add_at(Vec2::ZERO);
        let report = harness.tick(0.0);
        assert_eq!(report.recomputed, vec![id]);
        assert_eq!(report.ray_casts, 0);
        assert_eq!(harness.sink.latest(id), Some((0.0, 0.0)));
    }
}
