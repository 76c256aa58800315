use crate::cache::{OcclusionCache, OcclusionRequest};
use crate::config::{OcclusionWorldDesc, SourceProfile};
use crate::error::{OcclusionError, Result};
use crate::events::OcclusionEvent;
use crate::listener::{ListenerResolver, ListenerSlot};
use crate::math::Vec2;
use crate::probe::ProbeContext;
use crate::registry::{Emitter, EmitterRegistry, LoopMode, SourceId, SourceLocator};
use crate::result::OcclusionResult;
use crate::scene::ObstacleSurface;
use crate::scheduler::{EmitterScheduler, TickContext, TickReport};
use crate::sink::OcclusionSink;
use crossbeam_channel::{Receiver, Sender, unbounded};

/// Main entry point: owns the registered sources, their cached results and
/// the scheduler that decides what to recompute each tick.
///
/// The engine is single-threaded and tick-driven. The caller passes the
/// obstacle surface on every [`tick`](Self::tick) and [`query`](Self::query);
/// the surface is only read. Recomputed values are pushed to the sink `S`.
pub struct OcclusionEngine<S: OcclusionSink> {
    desc: OcclusionWorldDesc,
    registry: EmitterRegistry,
    cache: OcclusionCache,
    scheduler: EmitterScheduler,
    listener: ListenerSlot,
    listener_present: bool,
    sink: S,
    event_sender: Sender<OcclusionEvent>,
    event_receiver: Receiver<OcclusionEvent>,
}

impl<S: OcclusionSink> OcclusionEngine<S> {
    pub fn new(
        desc: OcclusionWorldDesc,
        resolver: impl ListenerResolver + 'static,
        sink: S,
    ) -> Result<Self> {
        desc.default_profile.validate()?;
        let (event_sender, event_receiver) = unbounded();
        log::info!(
            "Occlusion engine created (max sources: {}, layers: {:#x})",
            desc.max_sources,
            desc.layer_mask.0
        );
        Ok(Self {
            desc,
            registry: EmitterRegistry::new(),
            cache: OcclusionCache::new(),
            scheduler: EmitterScheduler::new(),
            listener: ListenerSlot::new(Box::new(resolver)),
            listener_present: false,
            sink,
            event_sender,
            event_receiver,
        })
    }

    pub fn desc(&self) -> &OcclusionWorldDesc {
        &self.desc
    }

    /// Registers a source and starts its tracking window at `now`.
    ///
    /// # Errors
    ///
    /// Fails if the profile is malformed or `max_sources` is already reached.
    pub fn register_source(
        &mut self,
        locator: impl SourceLocator + 'static,
        profile: SourceProfile,
        loop_mode: LoopMode,
        now: f64,
    ) -> Result<SourceId> {
        profile.validate()?;
        if self.registry.len() >= self.desc.max_sources {
            return Err(OcclusionError::CapacityExceeded {
                max_sources: self.desc.max_sources,
            });
        }

        let id = self
            .registry
            .insert(Emitter::new(Box::new(locator), profile, loop_mode, now));
        log::debug!("Registered {} ({:?})", id, loop_mode);
        self.emit(OcclusionEvent::SourceRegistered { source_id: id });
        Ok(id)
    }

    /// Registers a source with the descriptor's default profile.
    pub fn register_default(
        &mut self,
        locator: impl SourceLocator + 'static,
        loop_mode: LoopMode,
        now: f64,
    ) -> Result<SourceId> {
        let profile = self.desc.default_profile.clone();
        self.register_source(locator, profile, loop_mode, now)
    }

    /// Removes a source and its cached result. Returns false for unknown ids.
    pub fn unregister_source(&mut self, id: SourceId) -> bool {
        if self.registry.remove(id).is_none() {
            return false;
        }
        self.cache.remove(id);
        log::debug!("Unregistered {}", id);
        self.emit(OcclusionEvent::SourceUnregistered { source_id: id });
        true
    }

    /// Swaps the profile (and with it the probing model) of a source.
    ///
    /// The cached result is dropped so the next tick recomputes with the new settings.
    pub fn set_source_profile(&mut self, id: SourceId, profile: SourceProfile) -> Result<()> {
        profile.validate()?;
        let emitter = self
            .registry
            .get_mut(id)
            .ok_or(OcclusionError::UnknownSource(id))?;
        emitter.set_profile(profile);
        self.cache.remove(id);
        Ok(())
    }

    /// Restarts the playback window, e.g. when a one-shot sound is triggered again.
    ///
    /// The cached result is dropped so the restarted sound is recomputed on
    /// the next tick even inside its staleness interval.
    pub fn restart_playback(&mut self, id: SourceId, loop_mode: LoopMode, now: f64) -> Result<()> {
        let emitter = self
            .registry
            .get_mut(id)
            .ok_or(OcclusionError::UnknownSource(id))?;
        emitter.restart(loop_mode, now);
        self.cache.remove(id);
        log::debug!("Restarted playback window for {} at {:.3}s", id, now);
        Ok(())
    }

    /// Runs one scheduling pass against `surface`.
    pub fn tick(&mut self, now: f64, surface: &dyn ObstacleSurface) -> TickReport {
        let listener = self.refresh_listener();
        let ctx = TickContext {
            surface,
            layer_mask: self.desc.layer_mask,
            surface_nudge: self.desc.surface_nudge,
            listener,
            sink: &mut self.sink,
            events: &self.event_sender,
        };
        let report = self
            .scheduler
            .tick(now, &mut self.registry, &mut self.cache, ctx);
        log::trace!(
            "Tick {:.3}s: {} recomputed, {} pruned, {} expired, {} rays in {:?}",
            now,
            report.recomputed.len(),
            report.pruned,
            report.expired,
            report.ray_casts,
            report.elapsed
        );
        report
    }

    /// Returns the occlusion of one source right now, outside the tick schedule.
    ///
    /// A cached result is reused unless `force` is set or it is stale. Returns
    /// `None` for unknown ids and for sources that no longer resolve (these
    /// are pruned).
    pub fn query(
        &mut self,
        id: SourceId,
        now: f64,
        surface: &dyn ObstacleSurface,
        force: bool,
    ) -> Option<OcclusionResult> {
        let listener = self.refresh_listener();
        let emitter = self.registry.get_mut(id)?;
        let Some(pose) = emitter.locate() else {
            self.registry.remove(id);
            self.cache.remove(id);
            log::debug!("Pruned {}: source no longer resolvable", id);
            self.emit(OcclusionEvent::SourcePruned { source_id: id });
            return None;
        };

        let ctx = ProbeContext::new(surface)
            .with_layer_mask(self.desc.layer_mask)
            .with_surface_nudge(self.desc.surface_nudge);
        let request = OcclusionRequest {
            strategy: emitter.strategy.as_ref(),
            profile: &emitter.profile,
            source: pose,
            listener,
        };
        let lookup = self.cache.get(id, &request, &ctx, now, force);
        emitter.last_computed = Some(lookup.result.timestamp);

        if lookup.recomputed {
            self.sink
                .apply_occlusion(id, lookup.result.directional, lookup.result.spatial);
        }
        Some(lookup.result)
    }

    /// Last result computed for `id`, without probing.
    pub fn cached_result(&self, id: SourceId) -> Option<OcclusionResult> {
        self.cache.peek(id).map(|entry| entry.result)
    }

    pub fn is_occlusion_due(&self, id: SourceId, now: f64) -> bool {
        self.registry
            .get(id)
            .is_some_and(|emitter| emitter.is_occlusion_due(now))
    }

    /// Drops every cached result, e.g. after the obstacle layout changed.
    pub fn invalidate_all(&mut self) {
        self.cache.invalidate_all();
        log::debug!("Invalidated all cached occlusion results");
    }

    /// Current listener position, re-resolving the anchor if needed.
    pub fn listener_position(&mut self) -> Option<Vec2> {
        self.refresh_listener()
    }

    /// Drains the events emitted since the last call.
    pub fn poll_events(&self) -> Vec<OcclusionEvent> {
        self.event_receiver.try_iter().collect()
    }

    /// Registered ids in registration order
    pub fn source_ids(&self) -> &[SourceId] {
        self.registry.ids()
    }

    pub fn source_count(&self) -> usize {
        self.registry.len()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn refresh_listener(&mut self) -> Option<Vec2> {
        let position = self.listener.position();
        match (self.listener_present, position) {
            (false, Some(position)) => {
                log::debug!("Listener resolved at {:?}", position);
                self.emit(OcclusionEvent::ListenerResolved { position });
            }
            (true, None) => {
                log::debug!("Listener lost");
                self.emit(OcclusionEvent::ListenerLost);
            }
            _ => {}
        }
        self.listener_present = position.is_some();
        position
    }

    fn emit(&self, event: OcclusionEvent) {
        // The receiver lives in `self`, so sending cannot fail.
        let _ = self.event_sender.send(event);
    }
}
