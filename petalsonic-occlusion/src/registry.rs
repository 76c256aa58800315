//! Arena of registered occlusion sources.
//!
//! The registry owns per-source bookkeeping (profile, strategy, playback
//! window, last compute time) and hands out generation-checked [`SourceId`]s
//! so a stale handle never aliases a newer source that reused its slot.

use crate::config::SourceProfile;
use crate::math::{Pose2, Vec2};
use crate::probe::{OcclusionStrategy, build_strategy};
use std::cell::Cell;
use std::rc::Weak;

/// Lightweight, type-safe handle for a registered source.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceId {
    index: u32,
    generation: u32,
}

impl SourceId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Stable arena slot index
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourceId({}v{})", self.index, self.generation)
    }
}

/// Resolves the current pose of a sound source.
///
/// The engine only keeps this weak view of the source; returning `None` means
/// the source is gone and the engine prunes it lazily.
pub trait SourceLocator {
    fn locate(&self) -> Option<Pose2>;
}

impl<F> SourceLocator for F
where
    F: Fn() -> Option<Pose2>,
{
    fn locate(&self) -> Option<Pose2> {
        self()
    }
}

impl SourceLocator for Weak<Cell<Pose2>> {
    fn locate(&self) -> Option<Pose2> {
        self.upgrade().map(|pose| pose.get())
    }
}

impl SourceLocator for Weak<Cell<Vec2>> {
    fn locate(&self) -> Option<Pose2> {
        self.upgrade().map(|position| Pose2::from_position(position.get()))
    }
}

/// Loop mode of the sound behind a source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoopMode {
    /// Play once; occlusion is tracked only during the profile's one-shot window
    #[default]
    Once,
    /// Loop until unregistered; tracked for as long as it is registered
    Infinite,
}

/// Per-source bookkeeping owned by the registry.
pub struct Emitter {
    pub(crate) locator: Box<dyn SourceLocator>,
    pub(crate) profile: SourceProfile,
    pub(crate) strategy: Box<dyn OcclusionStrategy>,
    pub(crate) loop_mode: LoopMode,
    pub(crate) started_at: f64,
    pub(crate) last_computed: Option<f64>,
    pub(crate) window_reported: bool,
    sequence: u64,
}

impl Emitter {
    pub fn new(
        locator: Box<dyn SourceLocator>,
        profile: SourceProfile,
        loop_mode: LoopMode,
        started_at: f64,
    ) -> Self {
        let strategy = build_strategy(&profile);
        Self {
            locator,
            profile,
            strategy,
            loop_mode,
            started_at,
            last_computed: None,
            window_reported: false,
            sequence: 0,
        }
    }

    pub fn profile(&self) -> &SourceProfile {
        &self.profile
    }

    /// Replaces the profile and rebuilds the strategy it selects
    pub fn set_profile(&mut self, profile: SourceProfile) {
        self.strategy = build_strategy(&profile);
        self.profile = profile;
        self.last_computed = None;
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn started_at(&self) -> f64 {
        self.started_at
    }

    pub fn last_computed(&self) -> Option<f64> {
        self.last_computed
    }

    /// Re-arms the tracking window, e.g. when a one-shot sound is retriggered
    pub fn restart(&mut self, loop_mode: LoopMode, now: f64) {
        self.loop_mode = loop_mode;
        self.started_at = now;
        self.last_computed = None;
        self.window_reported = false;
    }

    pub fn locate(&self) -> Option<Pose2> {
        self.locator.locate()
    }

    /// Returns true while occlusion is still worth tracking.
    ///
    /// Looping sources are always tracked; one-shots only until
    /// `started_at + one_shot_window`.
    pub fn is_tracking(&self, now: f64) -> bool {
        match self.loop_mode {
            LoopMode::Infinite => true,
            LoopMode::Once => now <= self.started_at + self.profile.one_shot_window.as_secs_f64(),
        }
    }

    /// Returns true if the source is tracked and its own recompute interval has passed.
    pub fn is_occlusion_due(&self, now: f64) -> bool {
        if !self.is_tracking(now) {
            return false;
        }
        self.last_computed.is_none_or(|last| {
            now - last >= self.profile.staleness_interval.as_secs_f64()
        })
    }
}

struct Slot {
    generation: u32,
    emitter: Option<Emitter>,
}

/// Arena of emitters with stable slot indices, iterated in registration order.
#[derive(Default)]
pub struct EmitterRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Live ids sorted by registration sequence
    order: Vec<SourceId>,
    next_sequence: u64,
}

impl EmitterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mut emitter: Emitter) -> SourceId {
        emitter.sequence = self.next_sequence;
        self.next_sequence += 1;

        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.emitter = Some(emitter);
                SourceId::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    emitter: Some(emitter),
                });
                SourceId::new(index, 0)
            }
        };

        self.order.push(id);
        id
    }

    pub fn remove(&mut self, id: SourceId) -> Option<Emitter> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let emitter = slot.emitter.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.order.retain(|other| *other != id);
        Some(emitter)
    }

    pub fn get(&self, id: SourceId) -> Option<&Emitter> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.emitter.as_ref())
    }

    pub fn get_mut(&mut self, id: SourceId) -> Option<&mut Emitter> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.emitter.as_mut())
    }

    pub fn contains(&self, id: SourceId) -> bool {
        self.get(id).is_some()
    }

    /// Live ids in registration order
    pub fn ids(&self) -> &[SourceId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn sequence_of(&self, id: SourceId) -> Option<u64> {
        self.get(id).map(|emitter| emitter.sequence)
    }

    /// First live id registered after `sequence`, wrapping to the oldest one.
    pub(crate) fn next_after(&self, sequence: Option<u64>) -> Option<SourceId> {
        let start = match sequence {
            Some(sequence) => self
                .order
                .partition_point(|id| self.sequence_of(*id).is_some_and(|s| s <= sequence)),
            None => 0,
        };
        self.order
            .get(start)
            .or_else(|| self.order.first())
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use std::time::Duration;

    fn emitter(loop_mode: LoopMode, started_at: f64) -> Emitter {
        Emitter::new(
            Box::new(|| Some(Pose2::from_position(Vec2::ZERO))),
            SourceProfile::default()
                .staleness_interval(Duration::from_millis(200))
                .one_shot_window(Duration::from_millis(750)),
            loop_mode,
            started_at,
        )
    }

    #[test]
    fn test_insert_get_remove() {
        let mut registry = EmitterRegistry::new();
        let a = registry.insert(emitter(LoopMode::Infinite, 0.0));
        let b = registry.insert(emitter(LoopMode::Once, 0.0));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(a));
        assert_eq!(registry.ids(), &[a, b]);

        assert!(registry.remove(a).is_some());
        assert!(!registry.contains(a));
        assert!(registry.remove(a).is_none());
        assert_eq!(registry.ids(), &[b]);
    }

    #[test]
    fn test_reused_slot_rejects_stale_id() {
        let mut registry = EmitterRegistry::new();
        let a = registry.insert(emitter(LoopMode::Infinite, 0.0));
        registry.remove(a);
        let b = registry.insert(emitter(LoopMode::Infinite, 0.0));

        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert!(registry.get(a).is_none());
        assert!(registry.get(b).is_some());
    }

    #[test]
    fn test_registration_order_survives_slot_reuse() {
        let mut registry = EmitterRegistry::new();
        let a = registry.insert(emitter(LoopMode::Infinite, 0.0));
        let b = registry.insert(emitter(LoopMode::Infinite, 0.0));
        registry.remove(a);
        let c = registry.insert(emitter(LoopMode::Infinite, 0.0));
        // c reuses a's slot but was registered last.
        assert_eq!(c.index(), a.index());
        assert_eq!(registry.ids(), &[b, c]);
    }

    #[test]
    fn test_next_after_wraps() {
        let mut registry = EmitterRegistry::new();
        assert_eq!(registry.next_after(None), None);

        let a = registry.insert(emitter(LoopMode::Infinite, 0.0));
        let b = registry.insert(emitter(LoopMode::Infinite, 0.0));
        let c = registry.insert(emitter(LoopMode::Infinite, 0.0));

        assert_eq!(registry.next_after(None), Some(a));
        assert_eq!(registry.next_after(registry.sequence_of(a)), Some(b));
        assert_eq!(registry.next_after(registry.sequence_of(c)), Some(a));

        // Removing the last pick still continues with the following source.
        let b_sequence = registry.sequence_of(b);
        registry.remove(b);
        assert_eq!(registry.next_after(b_sequence), Some(c));
    }

    #[test]
    fn test_one_shot_window() {
        let mut one_shot = emitter(LoopMode::Once, 0.0);
        one_shot.last_computed = Some(0.1);

        // Past its own interval and still inside the window.
        assert!(one_shot.is_occlusion_due(0.5));
        // Window closed at 0.75.
        assert!(!one_shot.is_occlusion_due(0.8));
        assert!(!one_shot.is_tracking(0.8));

        one_shot.restart(LoopMode::Once, 1.0);
        assert!(one_shot.is_occlusion_due(1.2));
    }

    #[test]
    fn test_default_loop_mode_is_one_shot() {
        assert_eq!(LoopMode::default(), LoopMode::Once);
    }

    #[test]
    fn test_due_respects_interval() {
        let mut looping = emitter(LoopMode::Infinite, 0.0);
        assert!(looping.is_occlusion_due(0.0));
        looping.last_computed = Some(1.0);
        assert!(!looping.is_occlusion_due(1.1));
        assert!(looping.is_occlusion_due(1.2));
        assert!(looping.is_tracking(1000.0));
    }

    #[test]
    fn test_weak_locators() {
        let pose = Rc::new(Cell::new(Pose2::new(Vec2::new(1.0, 2.0), Vec2::Y)));
        let locator: Box<dyn SourceLocator> = Box::new(Rc::downgrade(&pose));
        assert_eq!(locator.locate().map(|p| p.position), Some(Vec2::new(1.0, 2.0)));
        drop(pose);
        assert!(locator.locate().is_none());

        let position = Rc::new(Cell::new(Vec2::new(3.0, 4.0)));
        let locator: Box<dyn SourceLocator> = Box::new(Rc::downgrade(&position));
        assert_eq!(
            locator.locate(),
            Some(Pose2::from_position(Vec2::new(3.0, 4.0)))
        );
    }
}
