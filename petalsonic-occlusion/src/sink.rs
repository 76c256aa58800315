//! Destinations for recomputed occlusion values.
//!
//! The engine calls [`OcclusionSink::apply_occlusion`] exactly once per
//! recompute. Cached results are never re-applied.

use crate::error::{OcclusionError, Result};
use crate::registry::SourceId;
use crossbeam_channel::{Receiver, Sender, TrySendError, unbounded};
use std::collections::HashMap;

pub trait OcclusionSink {
    fn apply_occlusion(&mut self, source_id: SourceId, directional: f32, spatial: f32);
}

impl<F> OcclusionSink for F
where
    F: FnMut(SourceId, f32, f32),
{
    fn apply_occlusion(&mut self, source_id: SourceId, directional: f32, spatial: f32) {
        self(source_id, directional, spatial)
    }
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl OcclusionSink for NullSink {
    fn apply_occlusion(&mut self, _: SourceId, _: f32, _: f32) {}
}

/// One recomputed value pair, as sent by [`ChannelSink`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcclusionUpdate {
    pub source_id: SourceId,
    pub directional: f32,
    pub spatial: f32,
}

/// Forwards updates to another thread (typically the audio thread) over a
/// crossbeam channel.
pub struct ChannelSink {
    sender: Sender<OcclusionUpdate>,
}

impl ChannelSink {
    pub fn new(sender: Sender<OcclusionUpdate>) -> Self {
        Self { sender }
    }

    /// Creates a sink with an unbounded channel and returns its receiving end.
    pub fn unbounded() -> (Self, Receiver<OcclusionUpdate>) {
        let (sender, receiver) = unbounded();
        (Self::new(sender), receiver)
    }

    /// Sends one update without blocking.
    pub fn send(&self, update: OcclusionUpdate) -> Result<()> {
        self.sender.try_send(update).map_err(|err| match err {
            TrySendError::Full(_) => OcclusionError::Channel("channel full".to_string()),
            TrySendError::Disconnected(_) => {
                OcclusionError::Channel("receiver disconnected".to_string())
            }
        })
    }
}

impl OcclusionSink for ChannelSink {
    fn apply_occlusion(&mut self, source_id: SourceId, directional: f32, spatial: f32) {
        let update = OcclusionUpdate {
            source_id,
            directional,
            spatial,
        };
        if let Err(err) = self.send(update) {
            log::warn!("Dropped occlusion update for {}: {}", source_id, err);
        }
    }
}

/// Keeps the latest values per source plus a count of applied updates.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    latest: HashMap<SourceId, (f32, f32)>,
    applied: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest `(directional, spatial)` pair applied for `source_id`
    pub fn latest(&self, source_id: SourceId) -> Option<(f32, f32)> {
        self.latest.get(&source_id).copied()
    }

    pub fn applied(&self) -> usize {
        self.applied
    }

    pub fn clear(&mut self) {
        self.latest.clear();
        self.applied = 0;
    }
}

impl OcclusionSink for RecordingSink {
    fn apply_occlusion(&mut self, source_id: SourceId, directional: f32, spatial: f32) {
        self.latest.insert(source_id, (directional, spatial));
        self.applied += 1;
    }
}
