//! Event types reported by the occlusion engine

use crate::math::Vec2;
use crate::registry::SourceId;

#[derive(Debug, Clone, PartialEq)]
pub enum OcclusionEvent {
    SourceRegistered {
        source_id: SourceId,
    },
    SourceUnregistered {
        source_id: SourceId,
    },
    /// The source's locator stopped resolving, so the engine dropped it
    SourcePruned {
        source_id: SourceId,
    },
    /// A one-shot source outlived its tracking window
    TrackingWindowElapsed {
        source_id: SourceId,
    },
    ListenerResolved {
        position: Vec2,
    },
    ListenerLost,
}

impl OcclusionEvent {
    pub fn source_id(&self) -> Option<SourceId> {
        match self {
            Self::SourceRegistered { source_id }
            | Self::SourceUnregistered { source_id }
            | Self::SourcePruned { source_id }
            | Self::TrackingWindowElapsed { source_id } => Some(*source_id),
            _ => None,
        }
    }

    pub fn is_source_event(&self) -> bool {
        self.source_id().is_some()
    }
}
