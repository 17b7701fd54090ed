//! Typed engine notifications
//!
//! Hosts pass an [`EventSink`] to the engine at construction instead of
//! listening on a global event target.

use crate::entry::EntryId;
use crate::error::ValidationError;
use crate::graph::SnapshotStats;

/// Something the host may want to react to
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A rubric change was appended
    EntryRecorded(EntryId),
    /// A version was focused; the host loads it into the editor
    VersionFocused(EntryId),
    /// A merge entry was appended
    MergeCompleted {
        /// New merge entry
        merged: EntryId,
        /// Versions it merges, in selection order
        sources: Vec<EntryId>,
    },
    /// A merge request failed validation
    MergeRejected(ValidationError),
    /// A new snapshot was published
    SnapshotRebuilt(SnapshotStats),
}

/// Receiver of engine events
pub trait EventSink {
    /// Deliver one event
    fn publish(&mut self, event: &EngineEvent);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&mut self, _event: &EngineEvent) {}
}

impl EventSink for Vec<EngineEvent> {
    fn publish(&mut self, event: &EngineEvent) {
        self.push(event.clone());
    }
}

impl<F> EventSink for F
where
    F: FnMut(&EngineEvent),
{
    fn publish(&mut self, event: &EngineEvent) {
        self(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_sink_records() {
        let mut sink: Vec<EngineEvent> = Vec::new();
        sink.publish(&EngineEvent::EntryRecorded(EntryId::from("a")));
        assert_eq!(sink, vec![EngineEvent::EntryRecorded(EntryId::from("a"))]);
    }

    #[test]
    fn closure_sink_is_called() {
        let mut count = 0;
        {
            let mut sink = |_: &EngineEvent| count += 1;
            sink.publish(&EngineEvent::VersionFocused(EntryId::from("a")));
            sink.publish(&EngineEvent::VersionFocused(EntryId::from("b")));
        }
        assert_eq!(count, 2);
    }
}
