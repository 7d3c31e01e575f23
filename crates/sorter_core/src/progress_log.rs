use std::time::SystemTime;

use crate::EventStatus;

/// Where a log entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrigin {
    /// A line received from the processor's event stream.
    Server,
    /// An advisory entry written by the client (reconnects, exhaustion).
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub sequence_id: u64,
    pub raw_message: String,
    pub status: EventStatus,
    pub origin: EventOrigin,
    pub received_at: SystemTime,
}

/// Append-only record of the active job's events, in receipt order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressLog {
    events: Vec<ProgressEvent>,
    next_sequence: u64,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        raw_message: impl Into<String>,
        status: EventStatus,
        origin: EventOrigin,
        received_at: SystemTime,
    ) -> &ProgressEvent {
        self.next_sequence += 1;
        self.events.push(ProgressEvent {
            sequence_id: self.next_sequence,
            raw_message: raw_message.into(),
            status,
            origin,
            received_at,
        });
        &self.events[self.events.len() - 1]
    }

    /// Drops every entry and restarts sequence numbering.
    pub fn clear(&mut self) {
        self.events.clear();
        self.next_sequence = 0;
    }

    pub fn all(&self) -> &[ProgressEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
