//! Run-length encoded log of an aircraft's status over an episode.
use serde::{Deserialize, Serialize};

use crate::aircraft::Status;
use crate::port::PortId;

/// A run of consecutive ticks spent in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSegment {
    pub status: Status,
    pub departure_port: PortId,
    pub arrival_port: Option<PortId>,
    pub tick_count: u32,
}

/// Append-only while the episode runs; cleared on reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScheduleHistory {
    segments: Vec<ScheduleSegment>,
}

impl ScheduleHistory {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Record one tick. Extends the last segment when the status is unchanged.
    pub fn record(&mut self, status: Status, departure_port: PortId, arrival_port: Option<PortId>) {
        if let Some(last) = self.segments.last_mut()
            && last.status == status
        {
            last.tick_count = last.tick_count.saturating_add(1);
            return;
        }
        self.segments.push(ScheduleSegment {
            status,
            departure_port,
            arrival_port,
            tick_count: 1,
        });
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    #[must_use]
    pub fn segments(&self) -> &[ScheduleSegment] {
        &self.segments
    }

    #[must_use]
    pub fn total_ticks(&self) -> u32 {
        self.segments
            .iter()
            .fold(0_u32, |acc, segment| acc.saturating_add(segment.tick_count))
    }

    /// Number of completed or ongoing flights in the log.
    #[must_use]
    pub fn flights(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| segment.status == Status::Fly)
            .count()
    }
}
