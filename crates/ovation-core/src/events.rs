use crate::constants::{EVENT_LOG_CAP, EVENT_LOG_RETAIN};

/// Immutable record of one emitted clap.
///
/// `person_index` is the position within the scheduled batch for that beat,
/// not a stable identity; `timestamp` is the clock capture used downstream
/// for aging/fade effects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClapEvent {
    pub beat_time: f64,
    pub offset_ms: f64,
    pub person_index: usize,
    pub timestamp: f64,
}

/// Bounded history of emitted claps, newest-last.
///
/// Once the cap is exceeded the oldest entries are dropped in one batch,
/// keeping the most recent 70%, so the trim cost amortizes instead of
/// shifting the buffer on every append.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<ClapEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: ClapEvent) {
        self.events.push(event);
        if self.events.len() > EVENT_LOG_CAP {
            let excess = self.events.len() - EVENT_LOG_RETAIN;
            self.events.drain(..excess);
        }
    }

    pub fn recent(&self) -> &[ClapEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
