use super::super::api::RawEvent;

/// Resume position in the daemon's event log.
///
/// The first answer only learns the current tip; later answers hand out
/// the events newer than the cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCursor {
    since: u64,
    primed: bool,
}

#[derive(Debug)]
pub enum BatchOutcome {
    /// Tip learned, nothing to apply.
    Primed,
    Empty,
    Apply { events: Vec<RawEvent>, last_id: u64 },
}

impl EventCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn since(&self) -> u64 {
        self.since
    }

    /// The priming request only needs the newest event.
    pub fn limit(&self) -> Option<u32> {
        if self.primed {
            None
        } else {
            Some(1)
        }
    }

    /// Sort an answer to the request issued at `requested`.
    ///
    /// Events at or below the cursor were already applied and are dropped.
    /// Applying the batch is the caller's job; it moves the cursor with
    /// [`EventCursor::advance_to`] afterwards.
    pub fn receive(&mut self, requested: u64, batch: Vec<RawEvent>) -> BatchOutcome {
        let last_id = batch.last().map(|event| event.id);

        if !self.primed {
            self.primed = true;
            if let Some(last_id) = last_id {
                self.advance_to(last_id);
            }
            return BatchOutcome::Primed;
        }

        let floor = self.since.max(requested);
        let events: Vec<RawEvent> = batch.into_iter().filter(|event| event.id > floor).collect();
        match (events.is_empty(), last_id) {
            (false, Some(last_id)) => BatchOutcome::Apply { events, last_id },
            _ => BatchOutcome::Empty,
        }
    }

    /// Never moves backwards.
    pub fn advance_to(&mut self, id: u64) {
        self.since = self.since.max(id);
    }
}
