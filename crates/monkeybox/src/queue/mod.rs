//! FIFO buffer of primitive events awaiting delivery.

use crate::model::{EventPayload, PrimitiveEvent};
use std::collections::VecDeque;

/// Ordered buffer of primitive events, exclusively owned by the engine.
///
/// Ids assigned at enqueue time strictly increase for the engine's lifetime,
/// even across [`clear`](EventQueue::clear).
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<PrimitiveEvent>,
    next_id: u64,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `payload` to the tail, assigning the next event id.
    pub fn enqueue(&mut self, payload: EventPayload) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.events.push_back(PrimitiveEvent { id, payload });
        id
    }

    /// Remove and return the head. Callers must check
    /// [`has_event`](EventQueue::has_event) first; `None` here is a caller
    /// bug, not a recoverable device state.
    pub fn dequeue(&mut self) -> Option<PrimitiveEvent> {
        self.events.pop_front()
    }

    /// Drop all queued events. The id counter keeps running.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    #[must_use]
    pub fn has_event(&self) -> bool {
        !self.events.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
