use super::event::Event;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    pub sequence_num: u64,
    pub event: Event,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .event
            .time
            .total_cmp(&self.event.time)
            .then_with(|| other.sequence_num.cmp(&self.sequence_num))
    }
}

/// Future events ordered by timestamp; equal timestamps pop in the order
/// they were pushed.
#[derive(Debug, Default)]
pub struct EventCalendar {
    event_queue: BinaryHeap<ScheduledEvent>,
    sequence_counter: u64,
}

impl EventCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.event_queue.push(ScheduledEvent {
            sequence_num: self.sequence_counter,
            event,
        });
        self.sequence_counter += 1;
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.event_queue.pop().map(|scheduled| scheduled.event)
    }

    pub fn peek(&self) -> Option<&Event> {
        self.event_queue.peek().map(|scheduled| &scheduled.event)
    }

    pub fn is_empty(&self) -> bool {
        self.event_queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.event_queue.len()
    }

    pub fn clear(&mut self) {
        self.event_queue.clear();
    }

    /// The next `n` events in firing order, without removing them
    pub fn upcoming(&self, n: usize) -> Vec<Event> {
        let mut pending: Vec<&ScheduledEvent> = self.event_queue.iter().collect();
        pending.sort_by(|a, b| b.cmp(a));
        pending.into_iter().take(n).map(|s| s.event).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::EventKind;

    #[test]
    fn test_pops_in_time_order() {
        let mut calendar = EventCalendar::new();
        for (i, t) in [5.0, 1.5, 9.0, 0.25, 3.0, 3.0, 7.75].iter().enumerate() {
            calendar.push(Event::arrival(*t, i));
        }
        let mut last = f64::NEG_INFINITY;
        let mut popped = 0;
        while let Some(event) = calendar.pop() {
            assert!(event.time >= last);
            last = event.time;
            popped += 1;
        }
        assert_eq!(popped, 7);
        assert!(calendar.is_empty());
    }

    #[test]
    fn test_ties_pop_in_push_order() {
        let mut calendar = EventCalendar::new();
        calendar.push(Event::completion(2.0, 1));
        calendar.push(Event::arrival(2.0, 0));
        calendar.push(Event::completion(2.0, 0));
        assert_eq!(calendar.pop().unwrap().kind, EventKind::Completion { server_id: 1 });
        assert_eq!(calendar.pop().unwrap().kind, EventKind::Arrival { source_id: 0 });
        assert_eq!(calendar.pop().unwrap().kind, EventKind::Completion { server_id: 0 });
    }

    #[test]
    fn test_peek_and_empty() {
        let mut calendar = EventCalendar::new();
        assert!(calendar.peek().is_none());
        assert!(calendar.pop().is_none());
        calendar.push(Event::arrival(4.0, 0));
        calendar.push(Event::arrival(1.0, 1));
        assert_eq!(calendar.peek().unwrap().time, 1.0);
        assert_eq!(calendar.len(), 2);
        calendar.clear();
        assert!(calendar.is_empty());
    }

    #[test]
    fn test_upcoming_is_sorted_and_non_destructive() {
        let mut calendar = EventCalendar::new();
        calendar.push(Event::arrival(3.0, 0));
        calendar.push(Event::new(1.0, EventKind::SystemCheck));
        calendar.push(Event::completion(2.0, 0));
        let next = calendar.upcoming(2);
        assert_eq!(next.len(), 2);
        assert_eq!(next[0].time, 1.0);
        assert_eq!(next[1].time, 2.0);
        assert_eq!(calendar.len(), 3);
    }
}
