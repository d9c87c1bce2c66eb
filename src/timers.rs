/// Cancellable timer queue driven by a caller-supplied millisecond clock.
///
/// Every animated view owns one of these instead of scheduling callbacks:
/// it schedules payloads, cancels them on teardown, and drains whatever is
/// due each time the host ticks it.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<T> {
    id: TimerId,
    due_ms: u64,
    payload: T,
}

#[derive(Debug)]
pub struct Timers<T> {
    entries: Vec<Entry<T>>,
    next_id: u64,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Timers<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    /// Schedule `payload` to fire once `now >= due_ms`
    pub fn schedule(&mut self, due_ms: u64, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, due_ms, payload });
        id
    }

    /// Returns false if the timer already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest due time, if anything is pending
    pub fn next_due(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.due_ms).min()
    }

    /// Remove and return every payload due at `now_ms`, ordered by due time
    /// and then by scheduling order.
    pub fn pop_due(&mut self, now_ms: u64) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.due_ms <= now_ms);
        self.entries = pending;
        due.sort_by_key(|e| (e.due_ms, e.id));
        due.into_iter().map(|e| e.payload).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_due_order() {
        let mut timers = Timers::new();
        timers.schedule(300, "late");
        timers.schedule(100, "early");
        timers.schedule(100, "early-second");

        assert!(timers.pop_due(50).is_empty());
        assert_eq!(timers.pop_due(100), vec!["early", "early-second"]);
        assert_eq!(timers.next_due(), Some(300));
        assert_eq!(timers.pop_due(1_000), vec!["late"]);
        assert!(timers.is_empty());
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut timers = Timers::new();
        let id = timers.schedule(10, 1);
        timers.schedule(20, 2);

        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert!(!timers.is_pending(id));
        assert_eq!(timers.pop_due(100), vec![2]);
    }
}
