//! Bounded undo/redo log for a single cell.

use std::collections::VecDeque;

/// Default number of past states a cell keeps.
pub const DEFAULT_HISTORY_SIZE: usize = 100;

/// Past and future values of a cell.
///
/// `past` ends with the value the cell currently holds. The oldest past
/// entry is the floor: undoing past it is a no-op.
#[derive(Debug, Clone)]
pub struct History<T> {
    past: VecDeque<T>,
    future: Vec<T>,
    max_size: usize,
}

/// A copy of a history's stacks, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySnapshot<T> {
    pub past: Vec<T>,
    pub future: Vec<T>,
}

impl<T: Clone> History<T> {
    /// Create a history primed with `initial`. A `max_size` of zero is
    /// treated as one.
    pub fn new(initial: T, max_size: usize) -> Self {
        let max_size = max_size.max(1);
        let mut past = VecDeque::with_capacity(max_size.min(DEFAULT_HISTORY_SIZE));
        past.push_back(initial);
        Self {
            past,
            future: Vec::new(),
            max_size,
        }
    }

    /// Record a new state. Starts a new timeline, so the redo stack is
    /// cleared.
    pub fn push(&mut self, value: T) {
        self.push_past(value);
        self.future.clear();
    }

    fn push_past(&mut self, value: T) {
        self.past.push_back(value);
        while self.past.len() > self.max_size {
            self.past.pop_front();
        }
    }

    /// Step back. Returns the state to restore, or `None` at the floor.
    pub fn undo(&mut self) -> Option<T> {
        if self.past.len() < 2 {
            return None;
        }
        let current = self.past.pop_back()?;
        self.future.push(current);
        self.past.back().cloned()
    }

    /// Step forward. Returns the state to restore, or `None` when nothing
    /// was undone since the last push.
    pub fn redo(&mut self) -> Option<T> {
        let next = self.future.pop()?;
        self.push_past(next.clone());
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        self.past.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn past(&self) -> impl Iterator<Item = &T> {
        self.past.iter()
    }

    /// Redo stack, next state to redo first.
    pub fn future(&self) -> impl Iterator<Item = &T> {
        self.future.iter().rev()
    }

    pub fn snapshot(&self) -> HistorySnapshot<T> {
        HistorySnapshot {
            past: self.past.iter().cloned().collect(),
            future: self.future().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn past<T: Clone>(history: &History<T>) -> Vec<T> {
        history.past().cloned().collect()
    }

    #[test]
    fn push_evicts_oldest_beyond_capacity() {
        let mut history = History::new(0, 2);
        for value in 1..=4 {
            history.push(value);
        }
        assert_eq!(past(&history), vec![3, 4]);
        assert_eq!(history.undo(), Some(3));
    }

    #[test]
    fn push_clears_future() {
        let mut history = History::new(0, 10);
        history.push(1);
        history.push(2);
        assert_eq!(history.undo(), Some(1));
        assert!(history.can_redo());

        history.push(10);
        assert!(!history.can_redo());
        assert_eq!(history.redo(), None);
        assert_eq!(past(&history), vec![0, 1, 10]);
    }

    #[test]
    fn undo_stops_at_the_floor() {
        let mut history = History::new("a", 5);
        history.push("b");

        assert_eq!(history.undo(), Some("a"));
        assert_eq!(history.undo(), None);
        assert!(!history.can_undo());
        assert_eq!(past(&history), vec!["a"]);
    }

    #[test]
    fn redo_replays_in_order() {
        let mut history = History::new(0, 5);
        history.push(1);
        history.push(2);
        history.undo();
        history.undo();

        assert_eq!(history.snapshot().future, vec![1, 2]);
        assert_eq!(history.redo(), Some(1));
        assert_eq!(history.redo(), Some(2));
        assert_eq!(history.redo(), None);
        assert_eq!(past(&history), vec![0, 1, 2]);
    }

    #[test]
    fn zero_capacity_keeps_one_entry() {
        let mut history = History::new(1, 0);
        history.push(2);
        assert_eq!(history.max_size(), 1);
        assert_eq!(past(&history), vec![2]);
        assert_eq!(history.undo(), None);
    }
}
