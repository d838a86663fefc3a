//! Per-item completion state, keyed by `(day index, item index)`.
//!
//! Keys are positional and never checked against a schedule: toggling an
//! index pair that does not exist is allowed and simply records a mark.

use std::collections::HashMap;

/// Position of an item within a weekly schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub day: usize,
    pub item: usize,
}

impl ItemKey {
    pub fn new(day: usize, item: usize) -> Self {
        Self { day, item }
    }
}

/// Mutable map of completed items. Absent keys read as not complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionTracker {
    marks: HashMap<ItemKey, bool>,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the mark for `(day, item)` and return the new value.
    pub fn toggle(&mut self, day: usize, item: usize) -> bool {
        let mark = self.marks.entry(ItemKey::new(day, item)).or_insert(false);
        *mark = !*mark;
        *mark
    }

    /// Whether `(day, item)` is marked complete.
    pub fn is_complete(&self, day: usize, item: usize) -> bool {
        self.marks
            .get(&ItemKey::new(day, item))
            .copied()
            .unwrap_or(false)
    }

    /// Count completed items among the first `item_count` items of `day`.
    pub fn completed_in_day(&self, day: usize, item_count: usize) -> usize {
        (0..item_count)
            .filter(|&item| self.is_complete(day, item))
            .count()
    }

    /// Completed keys in `(day, item)` order.
    pub fn completed_keys(&self) -> Vec<ItemKey> {
        let mut keys: Vec<ItemKey> = self
            .marks
            .iter()
            .filter_map(|(k, done)| done.then_some(*k))
            .collect();
        keys.sort();
        keys
    }

    /// Number of items currently marked complete.
    pub fn len(&self) -> usize {
        self.marks.values().filter(|done| **done).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every mark.
    pub fn clear(&mut self) {
        self.marks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_key_is_not_complete() {
        let tracker = CompletionTracker::new();
        assert!(!tracker.is_complete(0, 0));
        assert!(tracker.is_empty());
    }

    #[test]
    fn toggle_marks_then_unmarks() {
        let mut tracker = CompletionTracker::new();
        assert!(tracker.toggle(2, 3));
        assert!(tracker.is_complete(2, 3));
        assert!(!tracker.toggle(2, 3));
        assert!(!tracker.is_complete(2, 3));
    }

    #[test]
    fn double_toggle_restores_value_for_any_key() {
        let keys = [(0, 0), (6, 4), (99, 1000), (usize::MAX, usize::MAX)];
        let mut tracker = CompletionTracker::new();
        tracker.toggle(6, 4);
        for (d, i) in keys {
            let before = tracker.is_complete(d, i);
            tracker.toggle(d, i);
            tracker.toggle(d, i);
            assert_eq!(tracker.is_complete(d, i), before, "key ({d}, {i})");
        }
    }

    #[test]
    fn keys_are_independent() {
        let mut tracker = CompletionTracker::new();
        tracker.toggle(0, 1);
        assert!(!tracker.is_complete(1, 0));
        assert!(!tracker.is_complete(0, 0));
    }

    #[test]
    fn completed_in_day_counts_only_that_day() {
        let mut tracker = CompletionTracker::new();
        tracker.toggle(1, 0);
        tracker.toggle(1, 2);
        tracker.toggle(2, 0);
        tracker.toggle(1, 9); // beyond item_count
        assert_eq!(tracker.completed_in_day(1, 5), 2);
        assert_eq!(tracker.completed_in_day(3, 5), 0);
    }

    #[test]
    fn len_ignores_unmarked_entries() {
        let mut tracker = CompletionTracker::new();
        tracker.toggle(0, 0);
        tracker.toggle(0, 1);
        tracker.toggle(0, 1);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.completed_keys(), vec![ItemKey::new(0, 0)]);
    }

    #[test]
    fn clear_resets_everything() {
        let mut tracker = CompletionTracker::new();
        tracker.toggle(3, 3);
        tracker.clear();
        assert!(tracker.is_empty());
        assert!(!tracker.is_complete(3, 3));
    }
}
