use std::collections::VecDeque;

use super::normalize::DisplayEntry;

/// Number of feed lines kept on screen.
pub const FEED_CAPACITY: usize = 10;

/// Newest-first list of feed lines, bounded at [`FEED_CAPACITY`].
#[derive(Debug, Clone)]
pub struct EventBuffer {
    entries: VecDeque<DisplayEntry>,
    capacity: usize,
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::with_capacity(FEED_CAPACITY)
    }

    /// Buffer holding at most `capacity` lines (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Prepend `entry`, evicting whatever falls past the capacity.
    pub fn push(&mut self, entry: DisplayEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently pushed entry.
    pub fn latest(&self) -> Option<&DisplayEntry> {
        self.entries.front()
    }

    pub fn get(&self, index: usize) -> Option<&DisplayEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DisplayEntry> {
        self.entries.iter()
    }

    /// Lines in display order (newest first).
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.as_str().to_string()).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
