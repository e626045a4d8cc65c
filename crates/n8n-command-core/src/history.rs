use crate::types::Command;
use parking_lot::Mutex;
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Fixed-capacity list of recently dispatched commands, oldest first.
///
/// Recording past capacity evicts the oldest entry. The ring knows nothing
/// about dispatch; re-sending an entry is up to the caller.
#[derive(Debug)]
pub struct HistoryRing {
    capacity: usize,
    entries: Mutex<VecDeque<Command>>,
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryRing {
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append `command`, evicting the oldest entry if full. Returns the
    /// contents right after this record.
    pub fn record(&self, command: Command) -> Vec<Command> {
        let mut entries = self.entries.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(command);
        entries.iter().cloned().collect()
    }

    pub fn list(&self) -> Vec<Command> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Entry at `index`, counting from the oldest.
    pub fn get(&self, index: usize) -> Option<Command> {
        self.entries.lock().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
