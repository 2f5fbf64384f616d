//! Bounded recency list used to avoid immediate repeats.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// How many recent picks are remembered per pool.
pub const HISTORY_CAPACITY: usize = 2;

/// FIFO of the most recently used clip paths.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentHistory {
    items: VecDeque<PathBuf>,
    capacity: usize,
}

impl Default for RecentHistory {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl RecentHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a pick, evicting the oldest entry when full.
    pub fn push(&mut self, path: impl Into<PathBuf>) {
        if self.capacity == 0 {
            return;
        }
        if self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(path.into());
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.items.iter().any(|p| p == path)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Forget everything but the most recent pick.
    pub fn keep_latest(&mut self) {
        while self.items.len() > 1 {
            self.items.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
