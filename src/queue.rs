use crate::model::MediaItem;
use rand::rngs::SmallRng;
use rand::{RngExt, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// What the queue decided when the current item finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStep {
    Replay(usize),
    Advanced(usize),
}

impl QueueStep {
    pub fn index(self) -> usize {
        match self {
            Self::Replay(index) | Self::Advanced(index) => index,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueueState {
    items: Vec<MediaItem>,
    current_index: usize,
    shuffle: bool,
    repeat: bool,
    rng: SmallRng,
}

impl QueueState {
    pub fn new(items: Vec<MediaItem>) -> Self {
        Self::with_rng(items, rand::make_rng::<SmallRng>())
    }

    /// Deterministic shuffle, for tests and fuzzing.
    pub fn seeded(items: Vec<MediaItem>, seed: u64) -> Self {
        Self::with_rng(items, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(items: Vec<MediaItem>, rng: SmallRng) -> Self {
        Self {
            items,
            current_index: 0,
            shuffle: false,
            repeat: false,
            rng,
        }
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `None` only when the queue is empty.
    pub fn current_index(&self) -> Option<usize> {
        (!self.items.is_empty()).then_some(self.current_index)
    }

    pub fn current(&self) -> Option<&MediaItem> {
        self.items.get(self.current_index)
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn set_shuffle(&mut self, enabled: bool) {
        self.shuffle = enabled;
    }

    pub fn set_repeat(&mut self, enabled: bool) {
        self.repeat = enabled;
    }

    pub fn advance(&mut self, direction: Direction) -> Option<&MediaItem> {
        let index = self.next_index(direction)?;
        self.current_index = index;
        self.items.get(index)
    }

    pub fn on_item_finished(&mut self) -> Option<QueueStep> {
        if self.items.is_empty() {
            return None;
        }
        if self.repeat {
            return Some(QueueStep::Replay(self.current_index));
        }
        self.advance(Direction::Forward)?;
        Some(QueueStep::Advanced(self.current_index))
    }

    pub fn jump_to(&mut self, index: usize) -> Option<&MediaItem> {
        if index >= self.items.len() {
            return None;
        }
        self.current_index = index;
        self.items.get(index)
    }

    fn next_index(&mut self, direction: Direction) -> Option<usize> {
        let len = self.items.len();
        if len == 0 {
            return None;
        }

        if self.shuffle {
            if len == 1 {
                return Some(self.current_index);
            }
            // Draw from the other len-1 slots so the pick never needs a retry.
            let offset = self.rng.random_range(1..len);
            return Some((self.current_index + offset) % len);
        }

        let next = match direction {
            Direction::Forward => (self.current_index + 1) % len,
            Direction::Backward => (self.current_index + len - 1) % len,
        };
        Some(next)
    }
}
