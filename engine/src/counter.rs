use serde::{Deserialize, Serialize};

/// A counter clamped to `0..=max`.
///
/// `set` clamps out-of-range values instead of rejecting them, and
/// `decrement` saturates at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    value: u32,
    max: u32,
}

impl Counter {
    pub fn new(max: u32) -> Self {
        Self { value: 0, max }
    }

    pub fn with_value(max: u32, value: u32) -> Self {
        let mut counter = Self::new(max);
        counter.set(value);
        counter
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn set(&mut self, value: u32) {
        self.value = value.min(self.max);
    }

    pub fn increment(&mut self) {
        self.set(self.value.saturating_add(1));
    }

    pub fn decrement(&mut self) {
        self.value = self.value.saturating_sub(1);
    }
}
