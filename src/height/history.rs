//! Fixed-capacity rolling window with a median read-out.
use crate::image::depth::median;

/// Ring buffer holding the last `capacity` readings.
#[derive(Clone, Debug)]
pub struct RollingMedian {
    buf: Vec<f32>,
    head: usize,
    capacity: usize,
}

impl RollingMedian {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    pub fn push(&mut self, value: f32) {
        if self.buf.len() < self.capacity {
            self.buf.push(value);
        } else {
            self.buf[self.head] = value;
        }
        self.head = (self.head + 1) % self.capacity;
    }

    pub fn median(&self) -> Option<f32> {
        let mut scratch = self.buf.clone();
        median(&mut scratch)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.head = 0;
    }
}
