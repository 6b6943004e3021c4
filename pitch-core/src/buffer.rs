//! # Sample History Module
//!
//! A fixed-capacity ring of the most recent non-silent samples.
//!
//! The buffer is allocated once per audio session and overwritten
//! continuously: when it is full, the oldest sample is discarded to make
//! room for the newest one. Exact zeros are treated as silence and are
//! never stored, so the retained history is gap-free with respect to
//! non-silent audio but not literally time-contiguous.

/// Ring buffer of recent samples with overwrite-oldest semantics.
#[derive(Debug, Clone)]
pub struct CircularSampleBuffer {
    data: Vec<f64>,
    /// Index of the oldest valid element.
    head: usize,
    /// Index of the most recently written element.
    tail: usize,
    empty: bool,
}

impl CircularSampleBuffer {
    /// Creates an empty buffer holding at most `capacity` samples.
    ///
    /// # Panics
    /// * If `capacity` is zero
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "CircularSampleBuffer capacity must be non-zero");
        Self {
            data: vec![0.0; capacity],
            head: 0,
            tail: capacity - 1,
            empty: true,
        }
    }

    /// Appends one sample, silently dropping exact zeros.
    ///
    /// When the buffer is full the head advances before the tail, so the
    /// oldest sample is the one overwritten.
    pub fn push(&mut self, sample: f64) {
        if sample == 0.0 {
            return;
        }
        let size = self.data.len();
        if self.empty {
            self.head = 0;
            self.tail = 0;
            self.empty = false;
        } else {
            if self.is_full() {
                self.head = (self.head + 1) % size;
            }
            self.tail = (self.tail + 1) % size;
        }
        self.data[self.tail] = sample;
    }

    /// Appends every sample of `samples` in order.
    pub fn extend_from_slice(&mut self, samples: &[f64]) {
        for &sample in samples {
            self.push(sample);
        }
    }

    /// Returns the sample at `index` positions after the oldest retained one.
    pub fn get(&self, index: usize) -> Option<f64> {
        if index >= self.capacity() {
            return None;
        }
        Some(self.data[(self.head + index) % self.data.len()])
    }

    /// Number of samples currently held.
    ///
    /// Derived from the head and tail indices as
    /// `(tail - head + C) mod C + 1`.
    pub fn capacity(&self) -> usize {
        if self.empty {
            return 0;
        }
        let size = self.data.len();
        (self.tail + size - self.head) % size + 1
    }

    /// The fixed number of samples the buffer can hold.
    pub fn max_capacity(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn is_full(&self) -> bool {
        self.capacity() == self.data.len()
    }

    /// Discards all samples without releasing the storage.
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = self.data.len() - 1;
        self.empty = true;
    }

    /// Iterates over the retained samples, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.capacity()).map(move |i| self.data[(self.head + i) % self.data.len()])
    }

    /// Copies the retained samples, oldest first, into `out`.
    ///
    /// `out` is cleared first; its allocation is reused between cycles.
    pub fn copy_to(&self, out: &mut Vec<f64>) {
        out.clear();
        out.extend(self.iter());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_keeps_last_capacity_samples_oldest_first() {
        let capacity = 8;
        let mut buffer = CircularSampleBuffer::new(capacity);
        for i in 1..=(capacity + 5) {
            buffer.push(i as f64);
        }

        assert_eq!(buffer.capacity(), capacity);
        for i in 0..capacity {
            assert_eq!(buffer.get(i), Some((i + 6) as f64));
        }
        assert_eq!(buffer.get(capacity), None);
    }

    #[test]
    fn zeros_are_not_stored() {
        let mut buffer = CircularSampleBuffer::new(4);
        buffer.extend_from_slice(&[0.0, 0.5, 0.0, 0.0, -0.5, 0.0]);

        assert_eq!(buffer.capacity(), 2);
        assert_eq!(buffer.iter().collect::<Vec<_>>(), vec![0.5, -0.5]);
    }

    #[test]
    fn empty_buffer_reports_nothing() {
        let buffer = CircularSampleBuffer::new(3);
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 0);
        assert_eq!(buffer.get(0), None);
        assert_eq!(buffer.iter().count(), 0);
    }

    #[test]
    fn indices_wrap_many_times() {
        let mut buffer = CircularSampleBuffer::new(5);
        for i in 1..=1003 {
            buffer.push(i as f64);
        }
        let mut snapshot = Vec::new();
        buffer.copy_to(&mut snapshot);
        assert_eq!(snapshot, vec![999.0, 1000.0, 1001.0, 1002.0, 1003.0]);
        assert!(buffer.is_full());
    }

    #[test]
    fn clear_resets_occupancy() {
        let mut buffer = CircularSampleBuffer::new(2);
        buffer.extend_from_slice(&[1.0, 2.0, 3.0]);
        buffer.clear();
        assert_eq!(buffer.capacity(), 0);
        buffer.push(4.0);
        assert_eq!(buffer.get(0), Some(4.0));
        assert_eq!(buffer.capacity(), 1);
    }

    #[test]
    fn single_slot_buffer_holds_newest() {
        let mut buffer = CircularSampleBuffer::new(1);
        buffer.extend_from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.get(0), Some(3.0));
    }
}
