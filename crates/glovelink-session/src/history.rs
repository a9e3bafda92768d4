//! Bounded sliding window of recent samples.

use std::collections::{VecDeque, vec_deque};

use glovelink_core::constants::{DEFAULT_HISTORY_CAPACITY, MAX_HISTORY_CAPACITY};
use glovelink_core::{Error, Result, Sample};

/// Insertion-ordered window of the most recent samples.
///
/// Capacity is fixed at construction. Appending to a full buffer evicts the
/// oldest sample. The buffer is only emptied by an explicit [`clear`].
///
/// [`clear`]: HistoryBuffer::clear
///
/// # Examples
///
/// ```
/// use glovelink_core::Sample;
/// use glovelink_session::HistoryBuffer;
///
/// let mut history = HistoryBuffer::new(2).unwrap();
/// history.append(Sample::now([1, 1, 1, 1, 1]));
/// history.append(Sample::now([2, 2, 2, 2, 2]));
/// history.append(Sample::now([3, 3, 3, 3, 3]));
///
/// let snapshot = history.snapshot();
/// assert_eq!(snapshot.len(), 2);
/// assert_eq!(snapshot[0].channels(), &[2, 2, 2, 2, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Create an empty buffer holding at most `capacity` samples.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCapacity` if `capacity` is zero or larger than
    /// `MAX_HISTORY_CAPACITY`.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 || capacity > MAX_HISTORY_CAPACITY {
            return Err(Error::InvalidCapacity(format!(
                "history capacity must be 1-{MAX_HISTORY_CAPACITY}, got {capacity}"
            )));
        }

        Ok(Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Append a sample, returning the evicted one if the buffer was full.
    pub fn append(&mut self, sample: Sample) -> Option<Sample> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    /// Copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().cloned().collect()
    }

    /// Iterate over the current contents, oldest first.
    pub fn iter(&self) -> vec_deque::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// The most recent sample.
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Remove all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self {
            samples: VecDeque::with_capacity(DEFAULT_HISTORY_CAPACITY),
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample(n: i32) -> Sample {
        Sample::now([n; 5])
    }

    #[test]
    fn test_sixty_appends_keep_last_fifty() {
        let mut history = HistoryBuffer::new(50).unwrap();

        for n in 1..=60 {
            history.append(sample(n));
        }

        let snapshot = history.snapshot();
        assert_eq!(snapshot.len(), 50);
        assert_eq!(snapshot[0].channels(), &[11; 5]);
        assert_eq!(snapshot[49].channels(), &[60; 5]);
        assert!(
            snapshot
                .windows(2)
                .all(|w| w[0].channels()[0] + 1 == w[1].channels()[0])
        );
    }

    #[test]
    fn test_append_returns_evicted() {
        let mut history = HistoryBuffer::new(2).unwrap();

        assert!(history.append(sample(1)).is_none());
        assert!(history.append(sample(2)).is_none());
        assert!(history.is_full());

        let evicted = history.append(sample(3)).unwrap();
        assert_eq!(evicted.channels(), &[1; 5]);
        assert_eq!(history.latest().unwrap().channels(), &[3; 5]);
    }

    #[test]
    fn test_clear_then_snapshot_is_empty() {
        let mut history = HistoryBuffer::default();
        history.append(sample(1));

        history.clear();

        assert!(history.snapshot().is_empty());
        assert!(history.is_empty());
        assert_eq!(history.capacity(), DEFAULT_HISTORY_CAPACITY);
    }

    #[rstest]
    #[case(0)]
    #[case(MAX_HISTORY_CAPACITY + 1)]
    fn test_invalid_capacity(#[case] capacity: usize) {
        assert!(matches!(
            HistoryBuffer::new(capacity),
            Err(Error::InvalidCapacity(_))
        ));
    }

    #[test]
    fn test_capacity_sixty() {
        let mut history = HistoryBuffer::new(60).unwrap();

        for n in 0..100 {
            history.append(sample(n));
        }

        assert_eq!(history.len(), 60);
        assert_eq!(history.iter().next().unwrap().channels(), &[40; 5]);
    }
}
