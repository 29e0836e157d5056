use std::ops::Deref;
use thiserror::Error;

/// Reasons a list of boundary times is not a valid sequence
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundaryError {
    #[error("boundary {index} is not a finite time")]
    NonFinite { index: usize },

    #[error("boundary {index} is earlier than the one before it")]
    Descending { index: usize },
}

/// Ordered start times of successive grid units (beats or measures).
///
/// Values never decrease. Equal neighbours are allowed, since coinciding
/// time signature changes can mark the same instant twice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundarySequence {
    values: Vec<f64>,
}

impl BoundarySequence {
    /// Validate and wrap a list of boundary times
    pub fn new(values: Vec<f64>) -> Result<Self, BoundaryError> {
        for (index, value) in values.iter().enumerate() {
            if !value.is_finite() {
                return Err(BoundaryError::NonFinite { index });
            }
            if index > 0 && *value < values[index - 1] {
                return Err(BoundaryError::Descending { index });
            }
        }
        Ok(BoundarySequence { values })
    }

    /// Build a sequence from arbitrary input, dropping non-finite values
    pub fn from_unsorted(mut values: Vec<f64>) -> Self {
        values.retain(|v| v.is_finite());
        values.sort_by(f64::total_cmp);
        BoundarySequence { values }
    }

    pub fn empty() -> Self {
        BoundarySequence { values: Vec::new() }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Number of boundaries at or before `time`.
    ///
    /// A time equal to a boundary counts that boundary, so it lands in the
    /// unit the boundary starts.
    pub fn count_at_or_before(&self, time: f64) -> usize {
        self.values.partition_point(|&boundary| boundary <= time)
    }

    /// Copy of this sequence with `time` in front, used to make a grid
    /// start no later than the first note
    pub(crate) fn starting_at(&self, time: f64) -> Self {
        let mut values = Vec::with_capacity(self.values.len() + 1);
        values.push(time);
        values.extend_from_slice(&self.values);
        BoundarySequence { values }
    }
}

impl Deref for BoundarySequence {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_duplicates() {
        let seq = BoundarySequence::new(vec![0.0, 2.0, 2.0, 4.0]).unwrap();
        assert_eq!(seq.len(), 4);
        assert_eq!(seq.first(), Some(&0.0));
        assert_eq!(seq.last(), Some(&4.0));
    }

    #[test]
    fn test_rejects_descending() {
        let err = BoundarySequence::new(vec![0.0, 3.0, 2.0]).unwrap_err();
        assert_eq!(err, BoundaryError::Descending { index: 2 });
    }

    #[test]
    fn test_rejects_nan() {
        let err = BoundarySequence::new(vec![0.0, f64::NAN]).unwrap_err();
        assert_eq!(err, BoundaryError::NonFinite { index: 1 });
    }

    #[test]
    fn test_from_unsorted() {
        let seq = BoundarySequence::from_unsorted(vec![4.0, f64::INFINITY, 0.0, 2.0]);
        assert_eq!(seq.as_slice(), &[0.0, 2.0, 4.0]);
    }

    #[test]
    fn test_count_at_or_before() {
        let seq = BoundarySequence::new(vec![0.0, 2.0, 2.0, 4.0]).unwrap();
        assert_eq!(seq.count_at_or_before(-1.0), 0);
        assert_eq!(seq.count_at_or_before(0.0), 1);
        assert_eq!(seq.count_at_or_before(1.9), 1);
        assert_eq!(seq.count_at_or_before(2.0), 3);
        assert_eq!(seq.count_at_or_before(10.0), 4);
    }

    #[test]
    fn test_starting_at() {
        let seq = BoundarySequence::new(vec![1.0, 2.0]).unwrap();
        assert_eq!(seq.starting_at(0.5).as_slice(), &[0.5, 1.0, 2.0]);
    }
}
