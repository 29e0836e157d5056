// Grid builder - beat and measure boundaries for one score
// Absolute-time grids only; symbolic formats fall back to native positions

use crate::boundary::{BoundaryError, BoundarySequence};
use crate::score::{Score, TimeGrid};

/// Beat and measure start times for one score
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricGrid {
    pub beats: BoundarySequence,
    pub measures: BoundarySequence,
}

impl MetricGrid {
    pub fn new(beats: BoundarySequence, measures: BoundarySequence) -> Self {
        MetricGrid { beats, measures }
    }

    pub fn empty() -> Self {
        MetricGrid::default()
    }

    /// True when there is nothing to search
    pub fn is_empty(&self) -> bool {
        self.beats.is_empty() && self.measures.is_empty()
    }
}

/// Derive the beat and measure boundaries of a score.
///
/// Scores without an absolute-time grid get an empty grid. A grid the
/// parser resolved but that is not ordered is rejected the same way, with a
/// warning, so alignment degrades instead of failing the run.
pub fn build_grid(score: &Score) -> MetricGrid {
    let Some(raw) = &score.grid else {
        log::debug!("{} score has no absolute-time grid", score.format);
        return MetricGrid::empty();
    };

    match validate(raw) {
        Ok(grid) => {
            let grid = anchor_to_first_onset(grid, score.first_onset());
            log::debug!(
                "grid: {} beats, {} measures",
                grid.beats.len(),
                grid.measures.len()
            );
            grid
        }
        Err(e) => {
            log::warn!("Discarding beat grid: {}", e);
            MetricGrid::empty()
        }
    }
}

fn validate(raw: &TimeGrid) -> Result<MetricGrid, BoundaryError> {
    let beats = BoundarySequence::new(raw.beats.clone())?;
    let measures = BoundarySequence::new(raw.downbeats.clone())?;
    Ok(MetricGrid::new(beats, measures))
}

/// Make each non-empty sequence begin at or before the first onset
fn anchor_to_first_onset(grid: MetricGrid, first_onset: Option<f64>) -> MetricGrid {
    let Some(onset) = first_onset else {
        return grid;
    };

    let anchor = |seq: BoundarySequence| match seq.first() {
        Some(&start) if start > onset => seq.starting_at(onset),
        _ => seq,
    };

    MetricGrid::new(anchor(grid.beats), anchor(grid.measures))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{Part, SourceFormat, SourceItem, SourcePitch, TimeBase, Timing};

    fn score_with(grid: Option<TimeGrid>, onsets: &[f64]) -> Score {
        let mut score = Score::new(SourceFormat::Midi, TimeBase::Seconds);
        let mut part = Part::new(None);
        for &onset in onsets {
            part.items.push(SourceItem::Note {
                pitch: SourcePitch::new(Some(60), Some("C4".into())),
                timing: Timing::new(onset, 0.5),
                velocity: Some(90),
            });
        }
        score.parts.push(part);
        score.grid = grid;
        score
    }

    #[test]
    fn test_no_grid_is_noop() {
        let score = score_with(None, &[0.0]);
        assert!(build_grid(&score).is_empty());
    }

    #[test]
    fn test_grid_passthrough() {
        let raw = TimeGrid {
            beats: vec![0.0, 0.5, 1.0, 1.5, 2.0],
            downbeats: vec![0.0, 2.0],
        };
        let grid = build_grid(&score_with(Some(raw), &[0.25, 1.75]));
        assert_eq!(grid.beats.as_slice(), &[0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(grid.measures.as_slice(), &[0.0, 2.0]);
    }

    #[test]
    fn test_grid_anchored_before_first_note() {
        let raw = TimeGrid {
            beats: vec![1.0, 2.0],
            downbeats: vec![1.0],
        };
        let grid = build_grid(&score_with(Some(raw), &[0.5, 1.5]));
        assert_eq!(grid.beats.as_slice(), &[0.5, 1.0, 2.0]);
        assert_eq!(grid.measures.as_slice(), &[0.5, 1.0]);
    }

    #[test]
    fn test_unordered_grid_is_discarded() {
        let raw = TimeGrid {
            beats: vec![0.0, 2.0, 1.0],
            downbeats: vec![0.0],
        };
        assert!(build_grid(&score_with(Some(raw), &[0.0])).is_empty());
    }

    #[test]
    fn test_empty_grid_with_notes() {
        let grid = build_grid(&score_with(Some(TimeGrid::default()), &[1.0]));
        assert!(grid.is_empty());
    }
}
