//! Metric alignment: measure and beat positions for note events
//!
//! Two strategies share the [`MetricStrategy`] interface. [`GridStrategy`]
//! searches absolute-time boundaries; [`NativeOffsetStrategy`] passes through
//! the measure and beat the notation already states. One is chosen per run
//! with [`select_strategy`].

use crate::boundary::BoundarySequence;
use crate::event::{AlignedNoteEvent, NoteEvent};
use crate::grid::MetricGrid;
use serde::{Deserialize, Serialize};

/// Number of boundaries at or before `time`.
///
/// A time exactly on a boundary belongs to the unit that boundary starts.
/// Times past the last boundary get `boundaries.len()`, and an empty
/// sequence puts everything in unit 0.
pub fn align(time: f64, boundaries: &BoundarySequence) -> usize {
    boundaries.count_at_or_before(time)
}

/// Measure and beat of one event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricPosition {
    pub measure: usize,
    pub beat: usize,
}

/// Assigns a metric position to an event
pub trait MetricStrategy {
    fn name(&self) -> &'static str;

    fn position(&self, event: &NoteEvent) -> MetricPosition;
}

/// Right-biased search of an event's onset in the beat and measure grid
#[derive(Debug, Clone, Default)]
pub struct GridStrategy {
    grid: MetricGrid,
}

impl GridStrategy {
    pub fn new(grid: MetricGrid) -> Self {
        GridStrategy { grid }
    }
}

impl MetricStrategy for GridStrategy {
    fn name(&self) -> &'static str {
        "grid search"
    }

    fn position(&self, event: &NoteEvent) -> MetricPosition {
        MetricPosition {
            measure: align(event.onset, &self.grid.measures),
            beat: align(event.onset, &self.grid.beats),
        }
    }
}

/// Measure number and whole beat as written in the notation
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeOffsetStrategy;

impl MetricStrategy for NativeOffsetStrategy {
    fn name(&self) -> &'static str {
        "native offset"
    }

    fn position(&self, event: &NoteEvent) -> MetricPosition {
        match event.native {
            Some(native) => MetricPosition {
                measure: native.measure_number,
                beat: native.beat.floor().max(0.0) as usize,
            },
            None => MetricPosition::default(),
        }
    }
}

/// Pick the strategy for a run.
///
/// A non-empty grid is always searched. Without one, events that all carry a
/// native position use it; otherwise the empty grid places every event in
/// unit 0.
pub fn select_strategy(grid: MetricGrid, events: &[NoteEvent]) -> Box<dyn MetricStrategy> {
    let strategy: Box<dyn MetricStrategy> = if !grid.is_empty() {
        Box::new(GridStrategy::new(grid))
    } else if !events.is_empty() && events.iter().all(|e| e.native.is_some()) {
        Box::new(NativeOffsetStrategy)
    } else {
        Box::new(GridStrategy::new(MetricGrid::empty()))
    };

    log::debug!("metric strategy: {}", strategy.name());
    strategy
}

/// Attach a metric position to every event, keeping their order
pub fn align_events(events: Vec<NoteEvent>, strategy: &dyn MetricStrategy) -> Vec<AlignedNoteEvent> {
    events
        .into_iter()
        .map(|event| {
            let position = strategy.position(&event);
            AlignedNoteEvent::new(event, position)
        })
        .collect()
}
