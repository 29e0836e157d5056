//! Core types and metric alignment for notegrid
//!
//! This crate holds the format-independent half of the pipeline: the score
//! model parsers produce, the beat/measure grid built from it, the event
//! normalizer, and the aligner that gives every note its measure and beat.
//!
//! # Examples
//!
//! ```
//! use notegrid_core::{align, BoundarySequence};
//!
//! let measures = BoundarySequence::new(vec![0.0, 2.0, 4.0]).unwrap();
//! assert_eq!(align(1.5, &measures), 1);
//! assert_eq!(align(4.0, &measures), 3);
//! ```
//!
//! # Main Components
//!
//! - **Score**: Parts and note-like items as a parser resolved them
//! - **BoundarySequence**: Ordered start times of beats or measures
//! - **MetricGrid**: The beat and measure sequences of one score
//! - **NoteEvent**: One sounding pitch in canonical form
//! - **MetricStrategy**: Grid search or native-offset passthrough

pub mod align;
pub mod boundary;
pub mod event;
pub mod grid;
pub mod normalize;
pub mod pitch;
pub mod score;

pub use align::{align, align_events, select_strategy, GridStrategy, MetricPosition, MetricStrategy, NativeOffsetStrategy};
pub use boundary::{BoundaryError, BoundarySequence};
pub use event::{AlignedNoteEvent, EventKind, NoteEvent};
pub use grid::{build_grid, MetricGrid};
pub use normalize::normalize;
pub use pitch::{decompose, note_number_to_name, PitchDecomposition};
pub use score::{Metadata, NativePosition, Part, Score, SourceFormat, SourceItem, SourcePitch, TimeBase, TimeGrid, Timing};
