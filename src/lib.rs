//! notegrid: MIDI and MusicXML files to note-level tables
//!
//! One run resolves a single input file, parses it, gives every sounding
//! pitch a measure and beat, and writes one CSV row per pitch.

pub mod config;
pub mod discovery;
pub mod emitter;
pub mod error;
pub mod pipeline;

#[cfg(test)]
mod pipeline_tests;

pub use config::{FormatChoice, PipelineConfig};
pub use error::{PipelineError, Result};
pub use pipeline::{align_score, describe_parts, run, RunOutcome};
