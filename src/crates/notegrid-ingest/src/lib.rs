//! Score readers for notegrid
//!
//! Turns Standard MIDI Files and partwise MusicXML documents into the
//! format-independent [`notegrid_core::Score`] model.

pub mod error;
pub mod instruments;
pub mod load;
pub mod midi;
pub mod musicxml;

// Re-export main entry points for convenience
pub use error::{IngestError, Result};
pub use instruments::{gm_drum_name, gm_program_name};
pub use load::{detect_format, load};
pub use midi::{parse_midi, read_midi};
pub use musicxml::{parse_musicxml, read_musicxml};
