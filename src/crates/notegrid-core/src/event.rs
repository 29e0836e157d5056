use crate::align::MetricPosition;
use crate::pitch::PitchDecomposition;
use crate::score::NativePosition;
use serde::{Deserialize, Serialize};

/// Kind of source item a canonical event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A single note
    Note,
    /// One pitch of a chord
    ChordPitch,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Note => "single-note",
            EventKind::ChordPitch => "chord-note",
        }
    }
}

/// Format-independent record for one sounding pitch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub part_index: usize,
    pub part_name: Option<String>,
    /// Instrument name (MIDI) or event kind label (MusicXML)
    pub label: Option<String>,
    pub kind: EventKind,
    pub is_drum: bool,
    pub pitch: Option<u8>,
    pub pitch_name: Option<String>,
    pub decomposition: PitchDecomposition,
    pub onset: f64,
    pub duration: f64,
    pub velocity: Option<u8>,
    pub native: Option<NativePosition>,
}

impl NoteEvent {
    pub fn end(&self) -> f64 {
        self.onset + self.duration
    }
}

/// A note event with its measure and beat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedNoteEvent {
    pub event: NoteEvent,
    pub measure_index: usize,
    pub beat_index: usize,
}

impl AlignedNoteEvent {
    pub fn new(event: NoteEvent, position: MetricPosition) -> Self {
        AlignedNoteEvent {
            event,
            measure_index: position.measure,
            beat_index: position.beat,
        }
    }
}
