use serde::{Deserialize, Serialize};
use std::fmt;

/// Container format a score was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Midi,
    MusicXml,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Midi => write!(f, "MIDI"),
            SourceFormat::MusicXml => write!(f, "MusicXML"),
        }
    }
}

/// Unit of every onset and duration in a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBase {
    /// Absolute performance time
    Seconds,
    /// Symbolic time, one unit per quarter note
    QuarterNotes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub composer: Option<String>,
}

/// Position of an item as written in the notation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NativePosition {
    /// Measure number as written
    pub measure_number: usize,
    /// Offset from the start of the measure, in quarter notes
    pub offset: f64,
    /// 1-based fractional beat within the measure
    pub beat: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub onset: f64,
    pub duration: f64,
    pub native: Option<NativePosition>,
}

impl Timing {
    pub fn new(onset: f64, duration: f64) -> Self {
        Timing {
            onset,
            duration,
            native: None,
        }
    }

    pub fn with_native(mut self, native: NativePosition) -> Self {
        self.native = Some(native);
        self
    }
}

/// One sounding pitch. Unpitched percussion may carry only a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePitch {
    pub number: Option<u8>,
    pub name: Option<String>,
}

impl SourcePitch {
    pub fn new(number: Option<u8>, name: Option<String>) -> Self {
        SourcePitch { number, name }
    }
}

/// A note-like item inside a part, in the order the source lists it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceItem {
    Note {
        pitch: SourcePitch,
        timing: Timing,
        velocity: Option<u8>,
    },
    Chord {
        pitches: Vec<SourcePitch>,
        timing: Timing,
        velocity: Option<u8>,
    },
    Rest {
        timing: Timing,
    },
}

impl SourceItem {
    pub fn timing(&self) -> &Timing {
        match self {
            SourceItem::Note { timing, .. }
            | SourceItem::Chord { timing, .. }
            | SourceItem::Rest { timing } => timing,
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, SourceItem::Rest { .. })
    }
}

/// An instrument track (MIDI) or part (MusicXML)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub name: Option<String>,
    /// Instrument label, e.g. a General MIDI program name
    pub instrument: Option<String>,
    pub program: Option<u8>,
    pub is_drum: bool,
    pub items: Vec<SourceItem>,
}

impl Part {
    pub fn new(name: Option<String>) -> Self {
        Part {
            name,
            ..Default::default()
        }
    }

    /// Number of sounding pitches, counting each chord member
    pub fn pitch_count(&self) -> usize {
        self.items
            .iter()
            .map(|item| match item {
                SourceItem::Note { .. } => 1,
                SourceItem::Chord { pitches, .. } => pitches.len(),
                SourceItem::Rest { .. } => 0,
            })
            .sum()
    }
}

/// Beat and downbeat onsets exactly as the parser resolved them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeGrid {
    pub beats: Vec<f64>,
    pub downbeats: Vec<f64>,
}

/// A parsed score or performance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub format: SourceFormat,
    pub time_base: TimeBase,
    pub metadata: Metadata,
    pub parts: Vec<Part>,
    /// Absolute-time grid, when the format has one
    pub grid: Option<TimeGrid>,
}

impl Score {
    pub fn new(format: SourceFormat, time_base: TimeBase) -> Self {
        Score {
            format,
            time_base,
            metadata: Metadata::default(),
            parts: Vec::new(),
            grid: None,
        }
    }

    /// Earliest onset of any sounding item
    pub fn first_onset(&self) -> Option<f64> {
        self.parts
            .iter()
            .flat_map(|part| part.items.iter())
            .filter(|item| !item.is_rest())
            .map(|item| item.timing().onset)
            .fold(None, |acc: Option<f64>, onset| {
                Some(acc.map_or(onset, |a| a.min(onset)))
            })
    }
}
