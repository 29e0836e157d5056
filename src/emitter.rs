//! Tabular output
//!
//! Every row has the same columns for a given source format. Absent values
//! become empty cells.

use notegrid_core::{AlignedNoteEvent, SourceFormat};
use notegrid_ingest::gm_drum_name;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::error::{PipelineError, Result};

pub const MIDI_COLUMNS: [&str; 15] = [
    "track_index",
    "track_name",
    "instrument",
    "is_drum",
    "drum_name",
    "pitch",
    "pitch_name",
    "pitch_class",
    "octave",
    "velocity",
    "start",
    "end",
    "duration",
    "measure",
    "beat",
];

pub const MUSICXML_COLUMNS: [&str; 15] = [
    "part_index",
    "part_name",
    "type",
    "pitch",
    "pitch_name",
    "pitch_class",
    "octave",
    "velocity",
    "onset",
    "offset",
    "duration",
    "end",
    "measure",
    "beat",
    "beat_position",
];

/// One MIDI note, times in seconds
#[derive(Debug, Serialize)]
struct MidiRow<'a> {
    track_index: usize,
    track_name: Option<&'a str>,
    instrument: Option<&'a str>,
    is_drum: bool,
    drum_name: Option<&'static str>,
    pitch: Option<u8>,
    pitch_name: Option<&'a str>,
    pitch_class: Option<&'a str>,
    octave: Option<i32>,
    velocity: Option<u8>,
    start: f64,
    end: f64,
    duration: f64,
    measure: usize,
    beat: usize,
}

impl<'a> From<&'a AlignedNoteEvent> for MidiRow<'a> {
    fn from(aligned: &'a AlignedNoteEvent) -> Self {
        let e = &aligned.event;
        MidiRow {
            track_index: e.part_index,
            track_name: e.part_name.as_deref(),
            instrument: e.label.as_deref(),
            is_drum: e.is_drum,
            drum_name: e.pitch.filter(|_| e.is_drum).and_then(gm_drum_name),
            pitch: e.pitch,
            pitch_name: e.pitch_name.as_deref(),
            pitch_class: e.decomposition.letter.as_deref(),
            octave: e.decomposition.octave,
            velocity: e.velocity,
            start: e.onset,
            end: e.end(),
            duration: e.duration,
            measure: aligned.measure_index,
            beat: aligned.beat_index,
        }
    }
}

/// One MusicXML note or chord pitch, times in quarter notes
#[derive(Debug, Serialize)]
struct MusicXmlRow<'a> {
    part_index: usize,
    part_name: Option<&'a str>,
    #[serde(rename = "type")]
    kind: Option<&'a str>,
    pitch: Option<u8>,
    pitch_name: Option<&'a str>,
    pitch_class: Option<&'a str>,
    octave: Option<i32>,
    velocity: Option<u8>,
    onset: f64,
    offset: Option<f64>,
    duration: f64,
    end: f64,
    measure: usize,
    beat: usize,
    beat_position: Option<f64>,
}

impl<'a> From<&'a AlignedNoteEvent> for MusicXmlRow<'a> {
    fn from(aligned: &'a AlignedNoteEvent) -> Self {
        let e = &aligned.event;
        MusicXmlRow {
            part_index: e.part_index,
            part_name: e.part_name.as_deref(),
            kind: e.label.as_deref(),
            pitch: e.pitch,
            pitch_name: e.pitch_name.as_deref(),
            pitch_class: e.decomposition.letter.as_deref(),
            octave: e.decomposition.octave,
            velocity: e.velocity,
            onset: e.onset,
            offset: e.native.map(|n| n.offset),
            duration: e.duration,
            end: e.end(),
            measure: aligned.measure_index,
            beat: aligned.beat_index,
            beat_position: e.native.map(|n| n.beat),
        }
    }
}

/// Write the header and one row per event. Returns the row count.
pub fn write_table<W: Write>(
    events: &[AlignedNoteEvent],
    format: SourceFormat,
    writer: W,
) -> Result<usize> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    match format {
        SourceFormat::Midi => {
            csv.write_record(MIDI_COLUMNS)?;
            for event in events {
                csv.serialize(MidiRow::from(event))?;
            }
        }
        SourceFormat::MusicXml => {
            csv.write_record(MUSICXML_COLUMNS)?;
            for event in events {
                csv.serialize(MusicXmlRow::from(event))?;
            }
        }
    }

    csv.flush().map_err(csv::Error::from)?;
    Ok(events.len())
}

/// Save the table at `path`, creating its directory if needed
pub fn save_table(events: &[AlignedNoteEvent], format: SourceFormat, path: &Path) -> Result<usize> {
    let io_error = |source: std::io::Error| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let file = File::create(path).map_err(io_error)?;
    write_table(events, format, file)
}
