//! Event normalization: source items to canonical note events

use crate::event::{EventKind, NoteEvent};
use crate::pitch::PitchDecomposition;
use crate::score::{Part, Score, SourceFormat, SourceItem, SourcePitch, Timing};

/// Flatten every part of a score into one event per sounding pitch.
///
/// Parts keep their order, items keep their encounter order, and a chord
/// of n pitches expands to n events sharing its timing. Rests are dropped.
pub fn normalize(score: &Score) -> Vec<NoteEvent> {
    let mut events = Vec::new();

    for (part_index, part) in score.parts.iter().enumerate() {
        let before = events.len();

        for item in &part.items {
            match item {
                SourceItem::Note {
                    pitch,
                    timing,
                    velocity,
                } => events.push(make_event(
                    score.format,
                    part_index,
                    part,
                    EventKind::Note,
                    pitch,
                    timing,
                    *velocity,
                )),
                SourceItem::Chord {
                    pitches,
                    timing,
                    velocity,
                } => events.extend(pitches.iter().map(|pitch| {
                    make_event(
                        score.format,
                        part_index,
                        part,
                        EventKind::ChordPitch,
                        pitch,
                        timing,
                        *velocity,
                    )
                })),
                SourceItem::Rest { .. } => {}
            }
        }

        log::debug!(
            "part {} ({}): {} note events",
            part_index,
            part.name.as_deref().unwrap_or("unnamed"),
            events.len() - before
        );
    }

    events
}

fn make_event(
    format: SourceFormat,
    part_index: usize,
    part: &Part,
    kind: EventKind,
    pitch: &SourcePitch,
    timing: &Timing,
    velocity: Option<u8>,
) -> NoteEvent {
    let label = match format {
        SourceFormat::Midi => part.instrument.clone(),
        SourceFormat::MusicXml => Some(kind.label().to_string()),
    };

    NoteEvent {
        part_index,
        part_name: part.name.clone(),
        label,
        kind,
        is_drum: part.is_drum,
        pitch: pitch.number,
        pitch_name: pitch.name.clone(),
        decomposition: PitchDecomposition::of(pitch.name.as_deref()),
        onset: timing.onset,
        duration: timing.duration,
        velocity,
        native: timing.native,
    }
}
