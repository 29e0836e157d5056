//! MusicXML reader
//!
//! Walks `<score-partwise>` documents with roxmltree. Onsets and durations
//! are in quarter notes from the start of the part, and every item keeps
//! the measure number and beat it was written at. There is no absolute
//! time grid for this format.

use notegrid_core::pitch::{spelled_name, spelled_number};
use notegrid_core::{
    Metadata, NativePosition, Part, Score, SourceFormat, SourceItem, SourcePitch, TimeBase,
    Timing,
};
use roxmltree::{Document, Node, ParsingOptions};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{IngestError, Result};
use crate::instruments::is_drum_part_name;

const DRUM_MIDI_CHANNEL: u32 = 10;

/// Written octaves that can land on a MIDI note
const OCTAVE_RANGE: std::ops::RangeInclusive<i32> = -1..=9;

/// Semitone alterations from double flat to double sharp
const ALTER_RANGE: std::ops::RangeInclusive<f64> = -2.0..=2.0;

pub fn read_musicxml(path: &Path) -> Result<Score> {
    let is_compressed = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("mxl"));
    if is_compressed {
        return Err(IngestError::Unsupported(
            "compressed MusicXML (.mxl); export uncompressed .musicxml instead".to_string(),
        ));
    }

    let xml = std::fs::read_to_string(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_musicxml(&xml)
}

/// Parse an uncompressed partwise MusicXML document
pub fn parse_musicxml(xml: &str) -> Result<Score> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options)?;
    let root = doc.root_element();

    match root.tag_name().name() {
        "score-partwise" => {}
        "score-timewise" => {
            return Err(IngestError::Unsupported(
                "score-timewise MusicXML (use score-partwise instead)".to_string(),
            ))
        }
        other => return Err(IngestError::invalid_value("root element", other)),
    }

    let part_info = child(root, "part-list")
        .map(parse_part_list)
        .ok_or_else(|| IngestError::MissingElement("part-list".to_string()))?;

    let mut score = Score::new(SourceFormat::MusicXml, TimeBase::QuarterNotes);
    score.metadata = parse_metadata(root);

    for part_node in children(root, "part") {
        let id = part_node
            .attribute("id")
            .ok_or_else(|| IngestError::MissingElement("part id attribute".to_string()))?;
        let info = part_info.get(id).cloned().unwrap_or_default();
        score.parts.push(parse_part(part_node, &info)?);
    }

    Ok(score)
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| n.has_tag_name(name))
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn parse_number<T: std::str::FromStr>(element: &str, text: &str) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| IngestError::invalid_value(element, text))
}

fn parse_metadata(root: Node) -> Metadata {
    let title = child(root, "work")
        .and_then(|work| child_text(work, "work-title"))
        .or_else(|| child_text(root, "movement-title"))
        .map(str::to_string);

    let composer = child(root, "identification").and_then(|ident| {
        children(ident, "creator")
            .find(|c| c.attribute("type") == Some("composer"))
            .and_then(|c| c.text())
            .map(|t| t.trim().to_string())
    });

    Metadata { title, composer }
}

/// What `<part-list>` says about one part
#[derive(Debug, Clone, Default)]
struct PartInfo {
    name: Option<String>,
    /// Instrument names by id, in document order
    instruments: Vec<(String, String)>,
    /// Zero-based unpitched MIDI keys by instrument id
    unpitched_keys: HashMap<String, u8>,
    /// MIDI channel of the first `<midi-instrument>`
    midi_channel: Option<u32>,
}

impl PartInfo {
    fn instrument_name(&self, id: Option<&str>) -> Option<&str> {
        match id {
            Some(id) => self
                .instruments
                .iter()
                .find(|(inst_id, _)| inst_id == id)
                .map(|(_, name)| name.as_str()),
            None => self.instruments.first().map(|(_, name)| name.as_str()),
        }
    }

    fn unpitched_key(&self, id: Option<&str>) -> Option<u8> {
        let id = match id {
            Some(id) => id,
            None => self.instruments.first().map(|(id, _)| id.as_str())?,
        };
        self.unpitched_keys.get(id).copied()
    }
}

fn parse_part_list(part_list: Node) -> HashMap<String, PartInfo> {
    let mut parts = HashMap::new();

    for score_part in children(part_list, "score-part") {
        let Some(id) = score_part.attribute("id") else {
            continue;
        };

        let mut info = PartInfo {
            name: child_text(score_part, "part-name").map(str::to_string),
            ..PartInfo::default()
        };

        for instrument in children(score_part, "score-instrument") {
            if let (Some(inst_id), Some(name)) = (
                instrument.attribute("id"),
                child_text(instrument, "instrument-name"),
            ) {
                info.instruments.push((inst_id.to_string(), name.to_string()));
            }
        }

        for midi in children(score_part, "midi-instrument") {
            if info.midi_channel.is_none() {
                info.midi_channel = child_text(midi, "midi-channel").and_then(|t| t.parse().ok());
            }
            let key = child_text(midi, "midi-unpitched")
                .and_then(|t| t.parse::<u8>().ok())
                .and_then(|k| k.checked_sub(1));
            if let (Some(inst_id), Some(key)) = (midi.attribute("id"), key) {
                info.unpitched_keys.insert(inst_id.to_string(), key);
            }
        }

        parts.insert(id.to_string(), info);
    }

    parts
}

/// Time signature in effect
#[derive(Debug, Clone, Copy, PartialEq)]
struct Meter {
    beats: u32,
    beat_type: u32,
}

impl Default for Meter {
    fn default() -> Self {
        Meter {
            beats: 4,
            beat_type: 4,
        }
    }
}

impl Meter {
    /// Beat length in quarter notes; compound meters beat in dotted units
    fn beat_length(&self) -> f64 {
        let unit = 4.0 / self.beat_type as f64;
        if self.beats > 3 && self.beats % 3 == 0 && self.beat_type >= 8 {
            unit * 3.0
        } else {
            unit
        }
    }

    fn measure_length(&self) -> f64 {
        self.beats as f64 * 4.0 / self.beat_type as f64
    }
}

/// Running state while walking one part
struct PartState<'p> {
    info: &'p PartInfo,
    part: Part,
    divisions: f64,
    meter: Meter,
    measure_start: f64,
    measure_ordinal: usize,
    /// Velocity from the last `<sound dynamics>` direction
    dynamics_velocity: Option<u8>,
}

fn parse_part(part_node: Node, info: &PartInfo) -> Result<Part> {
    let mut state = PartState {
        info,
        part: Part::new(info.name.clone()),
        divisions: 1.0,
        meter: Meter::default(),
        measure_start: 0.0,
        measure_ordinal: 0,
        dynamics_velocity: None,
    };

    state.part.instrument = info.instrument_name(None).map(str::to_string);
    state.part.is_drum = match info.midi_channel {
        Some(channel) => channel == DRUM_MIDI_CHANNEL,
        None => info.name.as_deref().map_or(false, is_drum_part_name),
    };

    for measure in children(part_node, "measure") {
        parse_measure(measure, &mut state)?;
    }

    Ok(state.part)
}

fn parse_measure(measure: Node, state: &mut PartState) -> Result<()> {
    state.measure_ordinal += 1;
    let measure_number = measure
        .attribute("number")
        .and_then(leading_integer)
        .unwrap_or(state.measure_ordinal);

    let mut cursor = 0.0f64;
    let mut furthest = 0.0f64;
    let mut last_onset = 0.0f64;
    // Item a following <chord/> note joins
    let mut open_item: Option<usize> = None;

    for node in measure.children().filter(|n| n.is_element()) {
        match node.tag_name().name() {
            "attributes" => parse_attributes(node, state)?,
            "direction" => {
                if let Some(dynamics) = node
                    .descendants()
                    .find(|n| n.has_tag_name("sound"))
                    .and_then(|sound| sound.attribute("dynamics"))
                {
                    state.dynamics_velocity = Some(dynamics_to_velocity(parse_number("sound dynamics", dynamics)?));
                }
            }
            "backup" => {
                cursor = (cursor - duration_of(node, state.divisions)?).max(0.0);
            }
            "forward" => {
                cursor += duration_of(node, state.divisions)?;
                furthest = furthest.max(cursor);
            }
            "note" => {
                if has_child(node, "grace") || has_child(node, "cue") {
                    continue;
                }

                let duration = duration_of(node, state.divisions)?;
                let is_chord = has_child(node, "chord");
                let onset_in_measure = if is_chord { last_onset } else { cursor };
                if !is_chord {
                    last_onset = cursor;
                    cursor += duration;
                    furthest = furthest.max(cursor);
                }

                let timing = Timing::new(state.measure_start + onset_in_measure, duration).with_native(
                    NativePosition {
                        measure_number,
                        offset: onset_in_measure,
                        beat: onset_in_measure / state.meter.beat_length() + 1.0,
                    },
                );

                if has_child(node, "rest") {
                    state.part.items.push(SourceItem::Rest { timing });
                    open_item = None;
                    continue;
                }

                let pitch = parse_pitch(node, state)?;
                let velocity = match node.attribute("dynamics") {
                    Some(d) => Some(dynamics_to_velocity(parse_number("note dynamics", d)?)),
                    None => state.dynamics_velocity,
                };

                let joined = match open_item {
                    Some(idx) if is_chord => join_chord(&mut state.part.items[idx], pitch.clone()),
                    _ => false,
                };
                if !joined {
                    state.part.items.push(SourceItem::Note {
                        pitch,
                        timing,
                        velocity,
                    });
                    open_item = Some(state.part.items.len() - 1);
                }
            }
            _ => {}
        }
    }

    if furthest == 0.0 {
        furthest = state.meter.measure_length();
    }
    state.measure_start += furthest;
    Ok(())
}

/// Add a pitch to the note or chord it sounds with
fn join_chord(item: &mut SourceItem, pitch: SourcePitch) -> bool {
    match item {
        SourceItem::Chord { pitches, .. } => {
            pitches.push(pitch);
            true
        }
        SourceItem::Note {
            pitch: first,
            timing,
            velocity,
        } => {
            *item = SourceItem::Chord {
                pitches: vec![first.clone(), pitch],
                timing: *timing,
                velocity: *velocity,
            };
            true
        }
        SourceItem::Rest { .. } => false,
    }
}

fn parse_attributes(node: Node, state: &mut PartState) -> Result<()> {
    if let Some(text) = child_text(node, "divisions") {
        let divisions: f64 = parse_number("divisions", text)?;
        if !divisions.is_finite() || divisions <= 0.0 {
            return Err(IngestError::invalid_value("divisions", text));
        }
        state.divisions = divisions;
    }

    if let Some(time) = child(node, "time") {
        if let (Some(beats), Some(beat_type)) =
            (child_text(time, "beats"), child_text(time, "beat-type"))
        {
            // Composite numerators such as "3+2" add up
            let beats = beats
                .split('+')
                .map(|part| parse_number::<u32>("beats", part))
                .sum::<Result<u32>>()?;
            let beat_type: u32 = parse_number("beat-type", beat_type)?;
            if beats == 0 || beat_type == 0 {
                return Err(IngestError::invalid_value("time", format!("{}/{}", beats, beat_type)));
            }
            state.meter = Meter { beats, beat_type };
        }
    }

    let percussion_clef = children(node, "clef")
        .any(|clef| child_text(clef, "sign") == Some("percussion"));
    if percussion_clef {
        state.part.is_drum = true;
    }

    Ok(())
}

fn parse_pitch(note: Node, state: &mut PartState) -> Result<SourcePitch> {
    if let Some(pitch) = child(note, "pitch") {
        let step = child_text(pitch, "step")
            .and_then(|s| s.chars().next())
            .ok_or_else(|| IngestError::MissingElement("step".to_string()))?;
        let alter = match child_text(pitch, "alter") {
            Some(text) => {
                let alter: f64 = parse_number("alter", text)?;
                if !ALTER_RANGE.contains(&alter) {
                    return Err(IngestError::invalid_value("alter", text));
                }
                alter.round() as i32
            }
            None => 0,
        };
        let octave_text = child_text(pitch, "octave")
            .ok_or_else(|| IngestError::MissingElement("octave".to_string()))?;
        let octave: i32 = parse_number("octave", octave_text)?;
        if !OCTAVE_RANGE.contains(&octave) {
            return Err(IngestError::invalid_value("octave", octave_text));
        }

        return Ok(SourcePitch::new(
            spelled_number(step, alter, octave),
            Some(spelled_name(step, alter, octave)),
        ));
    }

    if has_child(note, "unpitched") {
        state.part.is_drum = true;
        let instrument = child(note, "instrument").and_then(|n| n.attribute("id"));
        let name = state
            .info
            .instrument_name(instrument)
            .unwrap_or("Unpitched")
            .to_string();
        return Ok(SourcePitch::new(state.info.unpitched_key(instrument), Some(name)));
    }

    Err(IngestError::MissingElement("pitch".to_string()))
}

fn has_child(node: Node, name: &str) -> bool {
    child(node, name).is_some()
}

/// `<duration>` in quarter notes
fn duration_of(node: Node, divisions: f64) -> Result<f64> {
    let text = child_text(node, "duration")
        .ok_or_else(|| IngestError::MissingElement("duration".to_string()))?;
    let duration: f64 = parse_number("duration", text)?;
    if !duration.is_finite() || duration < 0.0 {
        return Err(IngestError::invalid_value("duration", text));
    }
    Ok(duration / divisions)
}

/// MusicXML dynamics are a percentage of velocity 90
fn dynamics_to_velocity(dynamics: f64) -> u8 {
    (dynamics / 100.0 * 90.0).round().clamp(0.0, 127.0) as u8
}

fn leading_integer(text: &str) -> Option<usize> {
    let digits: String = text.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
