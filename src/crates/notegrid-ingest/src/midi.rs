use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use notegrid_core::pitch::note_number_to_name;
use notegrid_core::{
    Metadata, Part, Score, SourceFormat, SourceItem, SourcePitch, TimeBase, TimeGrid,
    Timing as ItemTiming,
};
use std::collections::{HashMap, VecDeque};
use std::path::Path;

use crate::error::{IngestError, Result};
use crate::instruments::instrument_label;

/// Default tempo: 120 BPM = 500000 microseconds per beat
const DEFAULT_TEMPO: u32 = 500_000;

/// Channel 10 (index 9) is percussion
const DRUM_CHANNEL: u8 = 9;

/// Largest time signature denominator accepted, as a power of two (x/64)
const MAX_DENOMINATOR_POWER: u8 = 6;

/// Upper bound on generated beats; larger grids are dropped
const MAX_GRID_BEATS: u64 = 1_000_000;

pub fn read_midi(path: &Path) -> Result<Score> {
    let data = std::fs::read(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_midi(&data)
}

/// Parse a Standard MIDI File into a score timed in seconds
pub fn parse_midi(data: &[u8]) -> Result<Score> {
    let smf = Smf::parse(data)?;

    let meta = MetaEvents::collect(&smf);
    let clock = Clock::new(&smf, meta.tempos)?;
    let collected = collect_notes(&smf);

    let mut score = Score::new(SourceFormat::Midi, TimeBase::Seconds);
    score.metadata = Metadata {
        title: collected.conductor_name.clone(),
        composer: None,
    };
    score.parts = collected
        .instruments
        .iter()
        .map(|instrument| instrument.to_part(&collected.notes, &clock))
        .filter(|part| !part.items.is_empty())
        .collect();
    score.grid = clock.grid(&meta.signatures, collected.end_tick);

    Ok(score)
}

/// Tempo and time signature events gathered from every track
struct MetaEvents {
    tempos: Vec<(u64, u32)>,
    signatures: Vec<TimeSignature>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TimeSignature {
    tick: u64,
    numerator: u32,
    denominator: u32,
}

impl TimeSignature {
    const COMMON_TIME: TimeSignature = TimeSignature {
        tick: 0,
        numerator: 4,
        denominator: 4,
    };
}

impl MetaEvents {
    fn collect(smf: &Smf) -> Self {
        let mut tempos = Vec::new();
        let mut signatures = Vec::new();

        for track in &smf.tracks {
            let mut tick = 0u64;
            for event in track {
                tick += event.delta.as_int() as u64;
                match event.kind {
                    TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                        tempos.push((tick, tempo.as_int()));
                    }
                    TrackEventKind::Meta(MetaMessage::TimeSignature(num, den_pow, _, _)) => {
                        match 1u32.checked_shl(den_pow as u32) {
                            Some(denominator) if num > 0 && den_pow <= MAX_DENOMINATOR_POWER => {
                                signatures.push(TimeSignature {
                                    tick,
                                    numerator: num as u32,
                                    denominator,
                                });
                            }
                            _ => log::warn!(
                                "Ignoring invalid time signature {}/2^{} at tick {}",
                                num,
                                den_pow,
                                tick
                            ),
                        }
                    }
                    _ => {}
                }
            }
        }

        signatures.sort_by_key(|s| s.tick);
        if signatures.first().map_or(true, |s| s.tick > 0) {
            signatures.insert(0, TimeSignature::COMMON_TIME);
        }

        MetaEvents { tempos, signatures }
    }
}

/// A span of constant tempo starting at `tick`
#[derive(Debug, Clone, Copy)]
struct TempoSegment {
    tick: u64,
    seconds: f64,
    us_per_quarter: u32,
}

impl TempoSegment {
    fn seconds_at(&self, tick: f64, ticks_per_quarter: u32) -> f64 {
        let seconds_per_tick = (self.us_per_quarter as f64 / 1_000_000.0) / ticks_per_quarter as f64;
        self.seconds + (tick - self.tick as f64) * seconds_per_tick
    }
}

/// Piecewise-constant tempo over the whole file
#[derive(Debug, Clone)]
struct TempoMap {
    ticks_per_quarter: u32,
    segments: Vec<TempoSegment>,
}

impl TempoMap {
    fn new(mut changes: Vec<(u64, u32)>, ticks_per_quarter: u32) -> Self {
        changes.sort_by_key(|(tick, _)| *tick);

        let mut segments = Vec::new();
        let mut current = TempoSegment {
            tick: 0,
            seconds: 0.0,
            us_per_quarter: DEFAULT_TEMPO,
        };

        for (tick, us_per_quarter) in changes {
            if tick > current.tick {
                let seconds = current.seconds_at(tick as f64, ticks_per_quarter);
                segments.push(current);
                current = TempoSegment {
                    tick,
                    seconds,
                    us_per_quarter,
                };
            } else {
                // Later events at the same tick win
                current.us_per_quarter = us_per_quarter;
            }
        }
        segments.push(current);

        TempoMap {
            ticks_per_quarter,
            segments,
        }
    }

    fn seconds_at(&self, tick: f64) -> f64 {
        let idx = self
            .segments
            .partition_point(|s| s.tick as f64 <= tick)
            .saturating_sub(1);
        self.segments[idx].seconds_at(tick, self.ticks_per_quarter)
    }

    fn initial_bpm(&self) -> f64 {
        60_000_000.0 / self.segments[0].us_per_quarter as f64
    }
}

/// Tick to seconds conversion for either timing mode
enum Clock {
    Metrical(TempoMap),
    Timecode { ticks_per_second: f64 },
}

impl Clock {
    fn new(smf: &Smf, tempos: Vec<(u64, u32)>) -> Result<Self> {
        match smf.header.timing {
            Timing::Metrical(tpb) => {
                let ticks_per_quarter = tpb.as_int() as u32;
                if ticks_per_quarter == 0 {
                    return Err(IngestError::invalid_value("ticks per quarter note", "0"));
                }
                let tempo = TempoMap::new(tempos, ticks_per_quarter);
                log::debug!(
                    "metrical timing: {} ticks per quarter, {:.1} BPM at start",
                    ticks_per_quarter,
                    tempo.initial_bpm()
                );
                Ok(Clock::Metrical(tempo))
            }
            Timing::Timecode(fps, subframe) => {
                let ticks_per_second = fps.as_f32() as f64 * subframe as f64;
                if ticks_per_second <= 0.0 {
                    return Err(IngestError::invalid_value(
                        "timecode resolution",
                        subframe.to_string(),
                    ));
                }
                Ok(Clock::Timecode { ticks_per_second })
            }
        }
    }

    fn seconds(&self, tick: f64) -> f64 {
        match self {
            Clock::Metrical(tempo) => tempo.seconds_at(tick),
            Clock::Timecode { ticks_per_second } => tick / ticks_per_second,
        }
    }

    /// Beat and downbeat times; timecode files have no beat grid
    fn grid(&self, signatures: &[TimeSignature], end_tick: u64) -> Option<TimeGrid> {
        match self {
            Clock::Metrical(tempo) => {
                let (beats, downbeats) = beat_ticks(signatures, tempo.ticks_per_quarter, end_tick)?;
                Some(TimeGrid {
                    beats: beats.into_iter().map(|t| self.seconds(t)).collect(),
                    downbeats: downbeats.into_iter().map(|t| self.seconds(t)).collect(),
                })
            }
            Clock::Timecode { .. } => {
                log::debug!("timecode timing carries no beat grid");
                None
            }
        }
    }
}

/// Beat and downbeat positions in ticks.
///
/// The beat restarts at every time signature change; one beat spans
/// `4 / denominator` quarter notes and every `numerator`-th beat is a
/// downbeat. The last signature runs until `end_tick`.
///
/// Returns `None` when the grid would exceed `MAX_GRID_BEATS` beats.
fn beat_ticks(
    signatures: &[TimeSignature],
    ticks_per_quarter: u32,
    end_tick: u64,
) -> Option<(Vec<f64>, Vec<f64>)> {
    let segments: Vec<(&TimeSignature, f64, f64)> = signatures
        .iter()
        .enumerate()
        .map(|(i, sig)| {
            let stop = match signatures.get(i + 1) {
                Some(next) => next.tick,
                None => end_tick.max(sig.tick + 1),
            } as f64;
            let beat_len = ticks_per_quarter as f64 * 4.0 / sig.denominator as f64;
            (sig, stop, beat_len)
        })
        .collect();

    let total: f64 = segments
        .iter()
        .map(|(sig, stop, beat_len)| ((stop - sig.tick as f64) / beat_len).ceil().max(0.0))
        .sum();
    if total > MAX_GRID_BEATS as f64 {
        log::warn!(
            "Skipping beat grid: {} beats exceeds the limit of {}",
            total,
            MAX_GRID_BEATS
        );
        return None;
    }

    let mut beats = Vec::with_capacity(total as usize);
    let mut downbeats = Vec::new();

    for (sig, stop, beat_len) in segments {
        let mut k = 0u64;
        loop {
            let tick = sig.tick as f64 + k as f64 * beat_len;
            if tick >= stop {
                break;
            }
            beats.push(tick);
            if k % sig.numerator as u64 == 0 {
                downbeats.push(tick);
            }
            k += 1;
        }
    }

    Some((beats, downbeats))
}

/// Note between its note-on and note-off, in ticks
#[derive(Debug, Clone)]
struct RawNote {
    key: u8,
    velocity: u8,
    start: u64,
    end: Option<u64>,
}

/// Notes of one (track, channel, program) combination
#[derive(Debug, Clone)]
struct Instrument {
    channel: u8,
    program: u8,
    name: Option<String>,
    notes: Vec<usize>,
}

impl Instrument {
    fn to_part(&self, notes: &[RawNote], clock: &Clock) -> Part {
        let is_drum = self.channel == DRUM_CHANNEL;

        let mut part = Part::new(self.name.clone());
        part.program = Some(self.program);
        part.is_drum = is_drum;
        part.instrument = Some(instrument_label(Some(self.program), is_drum));
        part.items = self
            .notes
            .iter()
            .filter_map(|&idx| {
                let note = &notes[idx];
                let end = note.end?;
                let start_sec = clock.seconds(note.start as f64);
                let end_sec = clock.seconds(end as f64);
                Some(SourceItem::Note {
                    pitch: SourcePitch::new(Some(note.key), Some(note_number_to_name(note.key))),
                    timing: ItemTiming::new(start_sec, end_sec - start_sec),
                    velocity: Some(note.velocity),
                })
            })
            .collect();
        part
    }
}

struct CollectedNotes {
    instruments: Vec<Instrument>,
    notes: Vec<RawNote>,
    /// Name of a leading track without notes
    conductor_name: Option<String>,
    end_tick: u64,
}

fn collect_notes(smf: &Smf) -> CollectedNotes {
    let mut instruments: Vec<Instrument> = Vec::new();
    let mut notes: Vec<RawNote> = Vec::new();
    let mut conductor_name = None;
    let mut last_tick = 0u64;

    for (track_idx, track) in smf.tracks.iter().enumerate() {
        let first_instrument = instruments.len();
        let mut tick = 0u64;
        let mut programs = [0u8; 16];
        let mut slots: HashMap<(u8, u8), usize> = HashMap::new();
        let mut active: HashMap<(u8, u8), VecDeque<usize>> = HashMap::new();
        let mut track_name: Option<String> = None;

        for event in track {
            tick += event.delta.as_int() as u64;

            match event.kind {
                TrackEventKind::Midi { channel, message } => {
                    let ch = channel.as_int();
                    match message {
                        MidiMessage::ProgramChange { program } => {
                            programs[ch as usize] = program.as_int();
                        }
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            let program = programs[ch as usize];
                            let slot = *slots.entry((ch, program)).or_insert_with(|| {
                                instruments.push(Instrument {
                                    channel: ch,
                                    program,
                                    name: None,
                                    notes: Vec::new(),
                                });
                                instruments.len() - 1
                            });

                            notes.push(RawNote {
                                key: key.as_int(),
                                velocity: vel.as_int(),
                                start: tick,
                                end: None,
                            });
                            let idx = notes.len() - 1;
                            instruments[slot].notes.push(idx);
                            active.entry((ch, key.as_int())).or_default().push_back(idx);
                        }
                        // Note-on with velocity 0 = note-off
                        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                            if let Some(idx) = active
                                .get_mut(&(ch, key.as_int()))
                                .and_then(|open| open.pop_front())
                            {
                                notes[idx].end = Some(tick);
                            }
                        }
                        _ => {}
                    }
                }
                TrackEventKind::Meta(MetaMessage::TrackName(name)) if track_name.is_none() => {
                    track_name = clean_track_name(name);
                }
                _ => {}
            }
        }

        let dropped: usize = active.values().map(VecDeque::len).sum();
        if dropped > 0 {
            log::warn!(
                "Track {}: dropping {} notes that are never released",
                track_idx,
                dropped
            );
        }

        for instrument in &mut instruments[first_instrument..] {
            instrument.name = track_name.clone();
        }
        if track_idx == 0 && smf.tracks.len() > 1 && instruments.is_empty() {
            conductor_name = track_name;
        }
        last_tick = last_tick.max(tick);
    }

    let end_tick = notes
        .iter()
        .filter_map(|note| note.end)
        .max()
        .unwrap_or(last_tick);

    CollectedNotes {
        instruments,
        notes,
        conductor_name,
        end_tick,
    }
}

/// Trim null bytes and whitespace from a raw track name
fn clean_track_name(raw: &[u8]) -> Option<String> {
    let name = String::from_utf8_lossy(raw);
    let cleaned = name.trim_end_matches('\0').trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}
