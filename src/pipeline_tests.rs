// End-to-end runs over temporary data directories

#[cfg(test)]
mod tests {
    use crate::config::{FormatChoice, PipelineConfig};
    use crate::error::PipelineError;
    use crate::pipeline::{align_score, describe_parts, run, RunOutcome};
    use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
    use notegrid_core::{
        Part, Score, SourceFormat, SourceItem, SourcePitch, TimeBase, TimeGrid, Timing as ItemTiming,
    };
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const TWO_PARTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Flute</part-name></score-part>
    <score-part id="P2"><part-name>Piano</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <attributes><divisions>1</divisions><time><beats>4</beats><beat-type>4</beat-type></time></attributes>
      <note><pitch><step>G</step><octave>5</octave></pitch><duration>4</duration></note>
    </measure>
  </part>
  <part id="P2">
    <measure number="1">
      <attributes><divisions>1</divisions><time><beats>4</beats><beat-type>4</beat-type></time></attributes>
      <note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration></note>
      <note><chord/><pitch><step>E</step><octave>4</octave></pitch><duration>4</duration></note>
      <note><chord/><pitch><step>G</step><octave>4</octave></pitch><duration>4</duration></note>
    </measure>
  </part>
</score-partwise>"#;

    const ONLY_RESTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<score-partwise version="3.1">
  <part-list><score-part id="P1"><part-name>Tacet</part-name></score-part></part-list>
  <part id="P1">
    <measure number="1">
      <attributes><divisions>1</divisions></attributes>
      <note><rest/><duration>4</duration></note>
    </measure>
  </part>
</score-partwise>"#;

    struct Project {
        dir: TempDir,
        config: PipelineConfig,
    }

    impl Project {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let config = PipelineConfig::from_root(dir.path());
            fs::create_dir_all(&config.input_dir).unwrap();
            Project { dir, config }
        }

        fn add(&self, name: &str, contents: &[u8]) {
            fs::write(self.config.input_dir.join(name), contents).unwrap();
        }
    }

    fn read_rows(path: &Path) -> (Vec<String>, Vec<csv::StringRecord>) {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let headers = reader.headers().unwrap().iter().map(str::to_string).collect();
        let rows = reader.records().map(|r| r.unwrap()).collect();
        (headers, rows)
    }

    fn column(headers: &[String], name: &str) -> usize {
        headers.iter().position(|h| h == name).unwrap()
    }

    #[test]
    fn test_chord_expansion_end_to_end() {
        let project = Project::new();
        project.add("duet.musicxml", TWO_PARTS.as_bytes());

        let outcome = run(&project.config).unwrap();
        let path = project.config.output_dir.join("duet_notes.csv");
        assert_eq!(outcome, RunOutcome::Written { path: path.clone(), rows: 4 });

        let (headers, rows) = read_rows(&path);
        assert_eq!(rows.len(), 4);

        let kind = column(&headers, "type");
        let kinds: Vec<&str> = rows.iter().map(|r| &r[kind]).collect();
        assert_eq!(kinds, vec!["single-note", "chord-note", "chord-note", "chord-note"]);

        let pitch_name = column(&headers, "pitch_name");
        let names: Vec<&str> = rows.iter().map(|r| &r[pitch_name]).collect();
        assert_eq!(names, vec!["G5", "C4", "E4", "G4"]);

        for name in ["onset", "measure", "beat", "duration"] {
            let idx = column(&headers, name);
            assert!(rows.iter().all(|r| r[idx] == rows[0][idx]), "{} differs", name);
        }
        assert_eq!(&rows[0][column(&headers, "measure")], "1");
        assert_eq!(&rows[0][column(&headers, "beat")], "1");
    }

    #[test]
    fn test_runs_are_byte_identical() {
        let project = Project::new();
        project.add("duet.xml", TWO_PARTS.as_bytes());

        run(&project.config).unwrap();
        let path = project.config.output_dir.join("duet_notes.csv");
        let first = fs::read(&path).unwrap();

        run(&project.config).unwrap();
        assert_eq!(fs::read(&path).unwrap(), first);
    }

    #[test]
    fn test_custom_output_filename() {
        let mut project = Project::new();
        project.add("duet.musicxml", TWO_PARTS.as_bytes());
        project.config.output_filename = Some("table.csv".to_string());

        run(&project.config).unwrap();
        assert!(project.config.output_dir.join("table.csv").exists());
    }

    #[test]
    fn test_no_input() {
        let project = Project::new();
        project.add("notes.txt", b"not music");

        assert!(matches!(run(&project.config), Err(PipelineError::NoInput { .. })));
        assert!(!project.config.output_dir.exists());
    }

    #[test]
    fn test_ambiguous_input() {
        let project = Project::new();
        project.add("a.musicxml", TWO_PARTS.as_bytes());
        project.add("b.musicxml", TWO_PARTS.as_bytes());

        match run(&project.config) {
            Err(PipelineError::AmbiguousInput { candidates, .. }) => assert_eq!(candidates.len(), 2),
            other => panic!("expected ambiguous input, got {:?}", other),
        }
    }

    #[test]
    fn test_format_choice_picks_one() {
        let mut project = Project::new();
        project.add("a.musicxml", TWO_PARTS.as_bytes());
        project.add("b.mid", &simple_midi());
        project.config.format = FormatChoice::Midi;

        let outcome = run(&project.config).unwrap();
        assert!(matches!(outcome, RunOutcome::Written { rows: 2, .. }));
    }

    #[test]
    fn test_empty_result_writes_nothing() {
        let project = Project::new();
        project.add("tacet.musicxml", ONLY_RESTS.as_bytes());

        assert_eq!(run(&project.config).unwrap(), RunOutcome::Empty);
        assert!(!project.config.output_dir.exists());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let project = Project::new();
        project.add("broken.mid", b"MThd garbage");

        assert!(matches!(run(&project.config), Err(PipelineError::Parse(_))));
    }

    fn note(channel: u8, key: u8, vel: u8) -> TrackEventKind<'static> {
        TrackEventKind::Midi {
            channel: channel.into(),
            message: MidiMessage::NoteOn {
                key: key.into(),
                vel: vel.into(),
            },
        }
    }

    fn ev(delta: u32, kind: TrackEventKind<'static>) -> TrackEvent<'static> {
        TrackEvent {
            delta: delta.into(),
            kind,
        }
    }

    /// C4 on the first downbeat, E4 on the second; 120 bpm, 4/4
    fn simple_midi() -> Vec<u8> {
        let smf = Smf {
            header: Header {
                format: Format::Parallel,
                timing: Timing::Metrical(480.into()),
            },
            tracks: vec![vec![
                ev(0, TrackEventKind::Meta(MetaMessage::TrackName(b"Piano"))),
                ev(0, note(0, 60, 100)),
                ev(480, note(0, 60, 0)),
                ev(1440, note(0, 64, 80)),
                ev(480, note(0, 64, 0)),
                ev(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
            ]],
        };
        let mut bytes = Vec::new();
        smf.write(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_midi_end_to_end() {
        let project = Project::new();
        project.add("song.mid", &simple_midi());

        run(&project.config).unwrap();
        let (headers, rows) = read_rows(&project.config.output_dir.join("song_notes.csv"));

        assert_eq!(headers[0], "track_index");
        assert_eq!(rows.len(), 2);
        let get = |row: usize, name: &str| rows[row][column(&headers, name)].to_string();

        assert_eq!(get(0, "track_name"), "Piano");
        assert_eq!(get(0, "instrument"), "Acoustic Grand Piano");
        assert_eq!(get(0, "is_drum"), "false");
        assert_eq!(get(0, "drum_name"), "");
        assert_eq!(get(0, "pitch_name"), "C4");
        assert_eq!(get(0, "pitch_class"), "C");
        assert_eq!(get(0, "octave"), "4");
        assert_eq!(get(0, "velocity"), "100");
        assert_eq!(get(0, "measure"), "1");
        assert_eq!(get(0, "beat"), "1");

        assert_eq!(get(1, "pitch_name"), "E4");
        assert_eq!(get(1, "measure"), "2");
        assert_eq!(get(1, "beat"), "5");
        assert!((get(1, "start").parse::<f64>().unwrap() - 2.0).abs() < 1e-9);
        assert!((get(1, "duration").parse::<f64>().unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_align_score_shares_chord_positions() {
        let mut score = Score::new(SourceFormat::Midi, TimeBase::Seconds);
        score.grid = Some(TimeGrid {
            beats: vec![0.0, 0.5, 1.0, 1.5, 2.0],
            downbeats: vec![0.0, 2.0],
        });

        let mut lead = Part::new(Some("Lead".to_string()));
        lead.items.push(SourceItem::Note {
            pitch: SourcePitch::new(Some(72), Some("C5".to_string())),
            timing: ItemTiming::new(2.0, 0.5),
            velocity: Some(90),
        });
        let mut pad = Part::new(Some("Pad".to_string()));
        pad.items.push(SourceItem::Chord {
            pitches: [60, 64, 67]
                .iter()
                .map(|&n| SourcePitch::new(Some(n), None))
                .collect(),
            timing: ItemTiming::new(2.0, 1.0),
            velocity: Some(70),
        });
        score.parts = vec![lead, pad];

        let aligned = align_score(&score);
        assert_eq!(aligned.len(), 4);
        assert!(aligned.iter().all(|a| a.measure_index == 2 && a.beat_index == 5));
        assert_eq!(aligned[0].event.part_index, 0);
        assert!(aligned[1..].iter().all(|a| a.event.part_index == 1));
    }

    #[test]
    fn test_describe_parts() {
        let mut score = Score::new(SourceFormat::Midi, TimeBase::Seconds);
        let mut bass = Part::new(Some("Bass".to_string()));
        bass.instrument = Some("Electric Bass (finger)".to_string());
        let mut flute = Part::new(Some("Flute".to_string()));
        flute.instrument = Some("Flute".to_string());
        score.parts = vec![bass, flute, Part::new(None)];

        assert_eq!(
            describe_parts(&score),
            vec![
                "Part 0: Bass (Electric Bass (finger))".to_string(),
                "Part 1: Flute".to_string(),
                "Part 2: (unnamed)".to_string(),
            ]
        );
    }
}
