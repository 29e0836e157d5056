use serde::{Deserialize, Serialize};

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Letter class and octave split out of a pitch name.
///
/// A missing octave marks a non-tonal event such as a percussion slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchDecomposition {
    pub letter: Option<String>,
    pub octave: Option<i32>,
}

impl PitchDecomposition {
    pub fn of(name: Option<&str>) -> Self {
        name.map(decompose).unwrap_or_default()
    }
}

/// Split a pitch name such as `"C#4"` into `"C#"` and `4`.
///
/// Tokens without a trailing octave, or whose prefix is not a pitch class,
/// come back whole with no octave.
pub fn decompose(name: &str) -> PitchDecomposition {
    let token = name.trim();
    let whole = || PitchDecomposition {
        letter: Some(token.to_string()),
        octave: None,
    };

    let split = token.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if split == token.len() {
        return whole();
    }

    let (head, digits) = token.split_at(split);
    let (class, sign) = match head.strip_suffix('-') {
        Some(class) => (class, -1),
        None => (head, 1),
    };

    if !is_pitch_class(class) {
        return whole();
    }

    match digits.parse::<i32>() {
        Ok(octave) => PitchDecomposition {
            letter: Some(class.to_string()),
            octave: Some(sign * octave),
        },
        Err(_) => whole(),
    }
}

/// A note letter followed only by accidentals
fn is_pitch_class(class: &str) -> bool {
    let mut chars = class.chars();
    match chars.next() {
        Some(letter) if matches!(letter.to_ascii_uppercase(), 'A'..='G') => {
            chars.all(|c| matches!(c, '#' | 'b' | 'x' | '♯' | '♭'))
        }
        _ => false,
    }
}

/// Convert a MIDI note number to a name with sharps (e.g. `60` → `"C4"`)
pub fn note_number_to_name(note_num: u8) -> String {
    let note_name = NOTE_NAMES[(note_num % 12) as usize];
    let octave = (note_num / 12) as i32 - 1;

    format!("{}{}", note_name, octave)
}

fn step_semitone(step: char) -> Option<i32> {
    match step.to_ascii_uppercase() {
        'C' => Some(0),
        'D' => Some(2),
        'E' => Some(4),
        'F' => Some(5),
        'G' => Some(7),
        'A' => Some(9),
        'B' => Some(11),
        _ => None,
    }
}

/// Name of a written pitch, flats spelled `b` (e.g. `('B', -1, 3)` → `"Bb3"`)
pub fn spelled_name(step: char, alter: i32, octave: i32) -> String {
    let accidental = if alter >= 0 {
        "#".repeat(alter as usize)
    } else {
        "b".repeat(alter.unsigned_abs() as usize)
    };
    format!("{}{}{}", step.to_ascii_uppercase(), accidental, octave)
}

/// MIDI number of a written pitch, `None` when outside 0..=127
pub fn spelled_number(step: char, alter: i32, octave: i32) -> Option<u8> {
    let base = step_semitone(step)?;
    let number = octave
        .checked_add(1)?
        .checked_mul(12)?
        .checked_add(base)?
        .checked_add(alter)?;
    u8::try_from(number).ok().filter(|n| *n <= 127)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_conversion() {
        assert_eq!(note_number_to_name(60), "C4"); // Middle C
        assert_eq!(note_number_to_name(69), "A4"); // A440
        assert_eq!(note_number_to_name(61), "C#4");
        assert_eq!(note_number_to_name(0), "C-1");
        assert_eq!(note_number_to_name(127), "G9");
    }

    #[test]
    fn test_decompose_sharp() {
        let d = decompose("C#4");
        assert_eq!(d.letter.as_deref(), Some("C#"));
        assert_eq!(d.octave, Some(4));
    }

    #[test]
    fn test_decompose_negative_octave() {
        let d = decompose("C-1");
        assert_eq!(d.letter.as_deref(), Some("C"));
        assert_eq!(d.octave, Some(-1));
    }

    #[test]
    fn test_decompose_without_octave() {
        let d = decompose("Snare");
        assert_eq!(d.letter.as_deref(), Some("Snare"));
        assert_eq!(d.octave, None);

        let d = decompose("F#");
        assert_eq!(d.letter.as_deref(), Some("F#"));
        assert_eq!(d.octave, None);
    }

    #[test]
    fn test_decompose_non_pitch_with_digit() {
        let d = decompose("Tom 2");
        assert_eq!(d.letter.as_deref(), Some("Tom 2"));
        assert_eq!(d.octave, None);

        let d = decompose("42");
        assert_eq!(d.letter.as_deref(), Some("42"));
        assert_eq!(d.octave, None);
    }

    #[test]
    fn test_decompose_absent_name() {
        assert_eq!(PitchDecomposition::of(None), PitchDecomposition::default());
        assert_eq!(PitchDecomposition::of(Some("Bb3")).octave, Some(3));
    }

    #[test]
    fn test_spelled_pitches() {
        assert_eq!(spelled_name('B', -1, 3), "Bb3");
        assert_eq!(spelled_name('f', 2, 5), "F##5");
        assert_eq!(spelled_number('C', 0, 4), Some(60));
        assert_eq!(spelled_number('B', -1, 3), Some(58));
        assert_eq!(spelled_number('C', -1, -1), None);
        assert_eq!(spelled_number('H', 0, 4), None);
        assert_eq!(spelled_number('C', 0, i32::MAX), None);
        assert_eq!(spelled_number('B', i32::MAX, 4), None);
    }
}
