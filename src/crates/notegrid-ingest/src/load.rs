use notegrid_core::{Score, SourceFormat};
use std::path::Path;

use crate::error::{IngestError, Result};
use crate::midi::read_midi;
use crate::musicxml::read_musicxml;

/// Extensions recognized for each source format, lowercase
pub const MIDI_EXTENSIONS: &[&str] = &["mid", "midi"];
pub const MUSICXML_EXTENSIONS: &[&str] = &["musicxml", "xml", "mxl"];

/// Source format implied by a file extension, ignoring case
pub fn detect_format(path: &Path) -> Option<SourceFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if MIDI_EXTENSIONS.contains(&ext.as_str()) {
        Some(SourceFormat::Midi)
    } else if MUSICXML_EXTENSIONS.contains(&ext.as_str()) {
        Some(SourceFormat::MusicXml)
    } else {
        None
    }
}

/// Read a MIDI or MusicXML file into a score, choosing the reader by extension
pub fn load(path: &Path) -> Result<Score> {
    let format =
        detect_format(path).ok_or_else(|| IngestError::UnknownFormat(path.to_path_buf()))?;
    log::debug!("loading {} as {}", path.display(), format);

    let score = match format {
        SourceFormat::Midi => read_midi(path)?,
        SourceFormat::MusicXml => read_musicxml(path)?,
    };

    log::info!(
        "parsed {} part(s), {} pitched item(s) from {}",
        score.parts.len(),
        score.parts.iter().map(|p| p.pitch_count()).sum::<usize>(),
        path.display()
    );
    Ok(score)
}
