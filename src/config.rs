use notegrid_ingest::load::{MIDI_EXTENSIONS, MUSICXML_EXTENSIONS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which source files count as input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FormatChoice {
    /// Any MIDI or MusicXML file
    #[default]
    Auto,
    Midi,
    #[value(name = "musicxml")]
    MusicXml,
}

impl FormatChoice {
    pub fn extensions(&self) -> Vec<&'static str> {
        match self {
            FormatChoice::Auto => MIDI_EXTENSIONS
                .iter()
                .chain(MUSICXML_EXTENSIONS)
                .copied()
                .collect(),
            FormatChoice::Midi => MIDI_EXTENSIONS.to_vec(),
            FormatChoice::MusicXml => MUSICXML_EXTENSIONS.to_vec(),
        }
    }
}

/// Where a run reads its source file and writes its table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Defaults to `<input stem>_notes.csv`
    pub output_filename: Option<String>,
    pub format: FormatChoice,
    /// Print the table to stdout instead of saving it
    pub write_stdout: bool,
}

impl PipelineConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        PipelineConfig {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            output_filename: None,
            format: FormatChoice::Auto,
            write_stdout: false,
        }
    }

    /// `data/raw` in, `data/processed` out, under a project root
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let data = root.as_ref().join("data");
        PipelineConfig::new(data.join("raw"), data.join("processed"))
    }

    pub fn output_path(&self, input: &Path) -> PathBuf {
        let filename = match &self.output_filename {
            Some(name) => name.clone(),
            None => default_output_filename(input),
        };
        self.output_dir.join(filename)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig::from_root(".")
    }
}

pub fn default_output_filename(input: &Path) -> String {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    format!("{}_notes.csv", stem)
}
