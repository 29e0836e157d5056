use log::{info, warn};
use notegrid_core::{align_events, build_grid, normalize, select_strategy, AlignedNoteEvent, Score};
use std::io;
use std::path::PathBuf;

use crate::config::PipelineConfig;
use crate::discovery::find_input;
use crate::emitter::{save_table, write_table};
use crate::error::Result;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Written { path: PathBuf, rows: usize },
    Printed { rows: usize },
    /// The input had no notes, so no table was produced
    Empty,
}

/// Grid, normalized events and metric positions for one parsed score
pub fn align_score(score: &Score) -> Vec<AlignedNoteEvent> {
    let grid = build_grid(score);
    let events = normalize(score);
    let strategy = select_strategy(grid, &events);
    align_events(events, strategy.as_ref())
}

/// One line per part: index, name and instrument when known
pub fn describe_parts(score: &Score) -> Vec<String> {
    score
        .parts
        .iter()
        .enumerate()
        .map(|(index, part)| {
            let name = part.name.as_deref().unwrap_or("(unnamed)");
            match &part.instrument {
                Some(instrument) if part.name.as_deref() != Some(instrument.as_str()) => {
                    format!("Part {}: {} ({})", index, name, instrument)
                }
                _ => format!("Part {}: {}", index, name),
            }
        })
        .collect()
}

/// Find the input, parse it, align every note and emit the table
pub fn run(config: &PipelineConfig) -> Result<RunOutcome> {
    let input = find_input(&config.input_dir, config.format)?;
    info!("Found input file: {}", input.display());

    let score = notegrid_ingest::load(&input)?;
    if let Some(title) = &score.metadata.title {
        info!("Title: {}", title);
    }
    if let Some(composer) = &score.metadata.composer {
        info!("Composer: {}", composer);
    }
    for line in describe_parts(&score) {
        info!("{}", line);
    }

    let aligned = align_score(&score);
    if aligned.is_empty() {
        warn!("No notes found in {}; nothing to save", input.display());
        return Ok(RunOutcome::Empty);
    }
    info!("Extracted {} note event(s)", aligned.len());

    if config.write_stdout {
        let rows = write_table(&aligned, score.format, io::stdout().lock())?;
        return Ok(RunOutcome::Printed { rows });
    }

    let path = config.output_path(&input);
    let rows = save_table(&aligned, score.format, &path)?;
    info!("Saved {} row(s) to {}", rows, path.display());

    Ok(RunOutcome::Written { path, rows })
}
