use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

use notegrid::{run, FormatChoice, PipelineConfig, RunOutcome};

#[derive(Parser, Debug)]
#[command(name = "notegrid")]
#[command(about = "Normalize a MIDI or MusicXML file into a note table with measure and beat positions", long_about = None)]
struct Args {
    /// Project root holding data/raw and data/processed
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Directory to search for the single input file (default: <root>/data/raw)
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Directory to write the table to (default: <root>/data/processed)
    #[arg(short = 'd', long)]
    output_dir: Option<PathBuf>,

    /// Output file name (default: `<input-name>_notes.csv`)
    #[arg(short, long)]
    output: Option<String>,

    /// Which input files to consider
    #[arg(short, long, value_enum, default_value_t = FormatChoice::Auto)]
    format: FormatChoice,

    /// Print the table to stdout instead of saving it
    #[arg(long)]
    stdout: bool,

    /// Suppress informational messages (only warnings and errors)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show debug messages
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::from_root(&self.root);
        if let Some(dir) = &self.input_dir {
            config.input_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        config.output_filename = self.output.clone();
        config.format = self.format;
        config.write_stdout = self.stdout;
        config
    }

    fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Warn
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

fn main() {
    let args = Args::parse();

    // RUST_LOG takes precedence over the flags
    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    if let Err(e) = process(&args) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn process(args: &Args) -> Result<()> {
    let config = args.config();
    let outcome = run(&config)
        .with_context(|| format!("Failed to process {}", config.input_dir.display()))?;

    match outcome {
        RunOutcome::Written { path, rows } => {
            log::debug!("wrote {} rows to {}", rows, path.display())
        }
        RunOutcome::Printed { rows } => log::debug!("printed {} rows", rows),
        RunOutcome::Empty => log::info!("Nothing to write"),
    }

    Ok(())
}
