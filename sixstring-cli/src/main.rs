//! # sixstring - terminal guitar tuner
//!
//! Thin frontend over `sixstring-core`: the analysis pipeline runs on a
//! dedicated worker thread and streams one [`TuningResult`] per cycle
//! back over a channel, so the blocking device read never stalls the
//! terminal. Preset switches typed on stdin reach the pipeline through
//! its command queue.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use crossbeam_channel::{Sender, unbounded};
use crossterm::style::Stylize;
use sixstring_core::audio::{CpalSource, DeviceError};
use sixstring_core::pipeline::{Pipeline, PipelineCommand};
use sixstring_core::tuning::{self, TuningTable};
use sixstring_core::{TuningResult, Verdict};

#[derive(Parser)]
#[command(name = "sixstring", about = "Real-time guitar tuner for the terminal")]
struct Args {
    /// Built-in tuning preset to start with.
    #[arg(long, value_enum, default_value_t = Preset::Standard)]
    tuning: Preset,

    /// Load a custom tuning table from a JSON file instead.
    #[arg(long, conflicts_with = "tuning")]
    tuning_file: Option<PathBuf>,

    /// List the built-in tuning presets and exit.
    #[arg(long)]
    list_tunings: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Standard,
    DropD,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_tunings {
        for table in tuning::presets() {
            let notes: Vec<String> = table
                .notes()
                .iter()
                .map(|note| format!("{} {:.2}", note.name, note.frequency))
                .collect();
            println!("{}: {}", table.name(), notes.join(", "));
        }
        return Ok(());
    }

    let table = match &args.tuning_file {
        Some(path) => load_tuning_file(path)?,
        None => match args.tuning {
            Preset::Standard => tuning::STANDARD.clone(),
            Preset::DropD => tuning::DROP_D.clone(),
        },
    };

    println!(
        "Tuning against {}. Play a string; type a preset name to switch, `quit` to exit.",
        table.name()
    );

    let (result_tx, result_rx) = unbounded::<TuningResult>();
    let (command_tx, command_rx) = unbounded::<PipelineCommand>();

    // The capture stream must be opened on the thread that uses it.
    let worker = thread::spawn(move || -> Result<(), DeviceError> {
        let source = CpalSource::open()?;
        Pipeline::new(source, table).run(result_tx, command_rx)
    });

    spawn_stdin_reader(command_tx);

    for result in result_rx.iter() {
        print_result(&result);
    }

    // The result channel closed: either a clean stop or a device failure.
    match worker.join() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(err).context("audio pipeline terminated"),
        Err(_) => anyhow::bail!("audio worker thread panicked"),
    }
}

fn load_tuning_file(path: &Path) -> anyhow::Result<TuningTable> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading tuning file {}", path.display()))?;
    let table: TuningTable = serde_json::from_str(&raw)
        .with_context(|| format!("parsing tuning file {}", path.display()))?;
    anyhow::ensure!(
        !table.notes().is_empty(),
        "tuning file {} contains no notes",
        path.display()
    );
    Ok(table)
}

/// Forwards stdin lines to the pipeline: preset names switch the tuning,
/// `quit` (or end of input) stops it.
fn spawn_stdin_reader(commands: Sender<PipelineCommand>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("q") {
                break;
            }
            match tuning::preset(line) {
                Some(table) => {
                    let _ = commands.send(PipelineCommand::SetTuning(table.clone()));
                }
                None => eprintln!("unknown tuning: {line} (try `standard` or `drop d`)"),
            }
        }
        let _ = commands.send(PipelineCommand::Stop);
    });
}

fn print_result(result: &TuningResult) {
    // Same color scheme as the classic tuner bar: green in tune, blue
    // flat, red sharp.
    let verdict = result.verdict.to_string();
    let verdict = match result.verdict {
        Verdict::InTune => verdict.green(),
        Verdict::Flat => verdict.blue(),
        Verdict::Sharp => verdict.red(),
    };
    println!(
        "{:<3} {:+8.2} Hz  {} [{}]",
        result.note, result.difference, verdict, result.progress
    );
}
