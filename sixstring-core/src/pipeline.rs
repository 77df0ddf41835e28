//! # Analysis Pipeline
//!
//! The read-estimate-evaluate worker loop, meant to run on a dedicated
//! thread. The frontend receives a [`TuningResult`] per cycle over a
//! channel and steers the pipeline with [`PipelineCommand`]s; the device
//! read is the only blocking operation in the loop, and commands are
//! drained between cycles, never concurrently with an update.

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::TuningResult;
use crate::audio::{AudioSource, BLOCK_SIZE, DeviceError, SAMPLE_RATE};
use crate::evaluator::TuningEvaluator;
use crate::pitch::PitchEstimator;
use crate::tuning::TuningTable;

/// Control messages accepted by a running pipeline.
#[derive(Debug, Clone)]
pub enum PipelineCommand {
    /// Swap the active tuning table. The estimate history is kept.
    SetTuning(TuningTable),
    /// Stop after the current cycle.
    Stop,
}

/// Composes an audio source, the estimator, and the evaluator into one
/// repeatable analysis cycle.
pub struct Pipeline<S> {
    source: S,
    estimator: PitchEstimator,
    evaluator: TuningEvaluator,
}

impl<S: AudioSource> Pipeline<S> {
    pub fn new(source: S, table: TuningTable) -> Self {
        Self {
            source,
            estimator: PitchEstimator::new(),
            evaluator: TuningEvaluator::new(table),
        }
    }

    /// Runs one read-estimate-evaluate sequence.
    ///
    /// A [`DeviceError`] from the source is fatal to the cycle and
    /// propagates to the caller; there is no retry path.
    pub fn cycle(&mut self) -> Result<TuningResult, DeviceError> {
        let block = self.source.read_block()?;
        let estimate = self.estimator.estimate(&block);
        Ok(self.evaluator.update(estimate))
    }

    /// Runs cycles until stopped, sending each result to `results`.
    ///
    /// Returns `Ok(())` on [`PipelineCommand::Stop`], when the command
    /// sender goes away, or when the result receiver hangs up; returns the
    /// device error unchanged if a read fails.
    pub fn run(
        mut self,
        results: Sender<TuningResult>,
        commands: Receiver<PipelineCommand>,
    ) -> Result<(), DeviceError> {
        log::info!(
            "pipeline started ({SAMPLE_RATE} Hz, {BLOCK_SIZE}-sample blocks, tuning {})",
            self.evaluator.tuning().name()
        );

        loop {
            loop {
                match commands.try_recv() {
                    Ok(PipelineCommand::SetTuning(table)) => {
                        log::info!("switching tuning to {}", table.name());
                        self.evaluator.set_tuning(table);
                    }
                    Ok(PipelineCommand::Stop) | Err(TryRecvError::Disconnected) => {
                        log::info!("pipeline stopped");
                        return Ok(());
                    }
                    Err(TryRecvError::Empty) => break,
                }
            }

            let result = self.cycle()?;
            if results.send(result).is_err() {
                log::info!("result receiver dropped, stopping pipeline");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Verdict;
    use crate::audio::SampleBlock;
    use crate::tuning::STANDARD;

    /// Source that serves a fixed number of sine blocks, then fails.
    struct ScriptedSource {
        freq: f32,
        blocks_left: usize,
    }

    impl ScriptedSource {
        fn new(freq: f32, blocks: usize) -> Self {
            Self {
                freq,
                blocks_left: blocks,
            }
        }
    }

    impl AudioSource for ScriptedSource {
        fn read_block(&mut self) -> Result<SampleBlock, DeviceError> {
            if self.blocks_left == 0 {
                return Err(DeviceError::Closed);
            }
            self.blocks_left -= 1;
            Ok((0..BLOCK_SIZE)
                .map(|i| {
                    let t = i as f32 / SAMPLE_RATE as f32;
                    ((2.0 * std::f32::consts::PI * self.freq * t).sin() * 12_000.0) as i16
                })
                .collect())
        }
    }

    #[test]
    fn cycle_produces_a_result_for_a_live_source() {
        let mut pipeline = Pipeline::new(ScriptedSource::new(110.0, 1), STANDARD.clone());
        let result = pipeline.cycle().unwrap();

        assert_eq!(result.note, "A2");
        // The raw estimate is bin-quantized, so the first cycle reads a
        // couple of Hz flat of the 110 Hz input.
        assert_eq!(result.verdict, Verdict::Flat);
    }

    #[test]
    fn cycle_propagates_device_errors() {
        let mut pipeline = Pipeline::new(ScriptedSource::new(110.0, 0), STANDARD.clone());
        let err = pipeline.cycle().unwrap_err();
        assert!(matches!(err, DeviceError::Closed));
    }

    #[test]
    fn run_surfaces_device_failure_unswallowed() {
        let pipeline = Pipeline::new(ScriptedSource::new(110.0, 2), STANDARD.clone());
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let (_command_tx, command_rx) = crossbeam_channel::unbounded();

        let err = pipeline.run(result_tx, command_rx).unwrap_err();
        assert!(matches!(err, DeviceError::Closed));
        // Both good blocks made it out before the failure.
        assert_eq!(result_rx.try_iter().count(), 2);
    }

    #[test]
    fn run_stops_on_command_without_touching_the_source() {
        let pipeline = Pipeline::new(ScriptedSource::new(110.0, 0), STANDARD.clone());
        let (result_tx, _result_rx) = crossbeam_channel::unbounded();
        let (command_tx, command_rx) = crossbeam_channel::unbounded();

        command_tx.send(PipelineCommand::Stop).unwrap();
        // The stop command is drained before the first read, so the
        // exhausted source is never hit.
        assert!(pipeline.run(result_tx, command_rx).is_ok());
    }

    #[test]
    fn run_stops_when_the_command_sender_goes_away() {
        let pipeline = Pipeline::new(ScriptedSource::new(110.0, 0), STANDARD.clone());
        let (result_tx, _result_rx) = crossbeam_channel::unbounded();
        let (command_tx, command_rx) = crossbeam_channel::unbounded::<PipelineCommand>();

        drop(command_tx);
        assert!(pipeline.run(result_tx, command_rx).is_ok());
    }

    #[test]
    fn set_tuning_command_is_applied_before_the_next_cycle() {
        // Start against a table whose only note cannot match the input,
        // then switch to standard tuning through the command queue.
        let decoy = TuningTable::new("Decoy", &[("X5", 500.0)]);
        let pipeline = Pipeline::new(ScriptedSource::new(110.0, 1), decoy);

        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        command_tx
            .send(PipelineCommand::SetTuning(STANDARD.clone()))
            .unwrap();

        // One block, then the source fails; the switch lands first.
        let err = pipeline.run(result_tx, command_rx).unwrap_err();
        assert!(matches!(err, DeviceError::Closed));
        let result = result_rx.recv().unwrap();
        assert_eq!(result.note, "A2");
    }
}
