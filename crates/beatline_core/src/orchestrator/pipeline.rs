//! Audio pipeline: probe, reconcile, assemble and concatenate.
//!
//! Phases run strictly in order and each one takes the previous phase's
//! output by reference. Cancellation is checked at every phase boundary and
//! while ffmpeg runs.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::errors::{Phase, PipelineError, PipelineResult};
use super::types::{Context, RunOutput, Timeline};
use crate::concat::{ConcatError, ConcatInvoker};
use crate::config::Settings;
use crate::models::Script;
use crate::probe::{probe_all, DurationProbe, Ffprobe};
use crate::timeline::{assemble, reconcile, resolve_groups, TimelineError, TimelineResult};

/// Runs scripts through the reconciliation engine and ffmpeg.
pub struct AudioPipeline {
    settings: Settings,
    prober: Arc<dyn DurationProbe>,
    cancelled: Arc<AtomicBool>,
}

impl AudioPipeline {
    /// Pipeline probing with the configured ffprobe binary.
    pub fn new(settings: Settings) -> Self {
        let prober = Arc::new(Ffprobe::with_path(settings.probe.ffprobe_path.clone()));
        Self {
            settings,
            prober,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace the duration prober.
    pub fn with_prober(mut self, prober: Arc<dyn DurationProbe>) -> Self {
        self.prober = prober;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Handle that can cancel this pipeline from another thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancelled),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Reconcile a script into its timing table and concatenation plan.
    ///
    /// Pure with respect to the script: running it twice over unchanged
    /// media yields identical output. An empty script gives an empty plan.
    pub fn reconcile(&self, script: &Script) -> TimelineResult<Timeline> {
        self.build_timeline(script, |_| Ok(()), |_, e| e)
    }

    /// Render the context's script into one audio file.
    pub fn run(&self, ctx: &Context) -> PipelineResult<RunOutput> {
        let run = ctx.run_name.as_str();

        let timeline = self.build_timeline(
            &ctx.script,
            |phase| self.enter(ctx, phase),
            |phase, source| match phase {
                Phase::Validate => {
                    ctx.logger.error(&source.to_string());
                    PipelineError::ValidationFailed {
                        run_name: run.to_string(),
                        source,
                    }
                }
                phase => self.fail(ctx, phase, source),
            },
        )?;

        ctx.logger.info(&format!("{} beats", timeline.beats.len()));
        for group in timeline.groups.iter().filter(|g| g.len() > 1) {
            ctx.logger.info(&format!(
                "{:?} group: beats {}..={}",
                group.kind,
                group.first(),
                group.last()
            ));
        }
        let plan = &timeline.plan;
        ctx.logger.info(&format!(
            "{} inputs, {} silence slices, {:.3}s total",
            plan.inputs.len(),
            plan.silence_slices,
            plan.total_duration()
        ));

        self.enter(ctx, Phase::Concat)?;
        if plan.is_empty() {
            return Err(self.fail(ctx, Phase::Concat, TimelineError::EmptyTimeline));
        }
        self.prepare_output(ctx)?;

        let invoker = ConcatInvoker::new(self.settings.audio.clone(), self.settings.concat.clone())
            .with_logger(Arc::clone(&ctx.logger));
        let command = invoker.command(plan, &ctx.output_path);
        let audio_path = invoker
            .invoke(plan, &ctx.output_path, &self.cancel_handle())
            .map_err(|e| match e {
                ConcatError::Cancelled => {
                    ctx.logger.warn("Cancelled during concatenation");
                    PipelineError::cancelled(run)
                }
                e => self.fail(ctx, Phase::Concat, e),
            })?;

        ctx.report_progress("Done", 100, "Complete");
        ctx.logger
            .success(&format!("Wrote {}", audio_path.display()));
        tracing::info!("Run '{}' wrote {}", run, audio_path.display());

        Ok(RunOutput {
            timeline,
            audio_path,
            command,
        })
    }

    /// Validate, probe, group, reconcile and assemble.
    ///
    /// `enter` runs at each phase boundary and `fail` turns a phase error
    /// into the caller's error type.
    fn build_timeline<E>(
        &self,
        script: &Script,
        mut enter: impl FnMut(Phase) -> Result<(), E>,
        fail: impl Fn(Phase, TimelineError) -> E,
    ) -> Result<Timeline, E> {
        enter(Phase::Validate)?;
        let params = script.audio_params(self.settings.audio.params());
        script
            .validate()
            .and_then(|_| params.validate())
            .map_err(|e| fail(Phase::Validate, e))?;
        tracing::debug!("{} beats, {:?}", script.beats.len(), params);

        enter(Phase::Probe)?;
        let probes = probe_all(&script.beats, self.prober.as_ref(), self.settings.probe.workers)
            .map_err(|e| fail(Phase::Probe, e))?;

        enter(Phase::Group)?;
        let groups = resolve_groups(&script.beats, &probes);

        enter(Phase::Reconcile)?;
        let beats = reconcile(&script.beats, &probes, &groups, &params)
            .map_err(|e| fail(Phase::Reconcile, e))?;

        enter(Phase::Assemble)?;
        let plan = assemble(&script.beats, &beats).map_err(|e| fail(Phase::Assemble, e))?;

        Ok(Timeline {
            probes,
            groups,
            beats,
            plan,
        })
    }

    /// Create the output file's folder.
    fn prepare_output(&self, ctx: &Context) -> PipelineResult<()> {
        let parent = match ctx.output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => return Ok(()),
        };
        fs::create_dir_all(parent).map_err(|e| {
            let err = PipelineError::setup_failed(
                &ctx.run_name,
                format!("cannot create {}: {}", parent.display(), e),
            );
            ctx.logger.error(&err.to_string());
            err
        })
    }

    /// Phase boundary: check cancellation, then log and report the phase.
    fn enter(&self, ctx: &Context, phase: Phase) -> PipelineResult<()> {
        if self.is_cancelled() {
            ctx.logger.warn(&format!("Cancelled before {}", phase));
            return Err(PipelineError::cancelled(&ctx.run_name));
        }

        ctx.logger.phase(phase.name());
        ctx.report_progress(phase.name(), phase.progress(), "Starting");
        tracing::debug!("Run '{}' entering {}", ctx.run_name, phase);
        Ok(())
    }

    fn fail(
        &self,
        ctx: &Context,
        phase: Phase,
        source: impl Into<super::errors::PhaseError>,
    ) -> PipelineError {
        let err = PipelineError::phase_failed(&ctx.run_name, phase, source);
        ctx.logger.error(&err.to_string());
        err
    }
}

/// Handle for cancelling a pipeline or a single ffmpeg call.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Standalone handle not tied to a pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect at the next phase boundary or poll.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogConfig, RunLogger};
    use crate::models::{Beat, MediaSource};
    use crate::probe::{MediaInfo, ProbeError, ProbeResult};
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Durations keyed by source text.
    struct FakeProbe(HashMap<String, MediaInfo>);

    impl FakeProbe {
        fn new(entries: &[(&str, f64, bool)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(name, duration, has_audio)| {
                        (
                            name.to_string(),
                            MediaInfo {
                                duration: *duration,
                                has_audio: *has_audio,
                            },
                        )
                    })
                    .collect(),
            )
        }
    }

    impl DurationProbe for FakeProbe {
        fn probe(&self, source: &MediaSource) -> ProbeResult<MediaInfo> {
            self.0
                .get(&source.as_tool_arg())
                .copied()
                .ok_or_else(|| ProbeError::FileNotFound(source.as_tool_arg().into()))
        }
    }

    fn pipeline(entries: &[(&str, f64, bool)]) -> AudioPipeline {
        let mut settings = Settings::default();
        settings.audio.padding = 0.5;
        settings.audio.closing_padding = 1.0;
        settings.probe.workers = 2;
        AudioPipeline::new(settings).with_prober(Arc::new(FakeProbe::new(entries)))
    }

    fn context(script: Script) -> Context {
        let logger = Arc::new(RunLogger::detached("test_run", LogConfig::default()));
        Context::new(script, "test_run", "test_run.m4a", logger)
    }

    #[test]
    fn reconciles_audio_script() {
        crate::logging::init_test_tracing();
        let script = Script::new(vec![
            Beat::new().with_audio(MediaSource::path("a.mp3")),
            Beat::new().with_audio(MediaSource::path("b.mp3")),
            Beat::new().with_audio(MediaSource::path("c.mp3")),
        ]);
        let pipeline = pipeline(&[("a.mp3", 5.0, true), ("b.mp3", 3.0, true), ("c.mp3", 2.0, true)]);

        let timeline = pipeline.reconcile(&script).unwrap();
        let durations: Vec<f64> = timeline.beats.iter().map(|b| b.duration).collect();
        let starts: Vec<f64> = timeline.beats.iter().map(|b| b.start_at).collect();

        assert_eq!(durations, vec![5.5, 4.0, 2.0]);
        assert_eq!(starts, vec![0.0, 5.5, 9.5]);
        assert_eq!(timeline.plan.inputs.len(), 5);
        assert!((timeline.total_duration() - 11.5).abs() < 1e-9);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let script = Script::new(vec![
            Beat::new().with_movie(MediaSource::path("m.mp4")),
            Beat::new().with_voice_over(None).with_audio(MediaSource::path("v.mp3")),
            Beat::new(),
        ]);
        let pipeline = pipeline(&[("m.mp4", 10.0, true), ("v.mp3", 4.0, true)]);

        let first = pipeline.reconcile(&script).unwrap();
        let second = pipeline.reconcile(&script).unwrap();
        assert_eq!(first.beats, second.beats);
        assert_eq!(first.plan, second.plan);
    }

    #[test]
    fn probe_failure_aborts_with_beat_index() {
        let script = Script::new(vec![
            Beat::new().with_audio(MediaSource::path("a.mp3")),
            Beat::new().with_audio(MediaSource::path("missing.mp3")),
        ]);
        let pipeline = pipeline(&[("a.mp3", 5.0, true)]);

        let err = pipeline.reconcile(&script).unwrap_err();
        assert!(matches!(err, TimelineError::ProbeFailed { beat: 1, .. }));

        let err = pipeline.run(&context(script)).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Probe));
    }

    #[test]
    fn invalid_script_fails_validation() {
        let script = Script::new(vec![Beat::new().with_duration(-1.0)]);
        let err = pipeline(&[]).run(&context(script)).unwrap_err();
        assert!(matches!(err, PipelineError::ValidationFailed { .. }));
    }

    #[test]
    fn cancelled_pipeline_stops_before_probing() {
        let script = Script::new(vec![Beat::new()]);
        let pipeline = pipeline(&[]);
        pipeline.cancel_handle().cancel();

        let err = pipeline.run(&context(script)).unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled { .. }));
    }

    #[test]
    fn concat_failure_reports_phase_and_progress() {
        let script = Script::new(vec![Beat::new().with_audio(MediaSource::path("a.mp3"))]);
        let mut pipeline = pipeline(&[("a.mp3", 2.0, true)]);
        pipeline.settings.concat.ffmpeg_path = "/nonexistent/ffmpeg-binary".to_string();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let ctx = context(script).with_progress_callback(Box::new(
            move |phase: &str, percent: u32, _msg: &str| {
                sink.lock().push((phase.to_string(), percent));
            },
        ));

        let err = pipeline.run(&ctx).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Concat));

        let phases: Vec<String> = seen.lock().iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(
            phases,
            vec!["Validate", "Probe", "Group", "Reconcile", "Assemble", "Concat"]
        );
    }

    #[test]
    fn empty_script_reconciles_but_does_not_render() {
        let pipeline = pipeline(&[]);
        let timeline = pipeline.reconcile(&Script::new(Vec::new())).unwrap();
        assert!(timeline.beats.is_empty());
        assert!(timeline.plan.is_empty());

        let err = pipeline.run(&context(Script::new(Vec::new()))).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Concat));
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn negative_configured_padding_is_rejected() {
        let script = Script::new(vec![Beat::new().with_audio(MediaSource::path("a.mp3"))]);
        let mut pipeline = pipeline(&[("a.mp3", 2.0, true)]);
        pipeline.settings.audio.padding = -5.0;

        let err = pipeline.reconcile(&script).unwrap_err();
        assert!(matches!(err, TimelineError::InvalidAudioParams { .. }));

        let err = pipeline.run(&context(script)).unwrap_err();
        assert!(matches!(err, PipelineError::ValidationFailed { .. }));
    }

    #[test]
    fn unwritable_output_folder_fails_setup() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file.txt");
        std::fs::write(&blocker, "x").unwrap();

        let script = Script::new(vec![Beat::new().with_audio(MediaSource::path("a.mp3"))]);
        let pipeline = pipeline(&[("a.mp3", 2.0, true)]);
        let logger = Arc::new(RunLogger::detached("test_run", LogConfig::default()));
        let ctx = Context::new(script, "test_run", blocker.join("out.m4a"), logger);

        let err = pipeline.run(&ctx).unwrap_err();
        assert!(matches!(err, PipelineError::SetupFailed { .. }));
        assert_eq!(err.phase(), None);
    }

    #[test]
    fn cancel_handle_is_shared() {
        let pipeline = pipeline(&[]);
        let handle = pipeline.cancel_handle();
        assert!(!pipeline.is_cancelled());
        handle.cancel();
        assert!(pipeline.is_cancelled());
        assert!(pipeline.cancel_handle().is_cancelled());
    }
}
