//! Detection Scheduler Implementation

use crate::config::{interval_ms, SchedulerConfig};
use crate::fps::FpsMeter;
use crate::state::{Phase, SchedulerState};
use crate::status::PipelineStatus;
use crate::SchedulerError;
use alerting::AlertManager;
use model_adapter::{InferenceError, LoadConfig, ModelAdapter, ModelVariant};
use overlay::{Renderer, Surface};
use prediction_filter::{clamp_confidence, filter, DetectionSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};
use vision_core::{Clock, Detection, VideoSource};

const COMMAND_CAPACITY: usize = 32;

/// Control messages for a running scheduler
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerCommand {
    /// `Ready → Detecting`
    Start,
    /// `Detecting → Ready(paused)`; the model stays loaded
    Stop,
    /// Re-arms the timer when detecting; never reloads the model
    SetTargetFps(u32),
    /// Re-arms the timer when detecting; never reloads the model
    SetConfidence(f32),
    /// Re-enters `Loading`, then restores the previous run/pause state
    SetVariant(ModelVariant),
    /// Retry the current variant after a failed load
    Reload,
    SetAlertsEnabled(bool),
    SetVolume(f32),
    /// Tear down to `Stopped` and end the run loop
    Shutdown,
}

/// Cloneable control and status handle
#[derive(Clone)]
pub struct SchedulerHandle {
    commands: mpsc::Sender<SchedulerCommand>,
    status: watch::Receiver<PipelineStatus>,
}

impl SchedulerHandle {
    pub async fn send(&self, command: SchedulerCommand) -> Result<(), SchedulerError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SchedulerError::ChannelClosed)
    }

    pub async fn start(&self) -> Result<(), SchedulerError> {
        self.send(SchedulerCommand::Start).await
    }

    pub async fn stop(&self) -> Result<(), SchedulerError> {
        self.send(SchedulerCommand::Stop).await
    }

    pub async fn shutdown(&self) -> Result<(), SchedulerError> {
        self.send(SchedulerCommand::Shutdown).await
    }

    /// Latest published status
    pub fn status(&self) -> PipelineStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineStatus> {
        self.status.clone()
    }

    /// Wait until a published status satisfies `predicate`
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&PipelineStatus) -> bool,
    ) -> Result<PipelineStatus, SchedulerError> {
        let mut rx = self.status.clone();
        let status = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| SchedulerError::ChannelClosed)?
            .clone();
        Ok(status)
    }
}

struct CycleOutcome {
    generation: u64,
    result: Result<Vec<Detection>, InferenceError>,
}

/// Drives the capture → detect → filter → render cycle
///
/// The run loop is the only writer of [`SchedulerState`]. Detection runs on
/// the blocking pool with at most one cycle in flight; ticks that arrive
/// while a cycle is running, or while the source has no frame, are skipped.
pub struct DetectionScheduler<S> {
    config: SchedulerConfig,
    state: SchedulerState,
    adapter: ModelAdapter,
    backend_ready: bool,
    source: Box<dyn VideoSource>,
    renderer: Renderer,
    surface: S,
    alerts: AlertManager,
    clock: Arc<dyn Clock>,
    fps: FpsMeter,
    timer: Option<Interval>,
    commands: mpsc::Receiver<SchedulerCommand>,
    done_tx: mpsc::Sender<CycleOutcome>,
    done_rx: mpsc::Receiver<CycleOutcome>,
    status: PipelineStatus,
    status_tx: watch::Sender<PipelineStatus>,
}

impl<S: Surface + Send + 'static> DetectionScheduler<S> {
    /// Create a scheduler in `Idle` and the handle that controls it
    pub fn new(
        config: SchedulerConfig,
        adapter: ModelAdapter,
        source: Box<dyn VideoSource>,
        surface: S,
        alerts: AlertManager,
        clock: Arc<dyn Clock>,
    ) -> (Self, SchedulerHandle) {
        let config = config.normalized();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (done_tx, done_rx) = mpsc::channel(1);

        let mut status = PipelineStatus::new(
            config.variant,
            config.target_fps,
            config.confidence_threshold,
        );
        status.alerts_enabled = alerts.is_enabled();
        let (status_tx, status_rx) = watch::channel(status.clone());

        let backend_ready = adapter.prepare_backend();
        info!(
            "Detection scheduler created ({} @ {} fps, threshold {:.2})",
            config.variant, config.target_fps, config.confidence_threshold
        );

        let scheduler = Self {
            state: SchedulerState::new(config.interval_ms()),
            config,
            adapter,
            backend_ready,
            source,
            renderer: Renderer::new(Arc::clone(&clock)),
            surface,
            alerts,
            clock,
            fps: FpsMeter::new(),
            timer: None,
            commands: command_rx,
            done_tx,
            done_rx,
            status,
            status_tx,
        };
        let handle = SchedulerHandle {
            commands: command_tx,
            status: status_rx,
        };
        (scheduler, handle)
    }

    /// Load the initial model and run until `Shutdown` or every handle is dropped.
    /// Returns the drawing surface holding the last painted frame.
    pub async fn run(mut self) -> Result<S, SchedulerError> {
        info!("Starting detection scheduler");
        self.state.resume_detecting = self.config.auto_start;
        self.load_model().await?;

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(SchedulerCommand::Shutdown) | None => break,
                    Some(command) => {
                        if let Err(e) = self.handle_command(command).await {
                            warn!("Ignoring command: {}", e);
                        }
                    }
                },
                _ = next_tick(&mut self.timer) => self.on_tick(),
                Some(outcome) = self.done_rx.recv() => self.on_cycle_complete(outcome),
            }
        }

        self.teardown().await?;
        info!("Detection scheduler stopped");
        Ok(self.surface)
    }

    async fn handle_command(&mut self, command: SchedulerCommand) -> Result<(), SchedulerError> {
        debug!("Scheduler command: {:?}", command);
        match command {
            SchedulerCommand::Start => {
                if self.state.phase().is_detecting() {
                    return Ok(());
                }
                self.start_detecting()?;
            }
            SchedulerCommand::Stop => {
                if self.state.phase().is_detecting() {
                    self.pause()?;
                }
            }
            SchedulerCommand::SetTargetFps(fps) => {
                self.config.target_fps = fps.max(1);
                self.state.interval_ms = interval_ms(self.config.target_fps);
                self.rearm_if_detecting();
                self.publish();
            }
            SchedulerCommand::SetConfidence(threshold) => {
                self.config.confidence_threshold = clamp_confidence(threshold);
                self.rearm_if_detecting();
                self.publish();
            }
            SchedulerCommand::SetVariant(variant) => {
                if variant == self.config.variant && self.state.phase().has_model() {
                    return Ok(());
                }
                self.config.variant = variant;
                self.reload().await?;
            }
            SchedulerCommand::Reload => {
                if self.state.phase() == Phase::Idle {
                    self.reload().await?;
                }
            }
            SchedulerCommand::SetAlertsEnabled(enabled) => {
                self.alerts.set_enabled(enabled);
                self.status.alerts_enabled = enabled;
                self.publish();
            }
            SchedulerCommand::SetVolume(volume) => self.alerts.set_volume(volume),
            SchedulerCommand::Shutdown => {}
        }
        Ok(())
    }

    /// Re-enter `Loading`, remembering whether detection was running
    async fn reload(&mut self) -> Result<(), SchedulerError> {
        let was_detecting = self.state.phase().is_detecting();
        if was_detecting {
            self.pause()?;
        }
        self.state.resume_detecting = was_detecting;
        if !self.backend_ready {
            self.backend_ready = self.adapter.prepare_backend();
        }
        self.load_model().await
    }

    async fn load_model(&mut self) -> Result<(), SchedulerError> {
        self.state.transition(Phase::Loading)?;
        self.state.model = None;
        self.publish();

        let load = LoadConfig {
            variant: self.config.variant,
            backend_ready: self.backend_ready,
        };
        match self.adapter.load(&load).await {
            Ok(handle) => {
                self.state.model = Some(handle);
                self.release_retired_models();
                self.status.last_error = None;
                self.state.transition(Phase::Ready { paused: false })?;
                self.publish();
                if std::mem::take(&mut self.state.resume_detecting) {
                    self.start_detecting()?;
                }
            }
            Err(e) => {
                error!("Failed to load {} model: {}", load.variant, e);
                self.adapter.retire_current();
                self.release_retired_models();
                self.state.resume_detecting = false;
                self.status.last_error = Some(e.to_string());
                self.state.transition(Phase::Idle)?;
                self.publish();
            }
        }
        Ok(())
    }

    fn start_detecting(&mut self) -> Result<(), SchedulerError> {
        self.state.transition(Phase::Detecting)?;
        self.fps.restart(self.clock.now_ms());
        self.arm_timer();
        info!(
            "Detection started ({}ms interval, threshold {:.2})",
            self.state.interval_ms, self.config.confidence_threshold
        );
        self.publish();
        Ok(())
    }

    fn pause(&mut self) -> Result<(), SchedulerError> {
        self.state.transition(Phase::Ready { paused: true })?;
        self.timer = None;
        self.state.bump_generation();
        info!("Detection paused");
        self.publish();
        Ok(())
    }

    fn arm_timer(&mut self) {
        let period = Duration::from_millis(self.state.interval_ms);
        let mut timer = interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.timer = Some(timer);
    }

    fn rearm_if_detecting(&mut self) {
        if self.state.phase().is_detecting() {
            debug!("Re-arming detection timer at {}ms", self.state.interval_ms);
            self.arm_timer();
        }
    }

    fn on_tick(&mut self) {
        if !self.state.phase().is_detecting() {
            return;
        }
        if self.state.in_flight {
            trace!("Previous cycle still in flight, skipping tick");
            return;
        }
        if !self.source.is_ready() {
            trace!("Video source not ready, skipping tick");
            return;
        }
        let Some(model) = self.state.model.clone() else {
            return;
        };
        let Some(frame) = self.source.grab() else {
            return;
        };

        self.state.in_flight = true;
        self.state.last_frame_at = Some(frame.captured_at_ms);
        let generation = self.state.generation;
        let max_results = self.config.max_results;
        let min_score = self.config.confidence_threshold;
        let done = self.done_tx.clone();

        tokio::task::spawn_blocking(move || {
            let result = model.detect(&frame, max_results, min_score);
            let _ = done.blocking_send(CycleOutcome { generation, result });
        });
    }

    /// Dispose superseded models once no cycle can still be running on them
    fn release_retired_models(&mut self) {
        if self.state.in_flight {
            debug!(
                "Deferring release of {} model(s) until the running cycle completes",
                self.adapter.retired_count()
            );
            return;
        }
        self.adapter.release_retired();
    }

    fn on_cycle_complete(&mut self, outcome: CycleOutcome) {
        self.state.in_flight = false;
        self.release_retired_models();
        if outcome.generation != self.state.generation || !self.state.phase().is_detecting() {
            debug!("Discarding result of a superseded cycle");
            return;
        }

        let set = match outcome.result {
            Ok(raw) => {
                let set = filter(raw, self.config.confidence_threshold);
                if let Some(fps) = self.fps.record(self.clock.now_ms()) {
                    debug!("Detection rate {} fps", fps);
                    self.status.fps = fps;
                }
                self.status.cycles += 1;
                set
            }
            Err(e) => {
                warn!("Detection failed, treating cycle as empty: {}", e);
                DetectionSet::empty()
            }
        };

        self.renderer
            .paint(&mut self.surface, &set, &mut self.alerts);
        self.status.apply_set(&set);
        self.publish();
    }

    /// Walk down to `Stopped`, releasing the model and audio buffers.
    /// A cycle still running is awaited and its result discarded.
    async fn teardown(&mut self) -> Result<(), SchedulerError> {
        info!("Tearing down detection scheduler");
        if self.state.phase().is_detecting() {
            self.pause()?;
        }
        self.timer = None;
        self.state.bump_generation();

        if self.state.in_flight {
            debug!("Waiting for the running cycle before releasing the model");
            if self.done_rx.recv().await.is_some() {
                self.state.in_flight = false;
            }
        }

        match self.state.phase() {
            Phase::Stopped => {}
            Phase::Loading => {
                self.state.transition(Phase::Idle)?;
                self.state.transition(Phase::Stopped)?;
            }
            _ => self.state.transition(Phase::Stopped)?,
        }

        self.state.model = None;
        self.adapter.release();
        self.alerts.dispose();
        self.publish();
        Ok(())
    }

    fn publish(&mut self) {
        self.status.phase = self.state.phase();
        self.status.variant = self.config.variant;
        self.status.target_fps = self.config.target_fps;
        self.status.confidence_threshold = self.config.confidence_threshold;
        self.status.last_frame_at_ms = self.state.last_frame_at;
        self.status_tx.send_replace(self.status.clone());
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::{AlertConfig, FsClipStore, HeadlessAudioEngine, NoSpeech};
    use model_adapter::{Detector, LoadError, ModelBackend, ScriptedBackend};
    use overlay::DisplayList;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Condvar, Mutex};
    use tokio::sync::Notify;
    use vision_core::{Frame, ManualClock, ReadyToggle, TestPatternSource};

    // virtual time; ticks every 10ms at the harness rate of 100 fps
    const WAIT: Duration = Duration::from_secs(5);
    const TICK: Duration = Duration::from_millis(10);

    struct Harness {
        handle: SchedulerHandle,
        engine: Arc<HeadlessAudioEngine>,
        ready: ReadyToggle,
        task: tokio::task::JoinHandle<Result<DisplayList, SchedulerError>>,
    }

    fn person_scene() -> Vec<Vec<Detection>> {
        vec![vec![
            Detection::new("person", 0.9, [100.0, 100.0, 50.0, 100.0]),
            Detection::new("car", 0.5, [300.0, 300.0, 30.0, 30.0]),
        ]]
    }

    fn harness(backend: Arc<dyn ModelBackend>, auto_start: bool) -> Harness {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(1_000));
        let engine = Arc::new(HeadlessAudioEngine::new());

        let source = TestPatternSource::new(64, 48, Arc::clone(&clock));
        let ready = source.ready_toggle();
        let alerts = AlertManager::new(
            AlertConfig::default(),
            engine.clone(),
            Arc::new(NoSpeech),
            Arc::new(FsClipStore::new("/definitely/not/here")),
            Arc::clone(&clock),
        );
        let config = SchedulerConfig {
            target_fps: 100,
            auto_start,
            ..Default::default()
        };
        let (scheduler, handle) = DetectionScheduler::new(
            config,
            ModelAdapter::new(backend, Arc::clone(&clock)),
            Box::new(source),
            DisplayList::new(800, 800),
            alerts,
            clock,
        );
        let task = tokio::spawn(scheduler.run());

        Harness {
            handle,
            engine,
            ready,
            task,
        }
    }

    fn scripted(backend: ScriptedBackend) -> Arc<ScriptedBackend> {
        Arc::new(backend)
    }

    async fn wait(h: &Harness, predicate: impl FnMut(&PipelineStatus) -> bool) -> PipelineStatus {
        tokio::time::timeout(WAIT, h.handle.wait_for(predicate))
            .await
            .expect("timed out waiting for status")
            .unwrap()
    }

    /// Virtual time from now until the next completed cycle
    async fn until_next_cycle(h: &Harness) -> Duration {
        let start = Instant::now();
        let cycles = h.handle.status().cycles;
        wait(h, |s| s.cycles > cycles).await;
        start.elapsed()
    }

    /// Detector that parks every call until the gate opens
    #[derive(Default)]
    struct Gate {
        open: Mutex<bool>,
        opened: Condvar,
        entered: Notify,
        busy: AtomicBool,
        disposals: AtomicUsize,
        disposed_while_busy: AtomicUsize,
    }

    impl Gate {
        fn open(&self) {
            *self.open.lock().unwrap() = true;
            self.opened.notify_all();
        }
    }

    struct GatedBackend(Arc<Gate>);
    struct GatedDetector(Arc<Gate>);

    impl ModelBackend for GatedBackend {
        fn name(&self) -> &'static str {
            "gated"
        }

        fn load(&self, _variant: ModelVariant) -> Result<Box<dyn Detector>, LoadError> {
            Ok(Box::new(GatedDetector(Arc::clone(&self.0))))
        }
    }

    impl Detector for GatedDetector {
        fn detect(
            &self,
            _frame: &Frame,
            _max_results: Option<usize>,
            _min_score: f32,
        ) -> Result<Vec<Detection>, InferenceError> {
            let gate = &self.0;
            gate.busy.store(true, Ordering::SeqCst);
            gate.entered.notify_one();
            let mut open = gate.open.lock().unwrap();
            while !*open {
                open = gate.opened.wait(open).unwrap();
            }
            gate.busy.store(false, Ordering::SeqCst);
            Ok(vec![Detection::new("car", 0.9, [0.0, 0.0, 10.0, 10.0])])
        }

        fn dispose(&self) {
            let gate = &self.0;
            if gate.busy.load(Ordering::SeqCst) {
                gate.disposed_while_busy.fetch_add(1, Ordering::SeqCst);
            }
            gate.disposals.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_load_auto_starts_and_shuts_down() {
        let backend = scripted(ScriptedBackend::new(person_scene()));
        let h = harness(backend.clone(), true);

        let status = wait(&h, |s| s.cycles >= 3).await;
        assert_eq!(status.phase, Phase::Detecting);
        assert_eq!(status.object_count, 1);
        assert_eq!(status.person_count, 1);
        assert!(status.last_frame_at_ms.is_some());

        h.handle.shutdown().await.unwrap();
        let surface = h.task.await.unwrap().unwrap();
        assert!(surface.texts().contains(&"Detection Summary"));
        assert_eq!(h.handle.status().phase, Phase::Stopped);
        assert_eq!(backend.load_count(), 1);
        assert_eq!(backend.dispose_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_after_one_interval() {
        let backend = scripted(ScriptedBackend::new(person_scene()));
        let h = harness(backend, true);
        wait(&h, |s| s.phase == Phase::Detecting).await;

        assert_eq!(until_next_cycle(&h).await, TICK);
        assert_eq!(until_next_cycle(&h).await, TICK);

        h.handle.shutdown().await.unwrap();
        h.task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_person_detection_raises_audio_alert() {
        let h = harness(scripted(ScriptedBackend::new(person_scene())), true);
        wait(&h, |s| s.cycles >= 2).await;

        // custom clip is missing, so the person alert falls back to the tone
        assert!(h.engine.played() >= 1);
        h.handle.shutdown().await.unwrap();
        h.task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_fps_change_restarts_timer_at_new_interval() {
        let backend = scripted(ScriptedBackend::new(person_scene()));
        let h = harness(backend.clone(), true);
        wait(&h, |s| s.cycles >= 1).await;
        assert_eq!(until_next_cycle(&h).await, TICK);

        // mid-interval, so a restarted timer is distinguishable from the old one
        tokio::time::advance(Duration::from_millis(4)).await;
        let changed_at = Instant::now();
        h.handle
            .send(SchedulerCommand::SetTargetFps(25))
            .await
            .unwrap();
        wait(&h, |s| s.target_fps == 25).await;
        let cycles = h.handle.status().cycles;
        wait(&h, |s| s.cycles > cycles).await;

        assert_eq!(changed_at.elapsed(), Duration::from_millis(40));
        assert_eq!(until_next_cycle(&h).await, Duration::from_millis(40));
        assert_eq!(h.handle.status().phase, Phase::Detecting);
        assert_eq!(backend.load_count(), 1);

        h.handle.shutdown().await.unwrap();
        h.task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_fps_above_cap_uses_minimum_interval() {
        let h = harness(scripted(ScriptedBackend::new(person_scene())), true);
        wait(&h, |s| s.cycles >= 1).await;

        h.handle
            .send(SchedulerCommand::SetTargetFps(500))
            .await
            .unwrap();
        wait(&h, |s| s.target_fps == 500).await;
        assert_eq!(until_next_cycle(&h).await, Duration::from_millis(10));

        h.handle.shutdown().await.unwrap();
        h.task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_confidence_change_restarts_timer_without_reload() {
        let backend = scripted(ScriptedBackend::new(person_scene()));
        let h = harness(backend.clone(), true);
        wait(&h, |s| s.cycles >= 1).await;

        tokio::time::advance(Duration::from_millis(4)).await;
        let changed_at = Instant::now();
        h.handle
            .send(SchedulerCommand::SetConfidence(0.99))
            .await
            .unwrap();
        wait(&h, |s| s.confidence_threshold == 0.95).await;
        let cycles = h.handle.status().cycles;
        let status = wait(&h, |s| s.cycles > cycles).await;

        assert_eq!(changed_at.elapsed(), TICK);
        assert_eq!(status.phase, Phase::Detecting);
        assert_eq!(status.object_count, 0);
        assert_eq!(backend.load_count(), 1);

        h.handle.shutdown().await.unwrap();
        h.task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_variant_change_reloads_and_resumes() {
        let backend = scripted(ScriptedBackend::new(person_scene()));
        let h = harness(backend.clone(), true);
        wait(&h, |s| s.cycles >= 1).await;

        h.handle
            .send(SchedulerCommand::SetVariant(ModelVariant::MobilenetV2))
            .await
            .unwrap();
        let status = wait(&h, |s| {
            s.variant == ModelVariant::MobilenetV2 && s.phase == Phase::Detecting
        })
        .await;
        let resumed_from = status.cycles;
        wait(&h, |s| s.cycles > resumed_from).await;

        assert_eq!(backend.load_count(), 2);
        assert_eq!(backend.dispose_count(), 1);

        h.handle.shutdown().await.unwrap();
        h.task.await.unwrap().unwrap();
        assert_eq!(backend.dispose_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_model_outlives_running_cycle() {
        let gate = Arc::new(Gate::default());
        let h = harness(Arc::new(GatedBackend(Arc::clone(&gate))), true);
        gate.entered.notified().await;

        h.handle
            .send(SchedulerCommand::SetVariant(ModelVariant::MobilenetV2))
            .await
            .unwrap();
        wait(&h, |s| {
            s.variant == ModelVariant::MobilenetV2 && s.phase == Phase::Detecting
        })
        .await;
        assert_eq!(gate.disposals.load(Ordering::SeqCst), 0);

        gate.open();
        let status = wait(&h, |s| s.cycles >= 1).await;
        assert_eq!(status.variant, ModelVariant::MobilenetV2);
        assert_eq!(gate.disposals.load(Ordering::SeqCst), 1);

        h.handle.shutdown().await.unwrap();
        h.task.await.unwrap().unwrap();
        assert_eq!(gate.disposals.load(Ordering::SeqCst), 2);
        assert_eq!(gate.disposed_while_busy.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_waits_for_running_cycle() {
        let gate = Arc::new(Gate::default());
        let h = harness(Arc::new(GatedBackend(Arc::clone(&gate))), true);
        gate.entered.notified().await;

        h.handle.shutdown().await.unwrap();
        tokio::task::yield_now().await;
        assert_eq!(gate.disposals.load(Ordering::SeqCst), 0);

        gate.open();
        h.task.await.unwrap().unwrap();
        assert_eq!(h.handle.status().phase, Phase::Stopped);
        assert_eq!(h.handle.status().cycles, 0);
        assert_eq!(gate.disposals.load(Ordering::SeqCst), 1);
        assert_eq!(gate.disposed_while_busy.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_variant_change_while_paused_stays_paused() {
        let backend = scripted(ScriptedBackend::new(person_scene()));
        let h = harness(backend.clone(), false);
        wait(&h, |s| s.phase == Phase::Ready { paused: false }).await;

        h.handle
            .send(SchedulerCommand::SetVariant(ModelVariant::MobilenetV1))
            .await
            .unwrap();
        let status = wait(&h, |s| {
            s.variant == ModelVariant::MobilenetV1 && s.phase == (Phase::Ready { paused: false })
        })
        .await;
        assert_eq!(status.cycles, 0);
        assert_eq!(backend.load_count(), 2);
        assert_eq!(backend.dispose_count(), 1);

        h.handle.shutdown().await.unwrap();
        h.task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_pauses_without_releasing() {
        let backend = scripted(ScriptedBackend::new(person_scene()));
        let h = harness(backend.clone(), true);
        wait(&h, |s| s.cycles >= 1).await;

        h.handle.stop().await.unwrap();
        let paused = wait(&h, |s| s.phase == Phase::Ready { paused: true }).await;
        assert_eq!(backend.dispose_count(), 0);

        tokio::time::sleep(TICK * 10).await;
        assert_eq!(h.handle.status().cycles, paused.cycles);

        h.handle.start().await.unwrap();
        wait(&h, |s| s.phase == Phase::Detecting).await;
        assert_eq!(until_next_cycle(&h).await, TICK);
        assert_eq!(backend.load_count(), 1);

        h.handle.shutdown().await.unwrap();
        h.task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_failure_stays_idle_until_reload() {
        let backend =
            scripted(ScriptedBackend::new(person_scene()).failing_variant(ModelVariant::Lite));
        let h = harness(backend.clone(), true);

        let status = wait(&h, |s| s.last_error.is_some()).await;
        assert_eq!(status.phase, Phase::Idle);

        // detection cannot start without a model
        h.handle.start().await.unwrap();
        h.handle.send(SchedulerCommand::Reload).await.unwrap();
        h.handle
            .send(SchedulerCommand::SetVariant(ModelVariant::MobilenetV1))
            .await
            .unwrap();
        let status = wait(&h, |s| s.phase == Phase::Ready { paused: false }).await;
        assert!(status.last_error.is_none());
        assert_eq!(status.cycles, 0);
        assert_eq!(backend.load_count(), 3);

        h.handle.shutdown().await.unwrap();
        h.task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_inference_failures_are_empty_cycles() {
        let backend = scripted(ScriptedBackend::new(person_scene()).failing_every(1));
        let h = harness(backend.clone(), true);
        wait(&h, |s| s.phase == Phase::Detecting).await;

        tokio::time::sleep(TICK * 5 + TICK / 2).await;

        let status = h.handle.status();
        assert_eq!(backend.detect_count(), 5);
        assert_eq!(status.phase, Phase::Detecting);
        assert_eq!(status.cycles, 0);
        assert_eq!(status.object_count, 0);

        h.handle.shutdown().await.unwrap();
        h.task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unready_source_skips_cycles() {
        let backend = scripted(ScriptedBackend::new(person_scene()));
        let h = harness(backend.clone(), false);
        h.ready.set(false);
        wait(&h, |s| s.phase == Phase::Ready { paused: false }).await;

        h.handle.start().await.unwrap();
        wait(&h, |s| s.phase == Phase::Detecting).await;
        tokio::time::sleep(TICK * 10 + TICK / 2).await;
        assert_eq!(backend.detect_count(), 0);

        // ticks kept running while the source was unready
        h.ready.set(true);
        assert_eq!(until_next_cycle(&h).await, TICK / 2);

        h.handle.shutdown().await.unwrap();
        h.task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_every_handle_stops_the_loop() {
        let backend = scripted(ScriptedBackend::new(person_scene()));
        let h = harness(backend.clone(), true);
        wait(&h, |s| s.phase == Phase::Detecting).await;

        drop(h.handle);
        h.task.await.unwrap().unwrap();
        assert_eq!(backend.dispose_count(), 1);
    }
}
