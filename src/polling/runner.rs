//! The polling loop itself.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};

use super::{Cadence, FailureBackoff, LoopCommand, LoopState, PollingConfig, Snapshot, TickOutcome};
use crate::camera::{CameraStatus, FrameSource};
use crate::display::{DisplayController, DisplayState, Signal};
use crate::encoder::{EncodedFrame, FrameEncoder};
use crate::inference::{Classifier, InferenceError, PredictionResult};
use crate::rate::RateCounter;

/// A finished background submission (fixed-rate mode).
struct Completion {
    sequence: u64,
    latency: Duration,
    result: Result<PredictionResult, InferenceError>,
}

/// Drives capture → encode → classify → display on a fixed interval.
///
/// The loop references the frame source and classifier but owns the display
/// controller, the rate counter and the schedule. Every submission gets a
/// monotonically increasing sequence number; results older than the one on
/// screen are discarded.
pub struct PollingLoop<S: FrameSource + ?Sized, C: Classifier> {
    source: Arc<S>,
    encoder: FrameEncoder,
    classifier: C,
    config: PollingConfig,
    display: DisplayController,
    rate: RateCounter,
    backoff: FailureBackoff,
    state: LoopState,
    /// Last camera status fed to the display
    camera_seen: Option<CameraStatus>,
    next_sequence: u64,
    in_flight: usize,
    last_latency: Option<Duration>,
    submitted: u64,
    failed: u64,
    snapshot_tx: watch::Sender<Snapshot>,
}

impl<S: FrameSource + ?Sized, C: Classifier> PollingLoop<S, C> {
    pub fn new(source: Arc<S>, encoder: FrameEncoder, classifier: C, config: PollingConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(Snapshot::default());
        let backoff = FailureBackoff::new(config.backoff);
        let config = PollingConfig {
            max_in_flight: config.max_in_flight.max(1),
            ..config
        };

        Self {
            source,
            encoder,
            classifier,
            config,
            display: DisplayController::new(),
            rate: RateCounter::new(Instant::now().into_std()),
            backoff,
            state: LoopState::Idle,
            camera_seen: None,
            next_sequence: 0,
            in_flight: 0,
            last_latency: None,
            submitted: 0,
            failed: 0,
            snapshot_tx,
        }
    }

    /// Receiver that always holds the latest [`Snapshot`].
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn display(&self) -> &DisplayState {
        self.display.state()
    }

    pub fn config(&self) -> &PollingConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            display: self.display.state().clone(),
            fps: self.rate.last_published(),
            loop_state: self.state,
            last_latency: self.last_latency,
            in_flight: self.in_flight,
            submitted: self.submitted,
            failed: self.failed,
        }
    }

    /// Run one serial tick: capture, submit, wait for the result, display it.
    pub async fn tick(&mut self) -> TickOutcome {
        let outcome = match self.begin_tick() {
            Err(outcome) => outcome,
            Ok((sequence, frame)) => {
                self.in_flight += 1;
                let started = Instant::now();
                let result = self.classifier.classify(frame).await;
                self.in_flight -= 1;
                self.finish_submission(sequence, started.elapsed(), result)
            }
        };
        self.end_tick();
        outcome
    }

    /// Apply a control command. Returns `false` on shutdown.
    pub fn handle_command(&mut self, command: LoopCommand) -> bool {
        match command {
            LoopCommand::Pause => {
                if self.state != LoopState::Stopped {
                    log::info!("Polling paused");
                    self.state = LoopState::Stopped;
                    self.display.apply(&Signal::Paused);
                }
            }
            LoopCommand::Resume => {
                if self.state == LoopState::Stopped {
                    log::info!("Polling resumed");
                    self.state = LoopState::Idle;
                    // Re-announce the camera status on the next tick
                    self.camera_seen = None;
                }
            }
            LoopCommand::Shutdown => {
                log::info!("Polling loop shutting down");
                return false;
            }
        }
        self.publish();
        true
    }

    /// Decide whether this tick submits, and if so encode its frame.
    fn begin_tick(&mut self) -> Result<(u64, EncodedFrame), TickOutcome> {
        if self.state == LoopState::Stopped {
            return Err(TickOutcome::Stopped);
        }
        if !self.refresh_camera() {
            return Err(TickOutcome::Idle);
        }
        if self.in_flight >= self.config.max_in_flight {
            log::debug!("{} requests in flight, skipping tick", self.in_flight);
            return Err(TickOutcome::Saturated);
        }

        let frame = self.encoder.capture(&*self.source).ok_or(TickOutcome::NoFrame)?;
        self.next_sequence += 1;
        self.submitted += 1;
        Ok((self.next_sequence, frame))
    }

    /// Sync loop state with the camera; returns whether it is ready.
    fn refresh_camera(&mut self) -> bool {
        let status = self.source.status();
        if self.camera_seen.as_ref() != Some(&status) {
            match &status {
                CameraStatus::Denied(reason) | CameraStatus::Unavailable(reason) => {
                    log::error!("Camera not usable: {}", reason)
                }
                other => log::info!("Camera status: {:?}", other),
            }
            self.display.apply(&Signal::Camera(status.clone()));
            self.camera_seen = Some(status.clone());
        }

        let ready = status.is_ready();
        self.state = if ready {
            LoopState::Active
        } else {
            LoopState::Idle
        };
        ready
    }

    fn finish_submission(
        &mut self,
        sequence: u64,
        latency: Duration,
        result: Result<PredictionResult, InferenceError>,
    ) -> TickOutcome {
        self.last_latency = Some(latency);
        let paused = self.state == LoopState::Stopped;

        match result {
            Ok(prediction) => {
                self.rate.record_completion();
                self.backoff.record_success();
                log::debug!(
                    "#{} -> {:?} ({:.2}) in {:?}",
                    sequence,
                    prediction.label,
                    prediction.confidence,
                    latency
                );
                let displayed =
                    !paused && self.display.apply_result(sequence, &Signal::Prediction(prediction));
                TickOutcome::Completed {
                    sequence,
                    displayed,
                }
            }
            Err(e) => {
                let network = e.is_network();
                if !network {
                    // The endpoint answered; it counts as a round trip
                    self.rate.record_completion();
                }
                self.backoff.record_failure();
                self.failed += 1;
                log::warn!("Prediction #{} failed: {}", sequence, e);
                let displayed =
                    !paused && self.display.apply_result(sequence, &Signal::Failure((&e).into()));
                TickOutcome::Failed {
                    sequence,
                    network,
                    displayed,
                }
            }
        }
    }

    fn end_tick(&mut self) {
        if let Some(fps) = self.rate.poll(Instant::now().into_std()) {
            log::debug!("Round trips per second: {}", fps);
        }
        self.publish();
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }

    /// Delay before the next serial tick.
    fn rearm_delay(&self) -> Duration {
        self.config.interval + self.backoff.delay()
    }
}

impl<S, C> PollingLoop<S, C>
where
    S: FrameSource + ?Sized + 'static,
    C: Classifier + Clone + 'static,
{
    /// Run until `Shutdown` is received or the command channel closes.
    pub async fn run(self, commands: mpsc::Receiver<LoopCommand>) {
        log::info!(
            "Polling every {:?} ({} cadence)",
            self.config.interval,
            self.config.cadence.name()
        );
        match self.config.cadence {
            Cadence::Serial => self.run_serial(commands).await,
            Cadence::FixedRate => self.run_fixed_rate(commands).await,
        }
    }

    /// Tick, wait for the result, then re-arm. A slow response delays the
    /// next tick by its latency. Commands are handled while a request is
    /// outstanding, so shutdown never waits on the endpoint.
    async fn run_serial(mut self, mut commands: mpsc::Receiver<LoopCommand>) {
        let classifier = self.classifier.clone();
        loop {
            if let Ok((sequence, frame)) = self.begin_tick() {
                self.in_flight += 1;
                self.publish();
                let started = Instant::now();
                let request = classifier.classify(frame);
                tokio::pin!(request);
                let result = loop {
                    tokio::select! {
                        result = &mut request => break result,
                        command = commands.recv() => {
                            let keep_running = command.is_some_and(|c| self.handle_command(c));
                            if !keep_running {
                                log::debug!("Abandoning request #{}", sequence);
                                return;
                            }
                        }
                    }
                };
                self.in_flight -= 1;
                self.finish_submission(sequence, started.elapsed(), result);
            }
            self.end_tick();

            let rearm = tokio::time::sleep(self.rearm_delay());
            tokio::pin!(rearm);
            loop {
                tokio::select! {
                    _ = &mut rearm => break,
                    command = commands.recv() => {
                        let keep_running = command.is_some_and(|c| self.handle_command(c));
                        if !keep_running {
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Tick on a fixed period regardless of outstanding requests.
    async fn run_fixed_rate(mut self, mut commands: mpsc::Receiver<LoopCommand>) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.dispatch(&done_tx);
                }
                Some(done) = done_rx.recv() => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    self.finish_submission(done.sequence, done.latency, done.result);
                    self.publish();
                }
                command = commands.recv() => {
                    let keep_running = command.is_some_and(|c| self.handle_command(c));
                    if !keep_running {
                        return;
                    }
                }
            }
        }
    }

    fn dispatch(&mut self, done_tx: &mpsc::UnboundedSender<Completion>) -> TickOutcome {
        let outcome = match self.begin_tick() {
            Err(outcome) => outcome,
            Ok((sequence, frame)) => {
                self.in_flight += 1;
                let classifier = self.classifier.clone();
                let done_tx = done_tx.clone();
                tokio::spawn(async move {
                    let started = Instant::now();
                    let result = classifier.classify(frame).await;
                    let _ = done_tx.send(Completion {
                        sequence,
                        latency: started.elapsed(),
                        result,
                    });
                });
                TickOutcome::Submitted { sequence }
            }
        };
        self.end_tick();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Frame;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedSource {
        status: Mutex<CameraStatus>,
    }

    impl FrameSource for FixedSource {
        fn status(&self) -> CameraStatus {
            self.status.lock().unwrap().clone()
        }

        fn latest_frame(&self) -> Option<Frame> {
            Some(Frame {
                data: vec![40; 16 * 12 * 3],
                width: 16,
                height: 12,
                timestamp: std::time::Instant::now(),
            })
        }
    }

    #[derive(Clone, Default)]
    struct CountingClassifier {
        calls: Arc<AtomicUsize>,
    }

    impl Classifier for CountingClassifier {
        fn classify(
            &self,
            _frame: EncodedFrame,
        ) -> impl Future<Output = Result<PredictionResult, InferenceError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(PredictionResult::new("A", 0.9)) }
        }
    }

    fn polling_loop(status: CameraStatus) -> PollingLoop<FixedSource, CountingClassifier> {
        let source = Arc::new(FixedSource {
            status: Mutex::new(status),
        });
        PollingLoop::new(
            source,
            FrameEncoder::default(),
            CountingClassifier::default(),
            PollingConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_tick_becomes_active_when_ready() {
        let mut polling = polling_loop(CameraStatus::Ready);
        assert_eq!(polling.state(), LoopState::Idle);

        let outcome = polling.tick().await;
        assert_eq!(
            outcome,
            TickOutcome::Completed {
                sequence: 1,
                displayed: true
            }
        );
        assert_eq!(polling.state(), LoopState::Active);
        assert_eq!(polling.display().label, "A");
    }

    #[tokio::test]
    async fn test_paused_tick_does_nothing() {
        let mut polling = polling_loop(CameraStatus::Ready);
        assert!(polling.handle_command(LoopCommand::Pause));
        assert_eq!(polling.tick().await, TickOutcome::Stopped);
        assert_eq!(polling.classifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(polling.snapshot().loop_state, LoopState::Stopped);

        assert!(polling.handle_command(LoopCommand::Resume));
        assert!(matches!(
            polling.tick().await,
            TickOutcome::Completed { .. }
        ));
    }

    #[tokio::test]
    async fn test_shutdown_command_returns_false() {
        let mut polling = polling_loop(CameraStatus::Requesting);
        assert!(!polling.handle_command(LoopCommand::Shutdown));
    }

    #[tokio::test]
    async fn test_subscriber_sees_published_snapshot() {
        let mut polling = polling_loop(CameraStatus::Ready);
        let rx = polling.subscribe();
        polling.tick().await;
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.submitted, 1);
        assert_eq!(snapshot.display.label, "A");
        assert!(snapshot.last_latency.is_some());
    }
}
