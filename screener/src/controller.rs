use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use futures::future::BoxFuture;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;

use screener_core::{
    BatchOutcome, BatchRequest, ExportFile, ExportRequest, ExportRequestBuilder, ScreenerBackend,
    ScreenerError,
};
use screener_types::{ScreenerConfig, ScreeningState};

use crate::deferral::Deferral;
use crate::machine::{Action, Event, ScreeningMachine, validate_date};

/// Drives screening runs against a backend and publishes every state change.
///
/// One run is owned at a time. Starting a run (batched or server-driven)
/// supersedes the previous one: its driver task is aborted, its pending
/// deferral dies with it, and late results are discarded by run id.
///
/// Observers either hold the [`RunHandle`] returned by a start call (every
/// snapshot of that run, in order) or [`subscribe`](Self::subscribe) to the
/// latest state across runs.
pub struct ScreeningController {
    backend: Arc<dyn ScreenerBackend>,
    config: ScreenerConfig,
    machine: Arc<Mutex<ScreeningMachine>>,
    state_tx: Arc<watch::Sender<ScreeningState>>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl ScreeningController {
    /// Start building a controller.
    #[must_use]
    pub fn builder() -> ScreeningControllerBuilder {
        ScreeningControllerBuilder::new()
    }

    /// Controller with default configuration.
    #[must_use]
    pub fn new(backend: Arc<dyn ScreenerBackend>) -> Self {
        Self::with_config(backend, ScreenerConfig::default())
    }

    fn with_config(backend: Arc<dyn ScreenerBackend>, config: ScreenerConfig) -> Self {
        let (state_tx, _) = watch::channel(ScreeningState::default());
        Self {
            machine: Arc::new(Mutex::new(ScreeningMachine::new(&config))),
            backend,
            config,
            state_tx: Arc::new(state_tx),
            driver: Mutex::new(None),
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ScreenerConfig {
        &self.config
    }

    /// Start a batched run for `date` (`YYYY-MM-DD`).
    ///
    /// Behavior:
    /// - The date is validated before anything else happens; a rejected date
    ///   issues no request and leaves any current run untouched.
    /// - Otherwise the previous run is superseded, results are reset, and
    ///   round 0 is issued immediately.
    ///
    /// # Errors
    /// `InvalidInput` for an empty or malformed date, `Unsupported` when the
    /// backend cannot serve batch rounds.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "screener::controller::start", skip(self), fields(backend = self.backend.name()))
    )]
    pub async fn start(&self, date: &str) -> Result<RunHandle, ScreenerError> {
        validate_date(date)?;
        if self.backend.as_batch_source().is_none() {
            return Err(ScreenerError::unsupported("batch screening"));
        }
        let mut driver = self.driver.lock().await;
        let (run_id, actions) = {
            let mut machine = self.machine.lock().await;
            let actions = machine.start(date)?;
            (machine.current_run_id().unwrap_or_default(), actions)
        };
        Ok(self.launch(&mut driver, run_id, actions))
    }

    /// Follow a job the server runs on its own (`GET /progress` polling, then
    /// `GET /results`). Supersedes any current run.
    ///
    /// # Errors
    /// `Unsupported` when the backend has no progress endpoints.
    pub async fn follow_server_progress(&self) -> Result<RunHandle, ScreenerError> {
        if self.backend.as_progress_source().is_none() {
            return Err(ScreenerError::unsupported("server progress"));
        }
        let mut driver = self.driver.lock().await;
        let (run_id, actions) = {
            let mut machine = self.machine.lock().await;
            let actions = machine.follow_server();
            (machine.current_run_id().unwrap_or_default(), actions)
        };
        Ok(self.launch(&mut driver, run_id, actions))
    }

    fn launch(
        &self,
        slot: &mut Option<JoinHandle<()>>,
        run_id: u64,
        actions: Vec<Action>,
    ) -> RunHandle {
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        let (updates_tx, updates_rx) = mpsc::channel(self.config.update_buffer.max(1));
        let mut queue = VecDeque::with_capacity(actions.len());
        for action in actions {
            match action {
                // Publish synchronously so the new run is visible once this returns.
                Action::Publish(state) => {
                    if publish_latest(&self.state_tx, &state) {
                        offer(&updates_tx, *state);
                    }
                }
                other => queue.push_back(other),
            }
        }
        let driver = Driver {
            run_id,
            backend: Arc::clone(&self.backend),
            machine: Arc::clone(&self.machine),
            state_tx: Arc::clone(&self.state_tx),
            updates: updates_tx,
            round_timeout: self.config.round_timeout,
        };
        *slot = Some(tokio::spawn(driver.run(queue)));
        RunHandle {
            run_id,
            updates: updates_rx,
        }
    }

    /// Watch the latest state across runs.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ScreeningState> {
        self.state_tx.subscribe()
    }

    /// Latest published state.
    #[must_use]
    pub fn state(&self) -> ScreeningState {
        self.state_tx.borrow().clone()
    }

    /// True while a run is in progress; use it to warn before leaving.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state_tx.borrow().is_active()
    }

    /// Build an export request from the current results. Works after a
    /// failed run, too.
    ///
    /// # Errors
    /// `InvalidArg` for a format other than `excel` or `csv`.
    pub fn export_request(&self, format: &str) -> Result<ExportRequest, ScreenerError> {
        ExportRequestBuilder::build(format, &self.state_tx.borrow().results)
    }

    /// Export the current results through the backend.
    ///
    /// # Errors
    /// `InvalidArg` for an unknown format, `InvalidInput` when there is nothing
    /// to export, `Unsupported` when the backend cannot export, or the
    /// backend's own error.
    pub async fn export(&self, format: &str) -> Result<ExportFile, ScreenerError> {
        let req = self.export_request(format)?;
        if req.payload.results.is_empty() {
            return Err(ScreenerError::invalid_input("no results to export"));
        }
        let provider = self
            .backend
            .as_export_provider()
            .ok_or_else(|| ScreenerError::unsupported("export"))?;
        provider.export(&req).await
    }
}

impl Drop for ScreeningController {
    fn drop(&mut self) {
        if let Some(handle) = self.driver.get_mut().take() {
            handle.abort();
        }
    }
}

/// Ordered stream of the snapshots of one run.
///
/// Ends after the terminal snapshot, or early when the run is superseded.
#[derive(Debug)]
pub struct RunHandle {
    run_id: u64,
    updates: mpsc::Receiver<ScreeningState>,
}

impl RunHandle {
    /// Generation of the run this handle follows.
    #[must_use]
    pub const fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Next snapshot, or `None` once the run has ended.
    pub async fn next(&mut self) -> Option<ScreeningState> {
        self.updates.recv().await
    }

    /// Drain snapshots until the terminal one. `None` if the run was
    /// superseded before finishing.
    pub async fn wait_terminal(mut self) -> Option<ScreeningState> {
        while let Some(state) = self.next().await {
            if state.phase.is_terminal() {
                return Some(state);
            }
        }
        None
    }

    /// Consume into a `Stream` of snapshots.
    pub fn into_stream(self) -> impl Stream<Item = ScreeningState> + Send + 'static {
        futures::stream::unfold(self.updates, |mut rx| async move {
            rx.recv().await.map(|state| (state, rx))
        })
    }
}

// Record `state` as the latest one. False when a newer run already
// published; a superseded driver may still publish once before its abort lands.
fn publish_latest(state_tx: &watch::Sender<ScreeningState>, state: &ScreeningState) -> bool {
    state_tx.send_if_modified(|current| {
        if current.run_id > state.run_id {
            false
        } else {
            *current = state.clone();
            true
        }
    })
}

// Intermediate snapshots are dropped when the reader lags; the watch channel
// still holds the latest one.
fn offer(updates: &mpsc::Sender<ScreeningState>, state: ScreeningState) {
    match updates.try_send(state) {
        Ok(()) | Err(mpsc::error::TrySendError::Closed(_)) => {}
        Err(mpsc::error::TrySendError::Full(_dropped)) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                run_id = _dropped.run_id,
                "run update buffer full; dropping snapshot (watch channel keeps the latest)"
            );
        }
    }
}

struct Driver {
    run_id: u64,
    backend: Arc<dyn ScreenerBackend>,
    machine: Arc<Mutex<ScreeningMachine>>,
    state_tx: Arc<watch::Sender<ScreeningState>>,
    updates: mpsc::Sender<ScreeningState>,
    round_timeout: Option<Duration>,
}

impl Driver {
    // The terminal snapshot waits for buffer space so `RunHandle` readers
    // always see how the run ended.
    async fn publish(&self, state: ScreeningState) {
        if !publish_latest(&self.state_tx, &state) {
            return;
        }
        if state.phase.is_terminal() {
            let _ = self.updates.send(state).await;
        } else {
            offer(&self.updates, state);
        }
    }

    async fn run(self, mut queue: VecDeque<Action>) {
        let mut deferral = Deferral::new();
        let mut in_flight: Option<BoxFuture<'static, Event>> = None;
        loop {
            while let Some(action) = queue.pop_front() {
                match action {
                    Action::FetchBatch { run_id, request } => {
                        in_flight = Some(Box::pin(fetch_round(
                            Arc::clone(&self.backend),
                            request,
                            self.round_timeout,
                            run_id,
                        )));
                    }
                    Action::ScheduleNextRound { delay, .. } => deferral.schedule(delay),
                    Action::CancelDeferral => deferral.cancel(),
                    Action::PollProgress { run_id, delay } => {
                        in_flight = Some(Box::pin(poll_progress(
                            Arc::clone(&self.backend),
                            delay,
                            run_id,
                        )));
                    }
                    Action::FetchResults { run_id } => {
                        in_flight = Some(Box::pin(fetch_results(
                            Arc::clone(&self.backend),
                            run_id,
                        )));
                    }
                    Action::Publish(state) => self.publish(*state).await,
                    Action::Finish { .. } => return,
                }
            }

            let event = tokio::select! {
                event = next_event(&mut in_flight), if in_flight.is_some() => event,
                () = deferral.wait(), if deferral.is_pending() => Event::DeferralElapsed { run_id: self.run_id },
                else => return,
            };
            queue.extend(self.machine.lock().await.handle(event));
        }
    }
}

async fn next_event(slot: &mut Option<BoxFuture<'static, Event>>) -> Event {
    match slot.as_mut() {
        Some(fut) => {
            let event = fut.await;
            *slot = None;
            event
        }
        None => std::future::pending().await,
    }
}

#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "screener::controller::round",
        skip(backend, timeout),
        fields(backend = backend.name(), batch_start = request.batch_start),
    )
)]
async fn fetch_round(
    backend: Arc<dyn ScreenerBackend>,
    request: BatchRequest,
    timeout: Option<Duration>,
    run_id: u64,
) -> Event {
    let outcome = match backend.as_batch_source() {
        None => BatchOutcome::Failed(ScreenerError::unsupported("batch screening")),
        Some(source) => match timeout {
            Some(limit) => tokio::time::timeout(limit, source.fetch_batch(&request))
                .await
                .unwrap_or_else(|_| {
                    BatchOutcome::Failed(ScreenerError::RoundTimeout {
                        timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    })
                }),
            None => source.fetch_batch(&request).await,
        },
    };
    Event::RoundFinished { run_id, outcome }
}

async fn poll_progress(backend: Arc<dyn ScreenerBackend>, delay: Duration, run_id: u64) -> Event {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let result = match backend.as_progress_source() {
        Some(source) => source.progress().await,
        None => Err(ScreenerError::unsupported("server progress")),
    };
    Event::ProgressPolled { run_id, result }
}

async fn fetch_results(backend: Arc<dyn ScreenerBackend>, run_id: u64) -> Event {
    let result = match backend.as_progress_source() {
        Some(source) => source.results().await,
        None => Err(ScreenerError::unsupported("server results")),
    };
    Event::ResultsFetched { run_id, result }
}

/// Builder for [`ScreeningController`].
pub struct ScreeningControllerBuilder {
    backend: Option<Arc<dyn ScreenerBackend>>,
    cfg: ScreenerConfig,
}

impl Default for ScreeningControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreeningControllerBuilder {
    /// Builder with default configuration and no backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            backend: None,
            cfg: ScreenerConfig::default(),
        }
    }

    /// Backend serving the rounds. Required.
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn ScreenerBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, cfg: ScreenerConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Window size per round.
    #[must_use]
    pub const fn batch_size(mut self, size: u32) -> Self {
        self.cfg.batch_size = size;
        self
    }

    /// Pause between a round that reported more data and the next request.
    #[must_use]
    pub const fn round_delay(mut self, delay: Duration) -> Self {
        self.cfg.round_delay = delay;
        self
    }

    /// Upper bound for a single round-trip; an overrun fails the run.
    #[must_use]
    pub const fn round_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.round_timeout = Some(timeout);
        self
    }

    /// Wait indefinitely for each round-trip.
    #[must_use]
    pub const fn no_round_timeout(mut self) -> Self {
        self.cfg.round_timeout = None;
        self
    }

    /// Interval between progress polls when following a server-driven job.
    #[must_use]
    pub const fn legacy_poll_interval(mut self, interval: Duration) -> Self {
        self.cfg.legacy_poll_interval = interval;
        self
    }

    /// Capacity of each run's update channel. Intermediate snapshots beyond it
    /// are dropped for a lagging reader; the terminal snapshot is always kept.
    #[must_use]
    pub const fn update_buffer(mut self, capacity: usize) -> Self {
        self.cfg.update_buffer = capacity;
        self
    }

    /// Build the controller.
    ///
    /// # Errors
    /// `InvalidArg` when no backend was set or `batch_size` is zero.
    pub fn build(self) -> Result<ScreeningController, ScreenerError> {
        let backend = self.backend.ok_or_else(|| {
            ScreenerError::InvalidArg(
                "no backend registered; add one via with_backend(...)".to_string(),
            )
        })?;
        if self.cfg.batch_size == 0 {
            return Err(ScreenerError::InvalidArg(
                "batch_size must be positive".to_string(),
            ));
        }
        Ok(ScreeningController::with_config(backend, self.cfg))
    }
}
