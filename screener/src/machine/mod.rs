use std::time::Duration;

use chrono::NaiveDate;
use screener_core::{
    ApiStats, BatchOutcome, BatchProgress, BatchRequest, FullResult, LegacyResults,
    ProgressTracker, ResultAccumulator, RunSummary, ScreenerError, ServerProgress, SharedRecord,
    percentage,
};
use screener_types::{ScreenerConfig, ScreeningPhase, ScreeningState};

mod legacy;

/// How the current run obtains its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Client-paginated `POST /screen` rounds.
    Batched,
    /// Server-driven job observed through `GET /progress` and `GET /results`.
    ServerDriven,
}

/// Bookkeeping of the run currently owned by the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreeningRun {
    pub run_id: u64,
    pub mode: RunMode,
    pub date: Option<String>,
    /// Offset of the next window; always a multiple of the batch size.
    pub batch_offset: u64,
    pub processed_stocks: u64,
    pub total_stocks: u64,
    pub rounds: u32,
    pub is_active: bool,
}

// What the machine is waiting for. Events that do not match are dropped, which
// keeps at most one round-trip in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awaiting {
    Nothing,
    Round,
    Deferral,
    Poll,
    Results,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RoundFinished {
        run_id: u64,
        outcome: BatchOutcome,
    },
    DeferralElapsed {
        run_id: u64,
    },
    ProgressPolled {
        run_id: u64,
        result: Result<ServerProgress, ScreenerError>,
    },
    ResultsFetched {
        run_id: u64,
        result: Result<LegacyResults, ScreenerError>,
    },
}

impl Event {
    #[must_use]
    pub const fn run_id(&self) -> u64 {
        match self {
            Self::RoundFinished { run_id, .. }
            | Self::DeferralElapsed { run_id }
            | Self::ProgressPolled { run_id, .. }
            | Self::ResultsFetched { run_id, .. } => *run_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    FetchBatch { run_id: u64, request: BatchRequest },
    ScheduleNextRound { run_id: u64, delay: Duration },
    CancelDeferral,
    PollProgress { run_id: u64, delay: Duration },
    FetchResults { run_id: u64 },
    Publish(Box<ScreeningState>),
    Finish { run_id: u64 },
}

/// Pure screening state machine.
///
/// Owns the run, the accumulator, and the progress tracker. Performs no I/O:
/// the driver feeds it [`Event`]s and carries out the returned [`Action`]s.
#[derive(Debug)]
pub struct ScreeningMachine {
    batch_size: u32,
    round_delay: Duration,
    poll_interval: Duration,
    last_run_id: u64,
    run: Option<ScreeningRun>,
    awaiting: Awaiting,
    accumulator: ResultAccumulator,
    tracker: ProgressTracker,
    phase: ScreeningPhase,
    summary: RunSummary,
    api_stats: Option<ApiStats>,
    error: Option<ScreenerError>,
}

impl ScreeningMachine {
    #[must_use]
    pub fn new(config: &ScreenerConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            round_delay: config.round_delay,
            poll_interval: config.legacy_poll_interval,
            last_run_id: 0,
            run: None,
            awaiting: Awaiting::Nothing,
            accumulator: ResultAccumulator::new(),
            tracker: ProgressTracker::new(),
            phase: ScreeningPhase::Idle,
            summary: RunSummary::default(),
            api_stats: None,
            error: None,
        }
    }

    /// Begin a batched run for `date` (`YYYY-MM-DD`).
    ///
    /// Validation happens before any state changes, so a rejected date leaves
    /// the current run untouched.
    ///
    /// # Errors
    /// Returns `InvalidInput` for an empty or malformed date.
    pub fn start(&mut self, date: &str) -> Result<Vec<Action>, ScreenerError> {
        let date = validate_date(date)?;
        let run_id = self.begin(RunMode::Batched, Some(date.clone()), "initializing...");
        self.awaiting = Awaiting::Round;
        let request = BatchRequest::new(date, 0, self.batch_size);

        #[cfg(feature = "tracing")]
        tracing::info!(run_id, date = %request.date, batch_size = self.batch_size, "screening run started");

        Ok(vec![
            Action::CancelDeferral,
            self.publish(),
            Action::FetchBatch { run_id, request },
        ])
    }

    /// Feed one event; returns the actions the driver must carry out, in order.
    pub fn handle(&mut self, event: Event) -> Vec<Action> {
        let current = self.run.as_ref().map(|r| r.run_id);
        if current != Some(event.run_id()) || self.phase != ScreeningPhase::Running {
            #[cfg(feature = "tracing")]
            tracing::debug!(event_run = event.run_id(), ?current, "dropping stale event");
            return Vec::new();
        }
        match (self.awaiting, event) {
            (Awaiting::Round, Event::RoundFinished { run_id, outcome }) => {
                self.on_round(run_id, outcome)
            }
            (Awaiting::Deferral, Event::DeferralElapsed { run_id }) => self.on_deferral(run_id),
            (Awaiting::Poll, Event::ProgressPolled { run_id, result }) => {
                self.on_progress(run_id, result)
            }
            (Awaiting::Results, Event::ResultsFetched { run_id, result }) => {
                self.on_results(run_id, result)
            }
            _ => Vec::new(),
        }
    }

    /// Current state as published to observers.
    #[must_use]
    pub fn snapshot(&self) -> ScreeningState {
        let run = self.run.as_ref();
        ScreeningState {
            run_id: run.map_or(0, |r| r.run_id),
            phase: self.phase,
            date: run.and_then(|r| r.date.clone()),
            rounds: run.map_or(0, |r| r.rounds),
            progress: self.tracker.snapshot().clone(),
            results: self.accumulator.snapshot(),
            summary: self.summary.clone(),
            api_stats: self.api_stats,
            error: self.error.clone(),
        }
    }

    #[must_use]
    pub const fn run(&self) -> Option<&ScreeningRun> {
        self.run.as_ref()
    }

    #[must_use]
    pub fn current_run_id(&self) -> Option<u64> {
        self.run.as_ref().map(|r| r.run_id)
    }

    #[must_use]
    pub const fn phase(&self) -> ScreeningPhase {
        self.phase
    }

    #[must_use]
    pub fn results(&self) -> &[SharedRecord] {
        self.accumulator.records()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.run.as_ref().is_some_and(|r| r.is_active)
    }

    // Reset everything for a fresh run and enter `Running`.
    fn begin(&mut self, mode: RunMode, date: Option<String>, message: &str) -> u64 {
        self.last_run_id += 1;
        let run_id = self.last_run_id;
        self.accumulator.reset();
        self.tracker.reset(message);
        self.summary = RunSummary::default();
        self.api_stats = None;
        self.error = None;
        self.phase = ScreeningPhase::Running;
        self.run = Some(ScreeningRun {
            run_id,
            mode,
            date,
            batch_offset: 0,
            processed_stocks: 0,
            total_stocks: 0,
            rounds: 0,
            is_active: true,
        });
        run_id
    }

    fn publish(&self) -> Action {
        Action::Publish(Box::new(self.snapshot()))
    }

    fn on_round(&mut self, run_id: u64, outcome: BatchOutcome) -> Vec<Action> {
        if let Some(run) = self.run.as_mut() {
            run.rounds += 1;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(run_id, outcome = outcome.label(), "round finished");

        match outcome {
            BatchOutcome::BatchCompleted(progress) => self.on_batch(run_id, progress),
            BatchOutcome::FullCompleted(full) => self.on_full(run_id, full),
            BatchOutcome::Failed(error) => self.fail(run_id, error),
        }
    }

    fn on_batch(&mut self, run_id: u64, progress: BatchProgress) -> Vec<Action> {
        let BatchProgress {
            results,
            processed_count,
            total_count,
            message,
            has_more,
            api_stats,
        } = progress;
        self.accumulator.append(results);
        if api_stats.is_some() {
            self.api_stats = api_stats;
        }
        self.summary = self.accumulator.summarize(processed_count, total_count);

        let Some(run) = self.run.as_mut() else {
            return Vec::new();
        };
        run.processed_stocks = processed_count;
        run.total_stocks = total_count;

        if !has_more {
            let found = self.accumulator.len();
            self.tracker.complete(format!(
                "screening complete: queried {processed_count} stocks, found {found} qualifying"
            ));
            return self.finish(run_id, ScreeningPhase::Completed);
        }

        run.batch_offset += u64::from(self.batch_size);
        let message = if message.trim().is_empty() {
            format!("processed {processed_count}/{total_count} stocks")
        } else {
            message
        };
        self.tracker
            .advance(percentage(processed_count, total_count), message);
        self.awaiting = Awaiting::Deferral;
        vec![
            self.publish(),
            Action::ScheduleNextRound {
                run_id,
                delay: self.round_delay,
            },
        ]
    }

    fn on_full(&mut self, run_id: u64, full: FullResult) -> Vec<Action> {
        let FullResult {
            results,
            summary,
            message,
        } = full;
        self.accumulator.reset();
        self.accumulator.append(results);
        if let Some(run) = self.run.as_mut() {
            run.processed_stocks = summary.processed_stocks;
            run.total_stocks = summary.total_stocks;
        }
        self.summary = summary;
        let message = if message.trim().is_empty() {
            format!(
                "screening complete: found {} qualifying",
                self.accumulator.len()
            )
        } else {
            message
        };
        self.tracker.complete(message);
        self.finish(run_id, ScreeningPhase::Completed)
    }

    fn on_deferral(&mut self, run_id: u64) -> Vec<Action> {
        let Some(run) = self.run.as_ref() else {
            return Vec::new();
        };
        let request = BatchRequest::new(
            run.date.clone().unwrap_or_default(),
            run.batch_offset,
            self.batch_size,
        );
        self.awaiting = Awaiting::Round;
        vec![Action::FetchBatch { run_id, request }]
    }

    // Terminal failure: progress stays frozen, results are kept for inspection.
    fn fail(&mut self, run_id: u64, error: ScreenerError) -> Vec<Action> {
        #[cfg(feature = "tracing")]
        tracing::warn!(run_id, error = %error, kept = self.accumulator.len(), "screening run failed");

        self.tracker.note(error.to_string());
        self.error = Some(error);
        self.finish(run_id, ScreeningPhase::Failed)
    }

    fn finish(&mut self, run_id: u64, phase: ScreeningPhase) -> Vec<Action> {
        self.phase = phase;
        self.awaiting = Awaiting::Nothing;
        if let Some(run) = self.run.as_mut() {
            run.is_active = false;
        }

        #[cfg(feature = "tracing")]
        {
            if phase == ScreeningPhase::Completed {
                tracing::info!(run_id, found = self.accumulator.len(), "screening run completed");
            }
        }

        vec![
            Action::CancelDeferral,
            self.publish(),
            Action::Finish { run_id },
        ]
    }
}

pub(crate) fn validate_date(date: &str) -> Result<String, ScreenerError> {
    let date = date.trim();
    if date.is_empty() {
        return Err(ScreenerError::invalid_input("please select a screening date"));
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
        ScreenerError::invalid_input(format!("invalid screening date '{date}' (expected YYYY-MM-DD)"))
    })?;
    Ok(date.to_string())
}
