//! Transitions for server-driven runs observed through `GET /progress` and
//! `GET /results`, for deployments that do not paginate.

use std::time::Duration;

use screener_core::{LegacyResults, ScreenerError, ServerProgress, ServerStatus};
use screener_types::ScreeningPhase;

use super::{Action, Awaiting, RunMode, ScreeningMachine};

const SERVER_ERROR_FALLBACK: &str = "error during screening";
const RESULTS_FALLBACK: &str = "failed to fetch results";

impl ScreeningMachine {
    /// Begin following a job the server runs on its own.
    ///
    /// Resets the run exactly like [`start`](Self::start) and polls progress
    /// immediately.
    pub fn follow_server(&mut self) -> Vec<Action> {
        let run_id = self.begin(RunMode::ServerDriven, None, "waiting for server progress...");
        self.awaiting = Awaiting::Poll;

        #[cfg(feature = "tracing")]
        tracing::info!(run_id, "following server-driven screening");

        vec![
            Action::CancelDeferral,
            self.publish(),
            Action::PollProgress {
                run_id,
                delay: Duration::ZERO,
            },
        ]
    }

    fn poll_again(&mut self, run_id: u64) -> Action {
        self.awaiting = Awaiting::Poll;
        Action::PollProgress {
            run_id,
            delay: self.poll_interval,
        }
    }

    pub(super) fn on_progress(
        &mut self,
        run_id: u64,
        result: Result<ServerProgress, ScreenerError>,
    ) -> Vec<Action> {
        let progress = match result {
            Ok(p) => p,
            // A failed poll is not fatal; the next one may succeed.
            Err(_error) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(run_id, error = %_error, "progress poll failed");
                return vec![self.poll_again(run_id)];
            }
        };
        if let Some(run) = self.run.as_mut() {
            run.rounds += 1;
        }
        match progress.status {
            ServerStatus::Running => {
                let message = progress.message.clone().unwrap_or_default();
                match progress.percentage() {
                    Some(pct) => self.tracker.advance(pct, message),
                    None => self.tracker.note(message),
                }
                vec![self.publish(), self.poll_again(run_id)]
            }
            ServerStatus::Completed => {
                self.tracker.note("fetching results...");
                self.awaiting = Awaiting::Results;
                vec![self.publish(), Action::FetchResults { run_id }]
            }
            ServerStatus::Error => self.fail(
                run_id,
                ScreenerError::rejected(progress.message.as_deref(), SERVER_ERROR_FALLBACK),
            ),
            ServerStatus::Idle | ServerStatus::Unknown => vec![self.poll_again(run_id)],
        }
    }

    pub(super) fn on_results(
        &mut self,
        run_id: u64,
        result: Result<LegacyResults, ScreenerError>,
    ) -> Vec<Action> {
        let results = match result {
            Ok(r) if r.success => r,
            Ok(r) => {
                return self.fail(
                    run_id,
                    ScreenerError::rejected(r.message.as_deref(), RESULTS_FALLBACK),
                );
            }
            Err(error) => return self.fail(run_id, error),
        };
        let LegacyResults {
            results, summary, ..
        } = results;
        self.accumulator.reset();
        self.accumulator.append(results);
        if let Some(run) = self.run.as_mut() {
            run.processed_stocks = summary.processed_stocks;
            run.total_stocks = summary.total_stocks;
        }
        self.summary = summary;
        self.tracker.complete(format!(
            "screening complete: found {} qualifying",
            self.accumulator.len()
        ));
        self.finish(run_id, ScreeningPhase::Completed)
    }
}
