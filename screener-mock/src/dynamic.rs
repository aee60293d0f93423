use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use screener_core::{
    BatchOutcome, BatchRequest, BatchSource, ExportFile, ExportProvider, ExportRequest,
    LegacyResults, ProgressSource, ScreenerBackend, ScreenerError, ServerProgress,
    export_file_name,
};

use crate::fixtures;

/// Instruction for how one call should behave.
#[derive(Debug, Clone)]
pub enum MockBehavior<T> {
    /// Return the provided value immediately.
    Return(T),
    /// Fail immediately with the provided error.
    Fail(ScreenerError),
    /// Hang indefinitely (simulate a stalled server).
    Hang,
}

impl<T> MockBehavior<T> {
    async fn resolve(self) -> Result<T, ScreenerError> {
        match self {
            Self::Return(v) => Ok(v),
            Self::Fail(e) => Err(e),
            Self::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

#[derive(Default)]
struct InternalState {
    rounds: VecDeque<MockBehavior<BatchOutcome>>,
    progress: VecDeque<MockBehavior<ServerProgress>>,
    results: Option<MockBehavior<LegacyResults>>,
    export: Option<MockBehavior<ExportFile>>,
    batch_requests: Vec<BatchRequest>,
    export_requests: Vec<ExportRequest>,
    progress_polls: usize,
}

/// Controller handle used by tests to script a [`ScriptedScreener`].
#[derive(Clone)]
pub struct ScriptedController {
    state: Arc<Mutex<InternalState>>,
}

impl ScriptedController {
    /// Queue the behavior of the next unscripted `POST /screen` round.
    pub async fn push_round(&self, behavior: MockBehavior<BatchOutcome>) {
        self.state.lock().await.rounds.push_back(behavior);
    }

    /// Queue several round outcomes at once.
    pub async fn push_rounds(&self, outcomes: impl IntoIterator<Item = BatchOutcome>) {
        let mut guard = self.state.lock().await;
        guard
            .rounds
            .extend(outcomes.into_iter().map(MockBehavior::Return));
    }

    /// Queue progress responses. The last one keeps being returned once the
    /// queue is drained.
    pub async fn push_progress(&self, behavior: MockBehavior<ServerProgress>) {
        self.state.lock().await.progress.push_back(behavior);
    }

    /// Set the response of `GET /results`.
    pub async fn set_results(&self, behavior: MockBehavior<LegacyResults>) {
        self.state.lock().await.results = Some(behavior);
    }

    /// Set the response of `POST /export/{format}`. Without one the export
    /// renders the payload as CSV.
    pub async fn set_export(&self, behavior: MockBehavior<ExportFile>) {
        self.state.lock().await.export = Some(behavior);
    }

    /// Every batch request received so far, in order.
    pub async fn batch_requests(&self) -> Vec<BatchRequest> {
        self.state.lock().await.batch_requests.clone()
    }

    /// Every export request received so far, in order.
    pub async fn export_requests(&self) -> Vec<ExportRequest> {
        self.state.lock().await.export_requests.clone()
    }

    /// Number of `GET /progress` calls received so far.
    pub async fn progress_polls(&self) -> usize {
        self.state.lock().await.progress_polls
    }

    /// Clear all scripted behaviors and request logs.
    pub async fn clear_all(&self) {
        *self.state.lock().await = InternalState::default();
    }
}

/// A backend that defers all behavior to a [`ScriptedController`].
pub struct ScriptedScreener {
    name: &'static str,
    batch: bool,
    legacy: bool,
    export: bool,
    state: Arc<Mutex<InternalState>>,
}

impl ScriptedScreener {
    /// Create a scripted backend with every capability and its controller.
    #[must_use]
    pub fn new_with_controller(
        name: &'static str,
    ) -> (Arc<dyn ScreenerBackend>, ScriptedController) {
        Self::with_capabilities(name, true, true, true)
    }

    /// Create a scripted backend that only serves batch rounds.
    #[must_use]
    pub fn batch_only(name: &'static str) -> (Arc<dyn ScreenerBackend>, ScriptedController) {
        Self::with_capabilities(name, true, false, false)
    }

    /// Create a scripted backend for a deployment without batch rounds: it
    /// only serves `/progress` and `/results`.
    #[must_use]
    pub fn progress_only(name: &'static str) -> (Arc<dyn ScreenerBackend>, ScriptedController) {
        Self::with_capabilities(name, false, true, false)
    }

    fn with_capabilities(
        name: &'static str,
        batch: bool,
        legacy: bool,
        export: bool,
    ) -> (Arc<dyn ScreenerBackend>, ScriptedController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let controller = ScriptedController {
            state: Arc::clone(&state),
        };
        let me = Arc::new(Self {
            name,
            batch,
            legacy,
            export,
            state,
        });
        (me as Arc<dyn ScreenerBackend>, controller)
    }
}

impl ScreenerBackend for ScriptedScreener {
    fn name(&self) -> &'static str {
        self.name
    }

    fn as_batch_source(&self) -> Option<&dyn BatchSource> {
        self.batch.then_some(self as &dyn BatchSource)
    }

    fn as_progress_source(&self) -> Option<&dyn ProgressSource> {
        self.legacy.then_some(self as &dyn ProgressSource)
    }

    fn as_export_provider(&self) -> Option<&dyn ExportProvider> {
        self.export.then_some(self as &dyn ExportProvider)
    }
}

#[async_trait]
impl BatchSource for ScriptedScreener {
    async fn fetch_batch(&self, req: &BatchRequest) -> BatchOutcome {
        // Take the behavior without holding the lock across the await below.
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.batch_requests.push(req.clone());
            guard.rounds.pop_front()
        };
        match behavior {
            Some(b) => BatchOutcome::from(b.resolve().await),
            None => BatchOutcome::Failed(ScreenerError::Other(format!(
                "no scripted round for batch_start {}",
                req.batch_start
            ))),
        }
    }
}

#[async_trait]
impl ProgressSource for ScriptedScreener {
    async fn progress(&self) -> Result<ServerProgress, ScreenerError> {
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.progress_polls += 1;
            if guard.progress.len() > 1 {
                guard.progress.pop_front()
            } else {
                guard.progress.front().cloned()
            }
        };
        match behavior {
            Some(b) => b.resolve().await,
            None => Err(ScreenerError::unsupported("progress")),
        }
    }

    async fn results(&self) -> Result<LegacyResults, ScreenerError> {
        let behavior = self.state.lock().await.results.clone();
        match behavior {
            Some(b) => b.resolve().await,
            None => Err(ScreenerError::unsupported("results")),
        }
    }
}

#[async_trait]
impl ExportProvider for ScriptedScreener {
    async fn export(&self, req: &ExportRequest) -> Result<ExportFile, ScreenerError> {
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.export_requests.push(req.clone());
            guard.export.clone()
        };
        match behavior {
            Some(b) => b.resolve().await,
            None => Ok(ExportFile {
                file_name: export_file_name(req.format, Utc::now()),
                content_type: req.format.content_type().to_string(),
                bytes: fixtures::render_csv(&req.payload.results),
            }),
        }
    }
}
