//! Analysis session controller.
//!
//! Owns the request lifecycle (`Idle → Loading → Succeeded | Failed`) and the
//! active category filter. All writes go through this type; reads are
//! snapshots or views derived on demand from the aggregator.
//!
//! The state lives behind an async mutex that is never held across the
//! service call. A submission while another is loading is rejected, and an
//! outcome that arrives after the submission was cancelled is dropped.

use crate::analysis::{
    category_percentages, count_by_category, filter_by_category, label_disagreements,
};
use crate::client::AnalysisService;
use crate::error::SessionError;
use crate::models::{AnalysisResult, CategoryFilter, ClassifiedComment, Percentages, SentimentCounts};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Phase of the current analysis request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Idle,
    Loading,
    Failed(String),
    Succeeded(Arc<AnalysisResult>),
}

impl SessionState {
    /// Short name of the phase, for logs and status lines.
    pub fn tag(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Loading => "loading",
            SessionState::Failed(_) => "failed",
            SessionState::Succeeded(_) => "succeeded",
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }
}

/// Display-ready derivation of a successful analysis under one filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub filter: CategoryFilter,
    pub counts: SentimentCounts,
    /// `None` when there are no categorized comments.
    pub percentages: Option<Percentages>,
    /// Comments whose label differs from their most probable category.
    pub disagreements: usize,
    pub comments: Vec<ClassifiedComment>,
}

impl ResultView {
    pub fn build(result: &AnalysisResult, filter: CategoryFilter) -> Self {
        let counts = count_by_category(result);

        Self {
            filter,
            counts,
            percentages: category_percentages(&counts),
            disagreements: label_disagreements(result),
            comments: filter_by_category(result, filter)
                .into_iter()
                .cloned()
                .collect(),
        }
    }
}

/// What the presentation layer should show right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SessionView {
    Idle,
    Loading,
    Failed { message: String },
    Succeeded(ResultView),
}

#[derive(Debug, Default)]
struct Inner {
    state: SessionState,
    filter: CategoryFilter,
    /// Bumped on every accepted submission; outcomes for older ones are dropped.
    generation: u64,
    cancel: Option<oneshot::Sender<()>>,
}

impl Inner {
    /// Return to `Idle` if the loading submission's future was dropped.
    ///
    /// The submitting future holds the cancel receiver until it records its
    /// outcome, so a closed channel while `Loading` means nobody will.
    fn reap_abandoned(&mut self) {
        let abandoned = self.state.is_loading()
            && self.cancel.as_ref().map_or(true, |tx| tx.is_closed());

        if abandoned {
            warn!("Submission {} was dropped while loading", self.generation);
            self.state = SessionState::Idle;
            self.cancel = None;
        }
    }
}

/// Single-writer owner of the session state.
pub struct AnalysisSession<S> {
    service: S,
    inner: Mutex<Inner>,
}

impl<S: AnalysisService> AnalysisSession<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Submit a video reference for analysis and wait for it to resolve.
    ///
    /// Returns the state once this submission has finished. Fails without
    /// touching the state when the input is blank or another submission is
    /// still loading. Dropping the returned future abandons the submission
    /// like [`cancel`](Self::cancel) does.
    pub async fn submit(&self, input: &str) -> Result<SessionState, SessionError> {
        let (generation, mut cancelled) = {
            let mut inner = self.lock().await;

            if inner.state.is_loading() {
                warn!("Rejected submission while an analysis is in progress");
                return Err(SessionError::Busy);
            }
            if input.trim().is_empty() {
                debug!("Rejected empty submission");
                return Err(SessionError::Validation);
            }

            let (cancel_tx, cancel_rx) = oneshot::channel();
            inner.generation += 1;
            inner.state = SessionState::Loading;
            inner.filter = CategoryFilter::All;
            inner.cancel = Some(cancel_tx);

            (inner.generation, cancel_rx)
        };

        info!("Analyzing comments for {}", input);

        let outcome = tokio::select! {
            outcome = self.service.fetch_analysis(input) => Some(outcome),
            _ = &mut cancelled => None,
        };

        let mut inner = self.inner.lock().await;

        if inner.generation != generation || !inner.state.is_loading() {
            debug!("Discarding outcome of superseded submission {}", generation);
            return Ok(inner.state.clone());
        }

        let next = match outcome {
            Some(Ok(result)) => {
                if result.is_empty() {
                    info!("Analysis returned no comments");
                } else {
                    info!("Analysis returned {} comments", result.len());
                }
                SessionState::Succeeded(Arc::new(result))
            }
            Some(Err(e)) => {
                warn!("Analysis failed: {}", e);
                SessionState::Failed(e.user_message())
            }
            None => SessionState::Idle,
        };

        inner.cancel = None;
        inner.filter = CategoryFilter::All;
        inner.state = next.clone();

        Ok(next)
    }

    /// Abandon the in-flight submission and return to `Idle`.
    ///
    /// Returns `false` when nothing was loading.
    pub async fn cancel(&self) -> bool {
        let mut inner = self.lock().await;

        if !inner.state.is_loading() {
            return false;
        }

        inner.state = SessionState::Idle;
        if let Some(cancel_tx) = inner.cancel.take() {
            let _ = cancel_tx.send(());
        }

        info!("Analysis cancelled");
        true
    }

    /// Change the category filter. Only applies to a successful analysis.
    pub async fn set_filter(&self, filter: CategoryFilter) -> bool {
        let mut inner = self.lock().await;

        if !matches!(inner.state, SessionState::Succeeded(_)) {
            debug!("Ignoring filter change while {}", inner.state.tag());
            return false;
        }

        debug!("Filter set to {}", filter);
        inner.filter = filter;
        true
    }

    pub async fn state(&self) -> SessionState {
        self.lock().await.state.clone()
    }

    pub async fn filter(&self) -> CategoryFilter {
        self.lock().await.filter
    }

    async fn lock(&self) -> MutexGuard<'_, Inner> {
        let mut inner = self.inner.lock().await;
        inner.reap_abandoned();
        inner
    }

    /// Derive the view for the current state and filter.
    pub async fn current_view(&self) -> SessionView {
        let (state, filter) = {
            let inner = self.lock().await;
            (inner.state.clone(), inner.filter)
        };

        match state {
            SessionState::Idle => SessionView::Idle,
            SessionState::Loading => SessionView::Loading,
            SessionState::Failed(message) => SessionView::Failed { message },
            SessionState::Succeeded(result) => {
                SessionView::Succeeded(ResultView::build(&result, filter))
            }
        }
    }
}
