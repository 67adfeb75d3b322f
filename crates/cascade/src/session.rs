use std::sync::Arc;

use shared::domain::{Level, TermId};
use term_store::TermRepository;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::controller::{
    CascadeController, CompletionOutcome, FetchCompletion, FetchRequest, SelectionState,
    Transition,
};

/// Runs a [`CascadeController`] against a repository.
///
/// Fetches run as spawned tasks, but their results are only applied from
/// [`CascadeSession::next_completion`], on the caller's thread of control. In-flight
/// requests are never aborted; superseded results are dropped when they arrive.
/// Must be used from within a tokio runtime.
pub struct CascadeSession {
    controller: CascadeController,
    repository: Arc<dyn TermRepository>,
    completions_tx: mpsc::UnboundedSender<FetchCompletion>,
    completions_rx: mpsc::UnboundedReceiver<FetchCompletion>,
    snapshot: watch::Sender<SelectionState>,
}

impl CascadeSession {
    pub fn new(repository: Arc<dyn TermRepository>, anchor: TermId) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let controller = CascadeController::new(anchor);
        let (snapshot, _) = watch::channel(controller.state().clone());
        Self {
            controller,
            repository,
            completions_tx,
            completions_rx,
            snapshot,
        }
    }

    pub fn state(&self) -> &SelectionState {
        self.controller.state()
    }

    /// Receives every new state, starting with the current one.
    pub fn subscribe(&self) -> watch::Receiver<SelectionState> {
        self.snapshot.subscribe()
    }

    pub fn has_pending(&self) -> bool {
        self.controller.has_pending()
    }

    pub fn mount(&mut self) {
        let request = self.controller.mount();
        self.dispatch(request);
        self.publish();
    }

    pub fn on_level_select(&mut self, level: Level, term: Option<TermId>) -> Transition {
        let transition = self.controller.select(level, term);
        if let Transition::Applied { fetch } = &transition {
            if let Some(request) = fetch {
                self.dispatch(request.clone());
            }
            self.publish();
        }
        transition
    }

    /// Returns false when the level had not failed.
    pub fn retry(&mut self, level: Level) -> bool {
        match self.controller.retry(level) {
            Some(request) => {
                self.dispatch(request);
                self.publish();
                true
            }
            None => false,
        }
    }

    /// Waits for the next fetch to finish and applies it.
    pub async fn next_completion(&mut self) -> Option<CompletionOutcome> {
        let completion = self.completions_rx.recv().await?;
        let outcome = self.controller.complete(completion);
        if !matches!(outcome, CompletionOutcome::Stale { .. }) {
            self.publish();
        }
        Some(outcome)
    }

    /// Applies completions until no level is waiting on a fetch. Stale results that
    /// arrive in between are consumed and dropped.
    pub async fn settle(&mut self) {
        while self.controller.has_pending() {
            if self.next_completion().await.is_none() {
                break;
            }
        }
    }

    fn dispatch(&self, request: FetchRequest) {
        let repository = Arc::clone(&self.repository);
        let completions = self.completions_tx.clone();
        debug!(level = %request.level, token = request.token, "spawning term fetch");
        tokio::spawn(async move {
            let result = repository.fetch_children(&request.parent).await;
            // The session may be gone; its results no longer matter then.
            let _ = completions.send(FetchCompletion { request, result });
        });
    }

    fn publish(&self) {
        self.snapshot.send_replace(self.controller.state().clone());
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
