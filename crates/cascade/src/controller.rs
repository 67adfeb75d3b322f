use serde::Serialize;
use shared::{
    domain::{Level, Term, TermId},
    error::FetchError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum LoadStatus {
    /// No parent to load under.
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(FetchError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LevelState {
    selected: Option<TermId>,
    children: Vec<Term>,
    status: LoadStatus,
}

impl LevelState {
    fn loading() -> Self {
        Self {
            status: LoadStatus::Loading,
            ..Self::default()
        }
    }

    pub fn selected(&self) -> Option<&TermId> {
        self.selected.as_ref()
    }

    pub fn children(&self) -> &[Term] {
        &self.children
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn error(&self) -> Option<&FetchError> {
        match &self.status {
            LoadStatus::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn child(&self, id: &TermId) -> Option<&Term> {
        self.children.iter().find(|term| &term.id == id)
    }
}

/// Selection and loaded children for each of the three levels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    levels: [LevelState; 3],
}

impl SelectionState {
    pub fn level(&self, level: Level) -> &LevelState {
        &self.levels[level.index()]
    }

    /// The loaded term behind a level's selection.
    pub fn selected_term(&self, level: Level) -> Option<&Term> {
        let state = self.level(level);
        state.selected().and_then(|id| state.child(id))
    }

    /// Whether the level is offered for input: level one always, deeper levels only once
    /// their parent has a selection.
    pub fn is_available(&self, level: Level) -> bool {
        match level.parent() {
            None => true,
            Some(parent) => self.level(parent).selected.is_some(),
        }
    }

    fn level_mut(&mut self, level: Level) -> &mut LevelState {
        &mut self.levels[level.index()]
    }
}

/// A children lookup the controller wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub level: Level,
    pub parent: TermId,
    pub token: u64,
}

#[derive(Debug, Clone)]
pub struct FetchCompletion {
    pub request: FetchRequest,
    pub result: Result<Vec<Term>, FetchError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionRejected {
    #[error("level {level} has no parent selection")]
    ParentNotSelected { level: Level },
    #[error("term {term} is not among the options of level {level}")]
    UnknownTerm { level: Level, term: TermId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Applied { fetch: Option<FetchRequest> },
    Unchanged,
    Rejected(SelectionRejected),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Loaded { level: Level, count: usize },
    Failed { level: Level, error: FetchError },
    /// Superseded by a newer selection; nothing was changed.
    Stale { level: Level },
}

/// The cascading selection state machine.
///
/// Every issued [`FetchRequest`] carries a token from a single increasing counter. A level
/// only accepts the completion whose token matches its outstanding request, so results
/// for abandoned parents are dropped on arrival.
#[derive(Debug, Clone)]
pub struct CascadeController {
    anchor: TermId,
    state: SelectionState,
    pending: [Option<FetchRequest>; 3],
    next_token: u64,
}

impl CascadeController {
    pub fn new(anchor: TermId) -> Self {
        Self {
            anchor,
            state: SelectionState::default(),
            pending: [None, None, None],
            next_token: 1,
        }
    }

    pub fn anchor(&self) -> &TermId {
        &self.anchor
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn pending(&self, level: Level) -> Option<&FetchRequest> {
        self.pending[level.index()].as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.iter().any(Option::is_some)
    }

    /// Starts loading level one under the anchor, discarding any previous state.
    pub fn mount(&mut self) -> FetchRequest {
        info!(anchor = %self.anchor, "mounting term cascade");
        self.issue(Level::One, self.anchor.clone())
    }

    /// Applies a user choice at `level`; `None` is the empty placeholder option.
    pub fn select(&mut self, level: Level, term: Option<TermId>) -> Transition {
        if self.state.level(level).selected == term {
            return Transition::Unchanged;
        }

        if let Some(id) = &term {
            if !self.state.is_available(level) {
                let rejected = SelectionRejected::ParentNotSelected { level };
                warn!(%level, term = %id, "ignoring selection: {rejected}");
                return Transition::Rejected(rejected);
            }
            if self.state.level(level).child(id).is_none() {
                let rejected = SelectionRejected::UnknownTerm {
                    level,
                    term: id.clone(),
                };
                warn!(%level, term = %id, "ignoring selection: {rejected}");
                return Transition::Rejected(rejected);
            }
        }

        debug!(%level, term = ?term, "selection changed");
        self.state.level_mut(level).selected = term.clone();

        let fetch = match (term, level.child()) {
            (Some(parent), Some(child)) => Some(self.issue(child, parent)),
            _ => {
                self.reset_descendants(level);
                None
            }
        };
        Transition::Applied { fetch }
    }

    /// Re-issues the fetch of a level whose last load failed.
    pub fn retry(&mut self, level: Level) -> Option<FetchRequest> {
        if !matches!(self.state.level(level).status, LoadStatus::Failed(_)) {
            return None;
        }
        let parent = self.parent_of(level)?;
        debug!(%level, %parent, "retrying failed level");
        Some(self.issue(level, parent))
    }

    pub fn complete(&mut self, completion: FetchCompletion) -> CompletionOutcome {
        let FetchCompletion { request, result } = completion;
        let level = request.level;

        let is_current = self.pending[level.index()].as_ref() == Some(&request)
            && self.parent_of(level).as_ref() == Some(&request.parent);
        if !is_current {
            debug!(
                %level,
                parent = %request.parent,
                token = request.token,
                "discarding stale term fetch"
            );
            return CompletionOutcome::Stale { level };
        }
        self.pending[level.index()] = None;

        let slot = self.state.level_mut(level);
        match result {
            Ok(children) => {
                let count = children.len();
                debug!(%level, parent = %request.parent, count, "term fetch applied");
                slot.children = children;
                slot.status = LoadStatus::Loaded;
                CompletionOutcome::Loaded { level, count }
            }
            Err(error) => {
                warn!(%level, parent = %request.parent, "term fetch failed: {error}");
                slot.children.clear();
                slot.status = LoadStatus::Failed(error.clone());
                CompletionOutcome::Failed { level, error }
            }
        }
    }

    fn parent_of(&self, level: Level) -> Option<TermId> {
        match level.parent() {
            None => Some(self.anchor.clone()),
            Some(parent) => self.state.level(parent).selected.clone(),
        }
    }

    /// Puts `level` into loading under `parent`; the level and everything below it
    /// are reset and any older outstanding request for them is forgotten.
    fn issue(&mut self, level: Level, parent: TermId) -> FetchRequest {
        let request = FetchRequest {
            level,
            parent,
            token: self.next_token,
        };
        self.next_token += 1;

        *self.state.level_mut(level) = LevelState::loading();
        self.pending[level.index()] = Some(request.clone());
        self.reset_descendants(level);

        debug!(
            %level,
            parent = %request.parent,
            token = request.token,
            "issuing term fetch"
        );
        request
    }

    fn reset_descendants(&mut self, level: Level) {
        for descendant in level.descendants() {
            *self.state.level_mut(descendant) = LevelState::default();
            self.pending[descendant.index()] = None;
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
