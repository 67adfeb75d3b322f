use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use shared::{
    domain::{Term, TermId},
    error::FetchError,
};
use tokio::sync::Mutex;

use crate::TermRepository;

/// In-memory term store. Parents without an entry answer 404 like the real store does.
#[derive(Clone, Default)]
pub struct StaticTermRepository {
    entries: HashMap<TermId, Result<Vec<Term>, FetchError>>,
    calls: Arc<Mutex<Vec<TermId>>>,
}

impl StaticTermRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_children(mut self, parent: TermId, children: Vec<Term>) -> Self {
        self.entries.insert(parent, Ok(children));
        self
    }

    pub fn with_failure(mut self, parent: TermId, error: FetchError) -> Self {
        self.entries.insert(parent, Err(error));
        self
    }

    /// Parents requested so far, in call order.
    pub async fn calls(&self) -> Vec<TermId> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl TermRepository for StaticTermRepository {
    async fn fetch_children(&self, parent: &TermId) -> Result<Vec<Term>, FetchError> {
        self.calls.lock().await.push(parent.clone());
        match self.entries.get(parent) {
            Some(entry) => entry.clone(),
            None => Err(FetchError::status(404, "Not Found")),
        }
    }
}
