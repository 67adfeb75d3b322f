//! Three-level cascading term selection.
//!
//! [`CascadeController`] owns the selection state and decides which levels are reset and
//! which children must be fetched. [`CascadeSession`] binds it to a
//! [`term_store::TermRepository`] and a tokio runtime.

mod controller;
mod session;

pub use controller::{
    CascadeController, CompletionOutcome, FetchCompletion, FetchRequest, LevelState, LoadStatus,
    SelectionRejected, SelectionState, Transition,
};
pub use session::CascadeSession;
