//! Vocabulary shared by the term store adapter, the cascade controller and the picker app.

pub mod domain;
pub mod error;
pub mod protocol;
