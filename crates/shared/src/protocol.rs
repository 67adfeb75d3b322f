//! Wire shapes of the term-store `children` endpoint.

use serde::{Deserialize, Serialize};

use crate::{
    domain::{Term, TermId},
    error::FetchError,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermCollection {
    pub value: Vec<WireTerm>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireTerm {
    pub id: String,
    #[serde(default)]
    pub labels: Vec<WireLabel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLabel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_tag: Option<String>,
}

impl WireTerm {
    pub fn labelled(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            labels: vec![WireLabel {
                name: name.into(),
                is_default: None,
                language_tag: None,
            }],
        }
    }
}

impl TryFrom<WireTerm> for Term {
    type Error = FetchError;

    fn try_from(wire: WireTerm) -> Result<Self, Self::Error> {
        let id = TermId::new(wire.id)
            .map_err(|_| FetchError::malformed("term without an id"))?;
        let label = wire
            .labels
            .into_iter()
            .next()
            .map(|label| label.name)
            .ok_or_else(|| FetchError::malformed(format!("term {id} has no labels")))?;
        if label.trim().is_empty() {
            return Err(FetchError::malformed(format!("term {id} has a blank label")));
        }
        Ok(Term { id, label })
    }
}

impl TermCollection {
    /// Validates every entry; a single malformed entry fails the whole collection.
    pub fn into_terms(self) -> Result<Vec<Term>, FetchError> {
        self.value.into_iter().map(Term::try_from).collect()
    }
}
