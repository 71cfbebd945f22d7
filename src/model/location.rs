use serde::{Deserialize, Serialize};

/// A club location (marina) as listed on the availability page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Portal-assigned identifier.
    pub id: String,
    pub name: String,
    pub description: String,
    /// Parenthesized detail text from the listing, e.g. a dock name.
    pub details: Option<String>,
}

impl Location {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        details: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            details,
        }
    }

    /// Minimal location used when only the id is known.
    #[must_use]
    pub fn placeholder(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            details: None,
        }
    }
}
