//! Textual annotations attached to images and containers

use serde::{Deserialize, Serialize};

/// Server-assigned annotation identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnnotationId(pub i64);

/// Free-text comment
///
/// Annotations created locally have no id until the server stores them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextualAnnotation {
    #[serde(default)]
    pub id: Option<AnnotationId>,
    pub text: String,
    /// Display name of the annotation owner
    #[serde(default)]
    pub owner: Option<String>,
}

impl TextualAnnotation {
    /// New, unsaved annotation
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            owner: None,
        }
    }

    /// Annotation already stored on the server
    pub fn stored(id: i64, text: impl Into<String>) -> Self {
        Self {
            id: Some(AnnotationId(id)),
            text: text.into(),
            owner: None,
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Same stored annotation (unsaved annotations never match)
    pub fn same_id(&self, other: &TextualAnnotation) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}

/// Pending annotation changes sent to the server in one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataToSave {
    pub to_save: Vec<TextualAnnotation>,
    pub to_remove: Vec<TextualAnnotation>,
}

impl DataToSave {
    pub fn new(to_save: Vec<TextualAnnotation>, to_remove: Vec<TextualAnnotation>) -> Self {
        Self { to_save, to_remove }
    }

    pub fn is_empty(&self) -> bool {
        self.to_save.is_empty() && self.to_remove.is_empty()
    }
}
