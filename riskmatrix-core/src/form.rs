//! Create/edit mode for record forms
//!
//! Forms that register risks, controls and evaluations switch between
//! creating a new record and editing an existing one. The mode is an
//! explicit value advanced by a pure reducer.
//!
//! This is state for the rendering layer that hosts those forms. The
//! scoring engine never reads it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FormMode {
    #[default]
    Creating,
    Editing { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// A row was picked for editing
    Edit(String),
    /// The record was saved
    Saved,
    /// The user discarded the edit
    Cancelled,
    /// The record being edited was deleted elsewhere
    Deleted(String),
}

impl FormMode {
    pub fn editing_id(&self) -> Option<&str> {
        match self {
            FormMode::Creating => None,
            FormMode::Editing { id } => Some(id),
        }
    }
}

/// Next form mode after an event
pub fn reduce(mode: FormMode, event: FormEvent) -> FormMode {
    match (mode, event) {
        (_, FormEvent::Edit(id)) => FormMode::Editing { id },
        (_, FormEvent::Saved) | (_, FormEvent::Cancelled) => FormMode::Creating,
        (FormMode::Editing { id }, FormEvent::Deleted(deleted)) if id == deleted => {
            FormMode::Creating
        }
        (mode, FormEvent::Deleted(_)) => mode,
    }
}
