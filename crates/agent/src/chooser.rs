//! Interactive option chooser
//!
//! Local state for one `present-options` prompt. Nothing leaves the chooser
//! until the selection is valid for the prompt's flags.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tools::OptionsPrompt;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("◆ UNKNOWN OPTION: {0}")]
    UnknownOption(String),

    #[error("◆ NOTHING SELECTED")]
    Empty,

    #[error("◆ CUSTOM INPUT NOT ALLOWED")]
    CustomNotAllowed,

    #[error("◆ ONLY ONE ANSWER ALLOWED")]
    SingleSelect,
}

/// The human's answer; becomes the tool result verbatim
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(default)]
    pub selected_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_text: Option<String>,
}

impl Selection {
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected_ids: ids.into_iter().map(Into::into).collect(),
            custom_text: None,
        }
    }

    pub fn custom(text: impl Into<String>) -> Self {
        Self {
            selected_ids: Vec::new(),
            custom_text: Some(text.into()),
        }
    }

    /// Check this answer against the prompt it responds to
    pub fn check(&self, prompt: &OptionsPrompt) -> Result<(), SelectionError> {
        for id in &self.selected_ids {
            if prompt.option(id).is_none() {
                return Err(SelectionError::UnknownOption(id.clone()));
            }
        }

        let custom = self
            .custom_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        if custom.is_some() && !prompt.allow_custom {
            return Err(SelectionError::CustomNotAllowed);
        }

        let answers = self.selected_ids.len() + usize::from(custom.is_some());
        if answers == 0 {
            return Err(SelectionError::Empty);
        }
        if !prompt.allow_multiple && answers > 1 {
            return Err(SelectionError::SingleSelect);
        }
        Ok(())
    }
}

/// What a choice did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceOutcome {
    /// Single-select: the choice is the answer
    Submitted(Selection),
    /// Multi-select: toggled, waiting for confirm
    Toggled { selected: bool },
}

#[derive(Debug, Clone)]
pub struct OptionChooser {
    prompt: OptionsPrompt,
    selected: Vec<String>,
    custom: Option<String>,
}

impl OptionChooser {
    pub fn new(prompt: OptionsPrompt) -> Self {
        Self {
            prompt,
            selected: Vec::new(),
            custom: None,
        }
    }

    pub fn prompt(&self) -> &OptionsPrompt {
        &self.prompt
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    pub fn custom(&self) -> Option<&str> {
        self.custom.as_deref()
    }

    /// Pick an option. Single-select submits at once; multi-select toggles.
    pub fn choose(&mut self, id: &str) -> Result<ChoiceOutcome, SelectionError> {
        if self.prompt.option(id).is_none() {
            return Err(SelectionError::UnknownOption(id.to_string()));
        }

        if !self.prompt.allow_multiple {
            self.selected = vec![id.to_string()];
            self.custom = None;
            return Ok(ChoiceOutcome::Submitted(Selection::ids([id])));
        }

        if let Some(pos) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(pos);
            Ok(ChoiceOutcome::Toggled { selected: false })
        } else {
            self.selected.push(id.to_string());
            Ok(ChoiceOutcome::Toggled { selected: true })
        }
    }

    /// Set the free-text "other" answer. On a single-select prompt this
    /// replaces any discrete choice.
    pub fn set_custom(&mut self, text: impl Into<String>) -> Result<(), SelectionError> {
        if !self.prompt.allow_custom {
            return Err(SelectionError::CustomNotAllowed);
        }
        let text = text.into();
        if text.trim().is_empty() {
            self.custom = None;
            return Ok(());
        }
        if !self.prompt.allow_multiple {
            self.selected.clear();
        }
        self.custom = Some(text.trim().to_string());
        Ok(())
    }

    /// Build the answer, rejecting anything the prompt does not allow
    pub fn confirm(&self) -> Result<Selection, SelectionError> {
        let selection = Selection {
            selected_ids: self.selected.clone(),
            custom_text: self.custom.clone(),
        };
        selection.check(&self.prompt)?;
        Ok(selection)
    }
}
