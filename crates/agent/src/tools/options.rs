//! present-options: a question with clickable answers

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const MIN_OPTIONS: usize = 2;
const MAX_OPTIONS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionItem {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A validated option set, ready to render as a chooser
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsPrompt {
    pub question: String,
    pub options: Vec<OptionItem>,
    pub allow_multiple: bool,
    pub allow_custom: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPrompt {
    question: String,
    options: Vec<OptionItem>,
    #[serde(default, alias = "allow_multiple")]
    allow_multiple: Option<bool>,
    #[serde(default, alias = "allowOther", alias = "allow_custom")]
    allow_custom: Option<bool>,
}

impl OptionsPrompt {
    pub fn from_value(input: &Value) -> Result<Self, String> {
        let raw: RawPrompt = serde_json::from_value(input.clone()).map_err(|e| e.to_string())?;

        if raw.question.trim().is_empty() {
            return Err("question must not be empty".to_string());
        }
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&raw.options.len()) {
            return Err(format!(
                "expected {}-{} options, got {}",
                MIN_OPTIONS,
                MAX_OPTIONS,
                raw.options.len()
            ));
        }

        let mut seen = HashSet::new();
        for option in &raw.options {
            if option.id.trim().is_empty() || option.label.trim().is_empty() {
                return Err("every option needs an id and a label".to_string());
            }
            if !seen.insert(option.id.as_str()) {
                return Err(format!("duplicate option id '{}'", option.id));
            }
        }

        Ok(Self {
            question: raw.question,
            options: raw.options,
            allow_multiple: raw.allow_multiple.unwrap_or(true),
            allow_custom: raw.allow_custom.unwrap_or(true),
        })
    }

    pub fn option(&self, id: &str) -> Option<&OptionItem> {
        self.options.iter().find(|o| o.id == id)
    }
}

pub(crate) fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "question": {"type": "string", "description": "The question to ask"},
            "options": {
                "type": "array",
                "minItems": MIN_OPTIONS,
                "maxItems": MAX_OPTIONS,
                "items": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "label": {"type": "string"},
                        "description": {"type": "string"}
                    },
                    "required": ["id", "label"]
                }
            },
            "allowMultiple": {"type": "boolean", "default": true},
            "allowCustom": {"type": "boolean", "default": true, "description": "Offer an 'other' free-text answer"}
        },
        "required": ["question", "options"]
    })
}
