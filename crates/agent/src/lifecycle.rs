//! Tool invocation lifecycle
//!
//! An invocation moves `streaming -> input-complete -> resolved` and never
//! back. What the rendering layer shows for it is a pure function of
//! (tool name, state, input, output), see [`classify`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chooser::Selection;
use crate::tools::{OptionsPrompt, ToolClass, ToolKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolState {
    Streaming,
    InputComplete,
    Resolved,
}

impl ToolState {
    fn rank(self) -> u8 {
        match self {
            ToolState::Streaming => 0,
            ToolState::InputComplete => 1,
            ToolState::Resolved => 2,
        }
    }

    /// Only single forward steps are allowed
    pub fn can_advance_to(self, next: ToolState) -> bool {
        next.rank() == self.rank() + 1
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolState::Streaming => "streaming",
            ToolState::InputComplete => "input-complete",
            ToolState::Resolved => "resolved",
        }
    }
}

/// One tool call inside an assistant message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub state: ToolState,
    /// Raw argument text seen while streaming
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub partial_input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
}

impl ToolInvocation {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            state: ToolState::Streaming,
            partial_input: String::new(),
            input: None,
            output: None,
        }
    }

    pub fn kind(&self) -> Option<ToolKind> {
        ToolKind::from_name(&self.name)
    }

    pub fn is_resolved(&self) -> bool {
        self.state == ToolState::Resolved
    }

    /// Move to the input-complete state. False if that would not be a
    /// single forward step.
    pub fn complete_input(&mut self, input: Value) -> bool {
        if !self.state.can_advance_to(ToolState::InputComplete) {
            return false;
        }
        self.input = Some(input);
        self.state = ToolState::InputComplete;
        true
    }

    /// Attach a result. False unless the input is complete.
    pub fn resolve(&mut self, output: Value) -> bool {
        if !self.state.can_advance_to(ToolState::Resolved) {
            return false;
        }
        self.output = Some(output);
        self.state = ToolState::Resolved;
        true
    }

    pub fn view(&self) -> ToolView {
        classify(
            &self.name,
            self.state,
            self.input.as_ref(),
            self.output.as_ref(),
        )
    }
}

/// What the rendering layer should draw for a tool part
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "kebab-case")]
pub enum ToolView {
    /// Input still arriving
    Placeholder { label: String },
    /// Server tool with complete input, result not attached yet
    Working { label: String },
    /// Interactive chooser waiting on the human
    Chooser { prompt: OptionsPrompt },
    /// The human answered a chooser
    Answered {
        question: String,
        answers: Vec<String>,
    },
    /// Server tool applied
    Applied { summary: String },
    Failed { error: String },
}

fn label(name: &str) -> String {
    match ToolKind::from_name(name) {
        Some(ToolKind::PresentOptions) => "Preparing options".to_string(),
        Some(ToolKind::UpdateScope) => "Updating scope".to_string(),
        Some(ToolKind::AddSources) => "Adding sources".to_string(),
        Some(ToolKind::FinalizeTask) => "Finalizing task".to_string(),
        None => format!("Running {}", name),
    }
}

fn failure(output: &Value) -> Option<String> {
    if output.get("success").and_then(Value::as_bool) == Some(false) {
        let error = output
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("tool failed");
        return Some(error.to_string());
    }
    None
}

fn applied_summary(kind: ToolKind, input: Option<&Value>, output: &Value) -> String {
    match kind {
        ToolKind::UpdateScope => {
            let mut parts = Vec::new();
            let updates = output.get("updates").or(input);
            if let Some(topic) = updates.and_then(|u| u.get("topic")).and_then(Value::as_str) {
                parts.push(format!("topic \"{}\"", topic));
            }
            for (field, noun) in [("keywords", "keyword"), ("entities", "entity")] {
                let count = updates
                    .and_then(|u| u.get(field))
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len);
                if count > 0 {
                    let plural = if count == 1 {
                        noun.to_string()
                    } else if noun.ends_with('y') {
                        format!("{}ies", noun.trim_end_matches('y'))
                    } else {
                        format!("{}s", noun)
                    };
                    parts.push(format!("{} {}", count, plural));
                }
            }
            if parts.is_empty() {
                "Scope updated".to_string()
            } else {
                format!("Scope updated: {}", parts.join(", "))
            }
        }
        ToolKind::AddSources => {
            let added = output.get("added").and_then(Value::as_u64).unwrap_or(0);
            match output.get("bundle").and_then(Value::as_str) {
                Some(bundle) => format!("Added {} sources from {}", added, bundle),
                None => format!("Added {} sources", added),
            }
        }
        ToolKind::FinalizeTask => {
            let summary = output
                .get("summary")
                .or_else(|| input.and_then(|i| i.get("summary")))
                .and_then(Value::as_str)
                .unwrap_or("");
            format!("Task finalized: {}", summary)
        }
        ToolKind::PresentOptions => "Answered".to_string(),
    }
}

fn answered(input: Option<&Value>, output: &Value) -> ToolView {
    let prompt = input.and_then(|i| OptionsPrompt::from_value(i).ok());
    let selection: Option<Selection> = serde_json::from_value(output.clone()).ok();

    let mut answers = Vec::new();
    if let Some(selection) = &selection {
        for id in &selection.selected_ids {
            let text = prompt
                .as_ref()
                .and_then(|p| p.option(id))
                .map(|o| o.label.clone())
                .unwrap_or_else(|| id.clone());
            answers.push(text);
        }
        if let Some(custom) = &selection.custom_text {
            answers.push(custom.clone());
        }
    }

    ToolView::Answered {
        question: prompt.map(|p| p.question).unwrap_or_default(),
        answers,
    }
}

/// Derive the view for a tool part from its data alone
pub fn classify(
    name: &str,
    state: ToolState,
    input: Option<&Value>,
    output: Option<&Value>,
) -> ToolView {
    let kind = ToolKind::from_name(name);

    match state {
        ToolState::Streaming => ToolView::Placeholder { label: label(name) },
        ToolState::InputComplete => match kind.map(|k| k.class()) {
            Some(ToolClass::Client) => match input.map(OptionsPrompt::from_value) {
                Some(Ok(prompt)) => ToolView::Chooser { prompt },
                Some(Err(e)) => ToolView::Failed { error: e },
                None => ToolView::Failed {
                    error: "missing input".to_string(),
                },
            },
            _ => ToolView::Working { label: label(name) },
        },
        ToolState::Resolved => {
            let Some(output) = output else {
                return ToolView::Failed {
                    error: "missing result".to_string(),
                };
            };
            if let Some(error) = failure(output) {
                return ToolView::Failed { error };
            }
            match kind {
                Some(ToolKind::PresentOptions) => answered(input, output),
                Some(kind) => ToolView::Applied {
                    summary: applied_summary(kind, input, output),
                },
                None => ToolView::Failed {
                    error: format!("unknown tool {}", name),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options_input() -> Value {
        json!({
            "question": "Which aspect?",
            "options": [{"id": "a", "label": "Price"}, {"id": "b", "label": "Earnings"}],
            "allowMultiple": false
        })
    }

    #[test]
    fn test_state_steps() {
        assert!(ToolState::Streaming.can_advance_to(ToolState::InputComplete));
        assert!(ToolState::InputComplete.can_advance_to(ToolState::Resolved));
        assert!(!ToolState::Streaming.can_advance_to(ToolState::Resolved));
        assert!(!ToolState::Resolved.can_advance_to(ToolState::Streaming));
        assert!(!ToolState::Resolved.can_advance_to(ToolState::InputComplete));
        assert!(!ToolState::InputComplete.can_advance_to(ToolState::InputComplete));
    }

    #[test]
    fn test_invocation_never_skips_or_regresses() {
        let mut call = ToolInvocation::new("c1", "update-scope");
        assert!(!call.resolve(json!({"success": true})));
        assert_eq!(call.state, ToolState::Streaming);

        assert!(call.complete_input(json!({"topic": "Tesla"})));
        assert!(!call.complete_input(json!({"topic": "Ford"})));
        assert_eq!(call.input, Some(json!({"topic": "Tesla"})));

        assert!(call.resolve(json!({"success": true})));
        assert!(!call.resolve(json!({"success": false})));
        assert!(!call.complete_input(json!({})));
        assert_eq!(call.state, ToolState::Resolved);
        assert_eq!(call.output, Some(json!({"success": true})));
    }

    #[test]
    fn test_classify_streaming_is_placeholder() {
        assert_eq!(
            classify("add-sources", ToolState::Streaming, None, None),
            ToolView::Placeholder {
                label: "Adding sources".into()
            }
        );
    }

    #[test]
    fn test_classify_client_input_complete_is_chooser() {
        let input = options_input();
        match classify("present-options", ToolState::InputComplete, Some(&input), None) {
            ToolView::Chooser { prompt } => {
                assert_eq!(prompt.options.len(), 2);
                assert!(!prompt.allow_multiple);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_classify_answered_uses_labels() {
        let input = options_input();
        let output = json!({"selectedIds": ["a"], "customText": "dividends"});
        assert_eq!(
            classify("presentOptions", ToolState::Resolved, Some(&input), Some(&output)),
            ToolView::Answered {
                question: "Which aspect?".into(),
                answers: vec!["Price".into(), "dividends".into()]
            }
        );
    }

    #[test]
    fn test_classify_server_results() {
        let output = json!({"success": true, "added": 3, "sourceIds": ["x", "y", "z"], "bundle": "financial-news"});
        assert_eq!(
            classify("add-sources", ToolState::Resolved, None, Some(&output)),
            ToolView::Applied {
                summary: "Added 3 sources from financial-news".into()
            }
        );

        let input = json!({"topic": "Tesla", "keywords": ["stock"], "entities": [{"name": "Tesla", "type": "company"}]});
        let output = json!({"success": true, "updates": input.clone()});
        assert_eq!(
            classify("update-scope", ToolState::Resolved, Some(&input), Some(&output)),
            ToolView::Applied {
                summary: "Scope updated: topic \"Tesla\", 1 keyword, 1 entity".into()
            }
        );
    }

    #[test]
    fn test_classify_failure_result() {
        let output = json!({"success": false, "error": "unknown bundle"});
        assert_eq!(
            classify("add-sources", ToolState::Resolved, None, Some(&output)),
            ToolView::Failed {
                error: "unknown bundle".into()
            }
        );
    }

    #[test]
    fn test_classify_is_pure() {
        let input = options_input();
        let a = classify("present-options", ToolState::InputComplete, Some(&input), None);
        let b = classify("present-options", ToolState::InputComplete, Some(&input), None);
        assert_eq!(a, b);
    }
}
