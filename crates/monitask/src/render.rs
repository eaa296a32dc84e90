//! Terminal rendering of conversation updates

use std::collections::HashMap;

use monitask_agent::{ToolView, Update};
use monitask_task::{GateStatus, Task};

/// Turns reconciler updates into terminal output, drawing each tool part
/// only when its view changes
#[derive(Debug, Default)]
pub struct Renderer {
    views: HashMap<String, ToolView>,
    mid_text: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text to print for an update, if any
    pub fn render(&mut self, update: &Update) -> Option<String> {
        match update {
            Update::Text(text) => {
                self.mid_text = true;
                Some(text.clone())
            }
            Update::Tool { id, view, .. } => {
                if self.views.get(id) == Some(view) {
                    return None;
                }
                self.views.insert(id.clone(), view.clone());
                let line = tool_line(view)?;
                Some(self.break_text(format!("  {}\n", line)))
            }
            Update::TurnComplete { .. } => {
                if self.mid_text {
                    self.mid_text = false;
                    Some("\n".to_string())
                } else {
                    None
                }
            }
        }
    }

    fn break_text(&mut self, line: String) -> String {
        if self.mid_text {
            self.mid_text = false;
            format!("\n{}", line)
        } else {
            line
        }
    }
}

/// Choosers are drawn by the chat loop once the turn settles
fn tool_line(view: &ToolView) -> Option<String> {
    match view {
        ToolView::Placeholder { label } | ToolView::Working { label } => {
            Some(format!("◇ {}...", label))
        }
        ToolView::Chooser { .. } => None,
        ToolView::Answered { question, answers } => {
            Some(format!("✓ {} → {}", question, answers.join(", ")))
        }
        ToolView::Applied { summary } => Some(format!("✓ {}", summary)),
        ToolView::Failed { error } => Some(format!("✗ {}", error)),
    }
}

/// Human-readable task summary for `/task` and `status`
pub fn task_summary(task: &Task, gate: &GateStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!("Task:      {} [{}]\n", task.id, task.status));
    out.push_str(&format!(
        "Topic:     {}\n",
        task.scope.topic.as_deref().unwrap_or("-")
    ));
    if let Some(intent) = &task.scope.intent {
        out.push_str(&format!("Intent:    {}\n", intent));
    }
    if !task.scope.keywords.is_empty() {
        out.push_str(&format!("Keywords:  {}\n", task.scope.keywords.join(", ")));
    }
    if !task.scope.entities.is_empty() {
        let entities: Vec<String> = task
            .scope
            .entities
            .iter()
            .map(|e| format!("{} ({:?})", e.name, e.entity_type))
            .collect();
        out.push_str(&format!("Entities:  {}\n", entities.join(", ")));
    }

    out.push_str(&format!("Sources:   {}\n", task.sources.len()));
    for source in &task.sources {
        out.push_str(&format!(
            "  {} {} ({})\n",
            if source.enabled { "●" } else { "○" },
            source.name,
            source.identifier
        ));
    }

    if let Some(logic) = &task.logic {
        out.push_str(&format!("Logic:     {}\n", logic.summary));
    }

    out.push_str(&format!(
        "Ready: {}  Finalized: {}  Can create: {}",
        yes_no(gate.ready),
        yes_no(gate.finalized),
        yes_no(gate.can_create)
    ));
    out
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}
