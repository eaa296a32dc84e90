//! finalize-task: record the monitoring logic

use monitask_task::Logic;
use serde_json::{json, Value};

pub(crate) fn parse(input: &Value) -> Result<Logic, String> {
    let logic: Logic = serde_json::from_value(input.clone()).map_err(|e| e.to_string())?;
    if logic.summary.trim().is_empty() {
        return Err("summary must not be empty".into());
    }
    Ok(logic)
}

pub(crate) fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary": {"type": "string", "description": "One or two sentences describing what is monitored and how"},
            "rules": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "condition": {"type": "string"},
                        "action": {"type": "string"}
                    },
                    "required": ["condition", "action"]
                }
            }
        },
        "required": ["summary"]
    })
}
