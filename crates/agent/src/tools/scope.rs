//! update-scope: merge topic, keywords and entities into the scope

use monitask_task::ScopeUpdate;
use serde_json::{json, Value};

const ENTITY_TYPES: [&str; 5] = ["company", "person", "product", "organization", "other"];

pub(crate) fn parse(input: &Value) -> Result<ScopeUpdate, String> {
    let update: ScopeUpdate = serde_json::from_value(input.clone()).map_err(|e| e.to_string())?;
    if update.is_empty() {
        return Err("provide at least one of topic, description, keywords, entities, intent".into());
    }
    if let Some(entities) = &update.entities {
        if entities.iter().any(|e| e.name.trim().is_empty()) {
            return Err("entity names must not be empty".into());
        }
    }
    Ok(update)
}

pub(crate) fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "topic": {"type": "string", "description": "Main subject being monitored"},
            "description": {"type": "string"},
            "intent": {"type": "string", "description": "Why the user wants to monitor this"},
            "keywords": {"type": "array", "items": {"type": "string"}},
            "entities": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "type": {"type": "string", "enum": ENTITY_TYPES}
                    },
                    "required": ["name", "type"]
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitask_task::EntityType;

    #[test]
    fn test_parse_full_update() {
        let update = parse(&json!({
            "topic": "Tesla",
            "keywords": ["stock"],
            "entities": [{"name": "Tesla", "type": "company"}]
        }))
        .unwrap();

        assert_eq!(update.topic.as_deref(), Some("Tesla"));
        assert_eq!(update.entities.unwrap()[0].entity_type, EntityType::Company);
    }

    #[test]
    fn test_unknown_entity_type_rejected() {
        let err = parse(&json!({"entities": [{"name": "Tesla", "type": "planet"}]})).unwrap_err();
        assert!(err.contains("unknown variant"));
    }

    #[test]
    fn test_wrong_shape_rejected() {
        assert!(parse(&json!({"keywords": "stock"})).is_err());
    }

    #[test]
    fn test_empty_update_rejected() {
        assert!(parse(&json!({})).is_err());
        assert!(parse(&json!({"keywords": []})).is_err());
    }
}
