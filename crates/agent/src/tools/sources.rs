//! add-sources: explicit drafts or a named bundle

use monitask_task::{SourceDraft, TemplateLookup};
use serde::Deserialize;
use serde_json::{json, Value};

/// What the agent asked for, before bundle resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcesRequest {
    Drafts(Vec<SourceDraft>),
    Bundle(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequest {
    #[serde(default)]
    sources: Option<Vec<SourceDraft>>,
    #[serde(default, alias = "templateId", alias = "template")]
    bundle: Option<String>,
}

pub(crate) fn parse(input: &Value) -> Result<SourcesRequest, String> {
    let raw: RawRequest = serde_json::from_value(input.clone()).map_err(|e| e.to_string())?;

    match (raw.sources, raw.bundle) {
        (Some(_), Some(_)) => Err("give either sources or bundle, not both".into()),
        (None, None) => Err("give either sources or bundle".into()),
        (Some(drafts), None) => {
            if drafts.is_empty() {
                return Err("sources must not be empty".into());
            }
            if drafts
                .iter()
                .any(|d| d.name.trim().is_empty() || d.identifier.trim().is_empty())
            {
                return Err("every source needs a name and an identifier".into());
            }
            Ok(SourcesRequest::Drafts(drafts))
        }
        (None, Some(bundle)) => Ok(SourcesRequest::Bundle(bundle.trim().to_string())),
    }
}

pub(crate) fn schema(templates: &dyn TemplateLookup) -> Value {
    let bundles: Vec<String> = templates.templates().into_iter().map(|t| t.id).collect();

    json!({
        "type": "object",
        "properties": {
            "sources": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "category": {
                            "type": "string",
                            "enum": ["website", "social", "news", "financial", "code", "government", "custom"]
                        },
                        "name": {"type": "string"},
                        "identifier": {"type": "string", "description": "URL, handle or free text"},
                        "priority": {"type": "string", "enum": ["high", "medium", "low"]},
                        "updateFrequency": {"type": "string", "enum": ["realtime", "hourly", "daily", "weekly"]}
                    },
                    "required": ["category", "name", "identifier"]
                }
            },
            "bundle": {"type": "string", "enum": bundles, "description": "Add a predefined source bundle"}
        }
    })
}
