//! Source bundles the agent can add by id

use serde::Serialize;

use crate::model::{Priority, SourceCategory, SourceDraft, UpdateFrequency};

/// A named bundle of source drafts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub sources: Vec<SourceDraft>,
}

/// Resolves bundle ids to templates
pub trait TemplateLookup: Send + Sync {
    fn lookup(&self, id: &str) -> Option<SourceTemplate>;
    fn templates(&self) -> Vec<SourceTemplate>;
}

/// The catalog shipped with the binary
#[derive(Debug, Clone)]
pub struct BuiltinTemplates {
    templates: Vec<SourceTemplate>,
}

fn draft(
    category: SourceCategory,
    name: &str,
    identifier: &str,
    priority: Priority,
    frequency: UpdateFrequency,
) -> SourceDraft {
    SourceDraft::new(category, name, identifier)
        .with_priority(priority)
        .with_frequency(frequency)
}

impl BuiltinTemplates {
    pub fn new() -> Self {
        use Priority::*;
        use SourceCategory::*;
        use UpdateFrequency::*;

        let template = |id: &str, name: &str, description: &str, sources: Vec<SourceDraft>| {
            SourceTemplate {
                id: id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                sources,
            }
        };

        Self {
            templates: vec![
                template(
                    "tech-news",
                    "Tech News Bundle",
                    "TechCrunch, The Verge, Ars Technica, Hacker News",
                    vec![
                        draft(News, "TechCrunch", "https://techcrunch.com", High, Hourly),
                        draft(News, "The Verge", "https://theverge.com", High, Hourly),
                        draft(News, "Ars Technica", "https://arstechnica.com", Medium, Daily),
                        draft(News, "Hacker News", "https://news.ycombinator.com/rss", Medium, Hourly),
                    ],
                ),
                template(
                    "social-media",
                    "Social Media Bundle",
                    "Twitter/X, LinkedIn, Reddit",
                    vec![
                        draft(Social, "Twitter/X", "https://x.com", High, Realtime),
                        draft(Social, "LinkedIn", "https://linkedin.com", Medium, Hourly),
                        draft(Social, "Reddit", "https://reddit.com", Medium, Hourly),
                    ],
                ),
                template(
                    "financial-news",
                    "Financial News Bundle",
                    "Bloomberg, Reuters, Financial Times",
                    vec![
                        draft(News, "Bloomberg", "https://bloomberg.com", High, Realtime),
                        draft(News, "Reuters", "https://reuters.com", High, Realtime),
                        draft(News, "Financial Times", "https://ft.com", High, Hourly),
                    ],
                ),
                template(
                    "regulatory",
                    "Regulatory & Filings",
                    "SEC EDGAR, Federal Register",
                    vec![
                        draft(Financial, "SEC EDGAR", "https://www.sec.gov/edgar", High, Daily),
                        draft(Government, "Federal Register", "https://federalregister.gov", Medium, Daily),
                    ],
                ),
                template(
                    "developer",
                    "Developer Sources",
                    "GitHub, Stack Overflow, Dev.to",
                    vec![
                        draft(Code, "GitHub", "https://github.com", High, Hourly),
                        draft(Website, "Stack Overflow", "https://stackoverflow.com", Medium, Daily),
                        draft(Website, "Dev.to", "https://dev.to", Low, Daily),
                    ],
                ),
            ],
        }
    }
}

impl Default for BuiltinTemplates {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateLookup for BuiltinTemplates {
    fn lookup(&self, id: &str) -> Option<SourceTemplate> {
        self.templates.iter().find(|t| t.id == id).cloned()
    }

    fn templates(&self) -> Vec<SourceTemplate> {
        self.templates.clone()
    }
}
