//! Context builder for assembling agent prompts

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::debug;

use monitask_provider::Message;
use monitask_task::{Task, TemplateLookup};

/// Builds the system prompt and the message list for each model round
pub struct ContextBuilder {
    data_dir: PathBuf,
}

impl ContextBuilder {
    /// Extra instructions picked up from the data directory
    const BOOTSTRAP_FILES: &'static [&'static str] = &["PROMPT.md"];

    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub async fn build_system_prompt(&self, templates: &dyn TemplateLookup, task: &Task) -> String {
        let mut parts = vec![self.identity(), Self::bundles(templates)];

        if let Ok(bootstrap) = self.load_bootstrap_files().await {
            if !bootstrap.is_empty() {
                parts.push(bootstrap);
            }
        }

        parts.push(Self::task_state(task));
        parts.join("\n\n---\n\n")
    }

    fn identity(&self) -> String {
        let now = Local::now().format("%Y-%m-%d %H:%M (%A)");

        format!(
            r#"# monitask

You help the user set up a monitoring task: what to watch, where to watch it, and why.

## Flow
1. Find out the topic. If it is vague, use present-options to narrow it down.
2. Identify the entities (companies, people, products, organizations).
3. Collect keywords.
4. Pick sources. Prefer a bundle when one fits.
5. Confirm with finalize-task once scope and sources are in place.

## Tools
- present-options: ask ONE question with 2-8 options. Set allowMultiple to false when only one answer makes sense. Wait for the answer.
- update-scope: call as soon as you learn something. Keywords and entities are merged, never replaced.
- add-sources: give either a list of sources or a bundle id, never both.
- finalize-task: summarize the monitoring logic. The user creates the task themselves afterwards.

If a tool result has "success": false, read the error and call the tool again with corrected input.
Keep replies short. Do not repeat the task back in prose; the user sees it live.

## Current Time
{}"#,
            now
        )
    }

    fn bundles(templates: &dyn TemplateLookup) -> String {
        let mut lines = vec!["## Source bundles".to_string()];
        for template in templates.templates() {
            lines.push(format!(
                "- {}: {} ({})",
                template.id, template.name, template.description
            ));
        }
        lines.join("\n")
    }

    fn task_state(task: &Task) -> String {
        let json = serde_json::to_string_pretty(task).unwrap_or_default();
        format!("## Current task\n\n```json\n{}\n```", json)
    }

    async fn load_bootstrap_files(&self) -> std::io::Result<String> {
        let mut parts = Vec::new();

        for filename in Self::BOOTSTRAP_FILES {
            let path = self.data_dir.join(filename);
            if path.exists() {
                match tokio::fs::read_to_string(&path).await {
                    Ok(content) => {
                        parts.push(format!("## {}\n\n{}", filename, content));
                    }
                    Err(e) => debug!("Failed to read {}: {}", filename, e),
                }
            }
        }

        Ok(parts.join("\n\n"))
    }

    /// System prompt followed by the conversation so far
    pub async fn build_messages(
        &self,
        history: Vec<Message>,
        templates: &dyn TemplateLookup,
        task: &Task,
    ) -> Vec<Message> {
        let system_prompt = self.build_system_prompt(templates, task).await;

        let mut messages = vec![Message::system(system_prompt)];
        messages.extend(history);
        messages
    }
}
