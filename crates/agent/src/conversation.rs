//! Chat session - drives model rounds over the reconciler

use tracing::{debug, info, warn};

use monitask_provider::{ChatParams, Provider, ToolChoice};
use monitask_task::TaskStore;
use serde_json::Value;

use crate::chooser::Selection;
use crate::context::ContextBuilder;
use crate::reconciler::{Reconciler, Update};
use crate::tools::ToolRegistry;
use crate::{AgentError, Result};

/// Model settings for a session
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Rounds allowed per user action
    pub max_rounds: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            model: String::new(),
            max_tokens: 4096,
            temperature: 0.7,
            max_rounds: 8,
        }
    }
}

/// How a user action ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub rounds: u32,
    /// Client prompts now waiting on the human
    pub pending_prompts: usize,
}

/// One conversation with the engine, owning the reconciler and its store
pub struct ChatSession<P: Provider> {
    provider: P,
    reconciler: Reconciler,
    context: ContextBuilder,
    settings: SessionSettings,
}

impl<P: Provider> ChatSession<P> {
    pub fn new(
        provider: P,
        reconciler: Reconciler,
        context: ContextBuilder,
        settings: SessionSettings,
    ) -> Self {
        Self {
            provider,
            reconciler,
            context,
            settings,
        }
    }

    /// Session over a fresh task with the built-in bundles
    pub fn with_defaults(provider: P, context: ContextBuilder, settings: SessionSettings) -> Self {
        let reconciler = Reconciler::new(TaskStore::new(), ToolRegistry::default());
        Self::new(provider, reconciler, context, settings)
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn reconciler_mut(&mut self) -> &mut Reconciler {
        &mut self.reconciler
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Send user text and run rounds until the agent waits for the human
    pub async fn send<F>(&mut self, text: &str, on_update: F) -> Result<TurnOutcome>
    where
        F: FnMut(&Update) + Send,
    {
        info!("◆ USER: {}", text.chars().take(80).collect::<String>());
        self.reconciler.push_user_text(text);
        self.run(on_update).await
    }

    /// Answer a pending prompt and let the agent continue
    pub async fn submit<F>(
        &mut self,
        invocation_id: &str,
        selection: Selection,
        on_update: F,
    ) -> Result<(Value, TurnOutcome)>
    where
        F: FnMut(&Update) + Send,
    {
        let output = self.reconciler.submit(invocation_id, selection)?;

        // Other prompts from the same message may still be open
        if !self.reconciler.should_continue() {
            return Ok((
                output,
                TurnOutcome {
                    rounds: 0,
                    pending_prompts: self.reconciler.pending_prompts().len(),
                },
            ));
        }

        let outcome = self.run(on_update).await?;
        Ok((output, outcome))
    }

    async fn run<F>(&mut self, mut on_update: F) -> Result<TurnOutcome>
    where
        F: FnMut(&Update) + Send,
    {
        let mut rounds = 0;

        loop {
            rounds += 1;
            if rounds > self.settings.max_rounds {
                return Err(AgentError::MaxIterations);
            }
            debug!("Round {}", rounds);

            let history = self.reconciler.to_provider_messages();
            let messages = self
                .context
                .build_messages(
                    history,
                    self.reconciler.registry().templates(),
                    self.reconciler.store().task(),
                )
                .await;

            let params = ChatParams {
                model: if self.settings.model.is_empty() {
                    self.provider.default_model()
                } else {
                    self.settings.model.clone()
                },
                messages,
                tools: self.reconciler.registry().definitions(),
                max_tokens: self.settings.max_tokens,
                temperature: self.settings.temperature,
                tool_choice: ToolChoice::Auto,
            };

            let mut events = match self.provider.chat_stream(params).await {
                Ok(rx) => rx,
                Err(e) => {
                    self.reconciler.fail_turn(e.to_string());
                    return Err(AgentError::Provider(e.to_string()));
                }
            };

            let mut completed = false;
            while let Some(event) = events.recv().await {
                match event {
                    Ok(event) => {
                        if let Some(update) = self.reconciler.handle_event(event) {
                            completed |= matches!(update, Update::TurnComplete { .. });
                            on_update(&update);
                        }
                    }
                    Err(e) => {
                        self.reconciler.fail_turn(e.to_string());
                        return Err(AgentError::Provider(e.to_string()));
                    }
                }
            }

            if !completed {
                warn!("◆ STREAM ENDED WITHOUT COMPLETION");
                self.reconciler.fail_turn("stream ended before the message completed");
                return Err(AgentError::Provider(
                    "stream ended before the message completed".to_string(),
                ));
            }

            if !self.reconciler.should_continue() {
                break;
            }
        }

        Ok(TurnOutcome {
            rounds,
            pending_prompts: self.reconciler.pending_prompts().len(),
        })
    }
}
