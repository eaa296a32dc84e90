//! Monitask command implementations

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use monitask_agent::{
    ChatSession, ContextBuilder, OptionChooser, PendingPrompt, Reconciler, Selection,
    SessionSettings, ToolClass, ToolKind, ToolRegistry, TurnOutcome, Update,
};
use monitask_config::{self, Config};
use monitask_provider::{OpenRouterProvider, Provider};
use monitask_session::SessionManager;
use monitask_task::{BuiltinTemplates, TaskStore, TemplateLookup};

use crate::chooser::{self, ChooserInput, ChooserStep};
use crate::render::{task_summary, Renderer};

const PROMPT_MD: &str = r#"# Extra instructions

Anything written here is added to the assistant's system prompt.

- Keep questions short and offer choices instead of open questions.
- Prefer official and primary sources over aggregators.
"#;

/// Read a trimmed line from stdin; `None` at end of input
fn read_line() -> Result<Option<String>> {
    let mut input = String::new();
    let n = std::io::stdin().read_line(&mut input)?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

fn prompt_marker(marker: &str) -> Result<()> {
    print!("{}", marker);
    std::io::stdout().flush()?;
    Ok(())
}

fn print_update(renderer: &mut Renderer, update: &Update) {
    if let Some(out) = renderer.render(update) {
        print!("{}", out);
        let _ = std::io::stdout().flush();
    }
}

fn session_key(session: &str) -> String {
    format!("cli:{}", session)
}

/// Saves the task after each turn when persistence is on
struct Persistence {
    manager: SessionManager,
    key: String,
}

impl Persistence {
    async fn restore(&self, store: &mut TaskStore) {
        if let Some(record) = self.manager.load(&self.key).await {
            info!("◆ SESSION RESTORED: {}", self.key);
            record.restore_into(store);
        }
    }

    async fn save(&mut self, store: &TaskStore) -> Result<()> {
        let record = self.manager.get_or_create(&self.key).await;
        record.capture(store);
        let record = record.clone();
        self.manager
            .save(&record)
            .await
            .with_context(|| format!("saving session {}", self.key))
    }

    async fn forget(&mut self) -> Result<()> {
        self.manager.delete(&self.key).await?;
        Ok(())
    }
}

/// Initialize config and data directory
pub async fn init_command() -> Result<()> {
    println!("◆ Initializing monitask...");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = monitask_config::init().await?;
    tokio::fs::create_dir_all(config.sessions_dir()).await?;
    create_template(&monitask_config::data_dir(), "PROMPT.md", PROMPT_MD).await?;

    println!("\n◆ monitask initialized");
    println!("\nNext steps:");
    println!("  1. Add your API key to {}", monitask_config::config_path().display());
    println!("     or export {}", monitask_config::API_KEY_ENV);
    println!("  2. Start chatting: monitask chat");

    Ok(())
}

async fn create_template(dir: &Path, filename: &str, content: &str) -> Result<()> {
    let path = dir.join(filename);
    if !path.exists() {
        tokio::fs::write(&path, content).await?;
        info!("◆ Created {}", path.display());
    }
    Ok(())
}

/// Chat with the agent to build a task
pub async fn chat_command(message: Option<String>, session: String) -> Result<()> {
    let config = Config::load().await?;

    let api_key = config.api_key().with_context(|| {
        format!(
            "No API key configured. Set one in {} or export {}",
            monitask_config::config_path().display(),
            monitask_config::API_KEY_ENV
        )
    })?;
    let provider =
        OpenRouterProvider::new(api_key, config.api_base(), Some(config.default_model()));

    let mut persistence = config.session.persist.then(|| Persistence {
        manager: SessionManager::new(config.sessions_dir()),
        key: session_key(&session),
    });

    let mut store = TaskStore::new();
    if let Some(p) = &persistence {
        p.restore(&mut store).await;
    }

    let defaults = &config.agent.defaults;
    let settings = SessionSettings {
        model: defaults.model.clone(),
        max_tokens: defaults.max_tokens,
        temperature: defaults.temperature,
        max_rounds: defaults.max_rounds,
    };
    let reconciler = Reconciler::new(store, ToolRegistry::default());
    let mut chat = ChatSession::new(
        provider,
        reconciler,
        ContextBuilder::new(monitask_config::data_dir()),
        settings,
    );

    if let Some(msg) = message {
        let result = send_turn(&mut chat, &msg).await;
        if let Some(p) = &mut persistence {
            p.save(chat.reconciler().store()).await?;
        }
        result?;

        for pending in chat.reconciler().pending_prompts() {
            println!("{}", chooser::render(&OptionChooser::new(pending.prompt)));
        }
        return Ok(());
    }

    println!("◆ Interactive mode (/task, /create, /activate, /reset, /quit)");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    loop {
        // Open prompts are answered before new text
        if let Some(pending) = chat.reconciler().pending_prompts().into_iter().next() {
            if answer_prompt(&mut chat, pending).await? {
                break;
            }
            if let Some(p) = &mut persistence {
                p.save(chat.reconciler().store()).await?;
            }
            continue;
        }

        prompt_marker("◆ ")?;
        let Some(input) = read_line()? else {
            break;
        };

        match input.as_str() {
            "" => continue,
            "/quit" | "exit" | "quit" => break,
            "/task" => {
                let reconciler = chat.reconciler();
                println!("{}", task_summary(reconciler.store().task(), &reconciler.gate()));
                continue;
            }
            "/create" => match chat.reconciler_mut().store_mut().create() {
                Ok(()) => println!("✓ Task created"),
                Err(e) => println!("✗ {}", e),
            },
            "/activate" => match chat.reconciler_mut().store_mut().activate() {
                Ok(()) => println!("✓ Task active"),
                Err(e) => println!("✗ {}", e),
            },
            "/reset" => {
                chat.reconciler_mut().reset();
                if let Some(p) = &mut persistence {
                    p.forget().await?;
                }
                println!("✓ Started over");
                continue;
            }
            cmd if cmd.starts_with('/') => {
                println!("Unknown command: {}", cmd);
                continue;
            }
            text => {
                if let Err(e) = send_turn(&mut chat, text).await {
                    println!("\n✗ {}", e);
                }
            }
        }

        if let Some(p) = &mut persistence {
            p.save(chat.reconciler().store()).await?;
        }
    }

    Ok(())
}

async fn send_turn<P: Provider>(
    chat: &mut ChatSession<P>,
    text: &str,
) -> monitask_agent::Result<TurnOutcome> {
    let mut renderer = Renderer::new();
    let outcome = chat
        .send(text, |update| print_update(&mut renderer, update))
        .await?;
    debug!(
        "Turn finished after {} rounds, {} prompts open",
        outcome.rounds, outcome.pending_prompts
    );
    Ok(outcome)
}

/// Run a chooser for one pending prompt. Returns true when the user quits.
async fn answer_prompt<P: Provider>(
    chat: &mut ChatSession<P>,
    pending: PendingPrompt,
) -> Result<bool> {
    let mut chooser = OptionChooser::new(pending.prompt);
    println!("{}", chooser::render(&chooser));

    loop {
        prompt_marker("? ")?;
        let Some(line) = read_line()? else {
            return Ok(true);
        };

        let input = chooser::parse_input(&line);
        if let ChooserInput::Invalid(hint) = &input {
            println!("  {}", hint);
            continue;
        }

        match chooser::apply_input(&mut chooser, input) {
            Ok(ChooserStep::Quit) => return Ok(true),
            Ok(ChooserStep::Redraw) => println!("{}", chooser::render(&chooser)),
            Ok(ChooserStep::Submit(selection)) => {
                println!("  ✓ {}", describe(&chooser, &selection));
                let mut renderer = Renderer::new();
                if let Err(e) = chat
                    .submit(&pending.id, selection, |update| {
                        print_update(&mut renderer, update)
                    })
                    .await
                {
                    println!("\n✗ {}", e);
                }
                return Ok(false);
            }
            Err(e) => println!("  ✗ {}", e),
        }
    }
}

fn describe(chooser: &OptionChooser, selection: &Selection) -> String {
    let prompt = chooser.prompt();
    let mut answers: Vec<String> = selection
        .selected_ids
        .iter()
        .map(|id| {
            prompt
                .option(id)
                .map(|o| o.label.clone())
                .unwrap_or_else(|| id.clone())
        })
        .collect();
    if let Some(text) = &selection.custom_text {
        answers.push(text.clone());
    }
    format!("{} → {}", prompt.question, answers.join(", "))
}

/// Show configuration and the saved task for a session
pub async fn status_command(session: String) -> Result<()> {
    let config_path = monitask_config::config_path();

    println!("◆ monitask Status");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "Config:    {} {}",
        config_path.display(),
        if config_path.exists() {
            "[OK]"
        } else {
            "[Missing]"
        }
    );

    let config = Config::load().await?;
    println!("Model:     {}", config.default_model());
    println!(
        "API key:   {}",
        if config.has_api_key() {
            "[Set]"
        } else {
            "[Not set]"
        }
    );
    println!(
        "Sessions:  {} (persist {})",
        config.sessions_dir().display(),
        if config.session.persist { "on" } else { "off" }
    );

    let key = session_key(&session);
    let manager = SessionManager::new(config.sessions_dir());
    match manager.load(&key).await {
        Some(record) => {
            let mut store = TaskStore::new();
            record.restore_into(&mut store);
            println!("\nSession {} (updated {})", key, record.updated_at.format("%Y-%m-%d %H:%M"));
            println!("{}", task_summary(store.task(), &store.gate()));
        }
        None => println!("\nNo saved task for session {}", key),
    }

    Ok(())
}

/// List the built-in source bundles
pub fn templates_command() -> Result<()> {
    println!("◆ Source bundles");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for template in BuiltinTemplates::new().templates() {
        println!(
            "{:<16} {} ({} sources)",
            template.id,
            template.name,
            template.sources.len()
        );
        println!("{:<16} {}", "", template.description);
        for source in &template.sources {
            println!("{:<16}   - {} ({})", "", source.name, source.identifier);
        }
    }

    Ok(())
}

/// List the tools offered to the agent
pub fn tools_command() -> Result<()> {
    println!("◆ Agent tools");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for kind in ToolKind::ALL {
        let class = match kind.class() {
            ToolClass::Server => "server",
            ToolClass::Client => "client",
        };
        println!("{:<16} [{}] {}", kind.name(), class, kind.description());
    }

    Ok(())
}
