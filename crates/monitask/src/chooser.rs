//! Terminal input for option choosers

use monitask_agent::{ChoiceOutcome, OptionChooser, Selection, SelectionError};

/// One line typed while a chooser is open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChooserInput {
    /// 1-based option number
    Pick(usize),
    /// `other: <text>`
    Other(String),
    /// Empty line
    Confirm,
    Quit,
    Invalid(String),
}

/// What the chat loop should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChooserStep {
    Submit(Selection),
    Redraw,
    Quit,
}

pub fn parse_input(line: &str) -> ChooserInput {
    let line = line.trim();
    if line.is_empty() {
        return ChooserInput::Confirm;
    }
    if line == "/quit" || line == "exit" {
        return ChooserInput::Quit;
    }

    let lower = line.to_lowercase();
    if lower.starts_with("other:") {
        let text = line.get("other:".len()..).unwrap_or_default();
        return ChooserInput::Other(text.trim().to_string());
    }

    match line.parse::<usize>() {
        Ok(n) if n > 0 => ChooserInput::Pick(n),
        _ => ChooserInput::Invalid(format!(
            "type an option number, 'other: <text>', or Enter to confirm (got '{}')",
            line
        )),
    }
}

/// Feed one line into the chooser
pub fn apply_input(
    chooser: &mut OptionChooser,
    input: ChooserInput,
) -> Result<ChooserStep, SelectionError> {
    match input {
        ChooserInput::Pick(n) => {
            let id = chooser
                .prompt()
                .options
                .get(n - 1)
                .map(|o| o.id.clone())
                .ok_or_else(|| SelectionError::UnknownOption(n.to_string()))?;
            match chooser.choose(&id)? {
                ChoiceOutcome::Submitted(selection) => Ok(ChooserStep::Submit(selection)),
                ChoiceOutcome::Toggled { .. } => Ok(ChooserStep::Redraw),
            }
        }
        ChooserInput::Other(text) => {
            chooser.set_custom(text)?;
            // Single-select treats custom text as the whole answer
            if !chooser.prompt().allow_multiple && chooser.custom().is_some() {
                return chooser.confirm().map(ChooserStep::Submit);
            }
            Ok(ChooserStep::Redraw)
        }
        ChooserInput::Confirm => chooser.confirm().map(ChooserStep::Submit),
        ChooserInput::Quit => Ok(ChooserStep::Quit),
        ChooserInput::Invalid(_) => Ok(ChooserStep::Redraw),
    }
}

/// Draw the chooser as numbered lines
pub fn render(chooser: &OptionChooser) -> String {
    let prompt = chooser.prompt();
    let mut out = format!("\n◆ {}\n", prompt.question);

    for (i, option) in prompt.options.iter().enumerate() {
        let mark = if prompt.allow_multiple {
            if chooser.is_selected(&option.id) {
                "[x] "
            } else {
                "[ ] "
            }
        } else {
            ""
        };
        out.push_str(&format!("  {}. {}{}", i + 1, mark, option.label));
        if let Some(desc) = &option.description {
            out.push_str(&format!(" - {}", desc));
        }
        out.push('\n');
    }

    if let Some(custom) = chooser.custom() {
        out.push_str(&format!("  other: {}\n", custom));
    }

    let mut hints = Vec::new();
    if prompt.allow_multiple {
        hints.push("numbers toggle, Enter confirms");
    } else {
        hints.push("pick a number");
    }
    if prompt.allow_custom {
        hints.push("'other: <text>' for your own answer");
    }
    out.push_str(&format!("  ({})", hints.join("; ")));
    out
}
