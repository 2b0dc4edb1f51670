use crate::app::errors::WizardError;
use console::Term;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use std::io::{self, ErrorKind};

/// A required free-text question.
#[derive(Debug, Clone, Copy)]
pub struct Question<'a> {
    pub title: &'a str,
    /// Example shown next to the title.
    pub hint: Option<&'a str>,
    /// Editable pre-filled answer.
    pub initial: Option<&'a str>,
}

impl<'a> Question<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            title,
            hint: None,
            initial: None,
        }
    }

    pub fn hint(mut self, hint: &'a str) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn initial(mut self, initial: &'a str) -> Self {
        self.initial = Some(initial);
        self
    }
}

/// The interactive surface the wizard talks to.
pub trait Prompter {
    fn note(&mut self, title: &str, body: &str) -> Result<(), WizardError>;
    fn input(&mut self, question: Question<'_>) -> Result<String, WizardError>;
    fn select(&mut self, title: &str, items: &[String]) -> Result<usize, WizardError>;
    fn confirm(&mut self, title: &str, default: bool) -> Result<bool, WizardError>;
}

pub fn required_field(label: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} is required", label))
    } else {
        Ok(())
    }
}

/// dialoguer-backed prompts on stderr.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

fn map_prompt_error(err: dialoguer::Error) -> WizardError {
    match err {
        dialoguer::Error::IO(err) => prompt_io_error(err),
        #[allow(unreachable_patterns)]
        other => WizardError::Prompt(io::Error::new(ErrorKind::Other, other.to_string())),
    }
}

fn prompt_io_error(err: io::Error) -> WizardError {
    if err.kind() == ErrorKind::Interrupted {
        // dialoguer leaves the cursor hidden when Ctrl-C aborts a prompt
        let _ = Term::stderr().show_cursor();
        WizardError::Canceled
    } else {
        WizardError::Prompt(err)
    }
}

impl Prompter for TerminalPrompter {
    fn note(&mut self, title: &str, body: &str) -> Result<(), WizardError> {
        let term = Term::stderr();
        term.write_line(&console::style(title).bold().to_string())
            .map_err(prompt_io_error)?;
        for line in body.lines() {
            term.write_line(&format!("  {}", console::style(line).dim()))
                .map_err(prompt_io_error)?;
        }
        term.write_line("").map_err(prompt_io_error)
    }

    fn input(&mut self, question: Question<'_>) -> Result<String, WizardError> {
        let prompt = match question.hint {
            Some(hint) => format!("{} (e.g. {})", question.title, hint),
            None => question.title.to_string(),
        };
        let label = question.title.to_string();

        let mut input = Input::<String>::with_theme(&self.theme);
        input = input
            .with_prompt(prompt)
            .validate_with(move |value: &String| required_field(&label, value));
        if let Some(initial) = question.initial {
            input = input.with_initial_text(initial);
        }

        input
            .interact_text()
            .map(|value| value.trim().to_string())
            .map_err(map_prompt_error)
    }

    fn select(&mut self, title: &str, items: &[String]) -> Result<usize, WizardError> {
        Select::with_theme(&self.theme)
            .with_prompt(title)
            .items(items)
            .default(0)
            .interact_opt()
            .map_err(map_prompt_error)?
            .ok_or(WizardError::Canceled)
    }

    fn confirm(&mut self, title: &str, default: bool) -> Result<bool, WizardError> {
        Confirm::with_theme(&self.theme)
            .with_prompt(title)
            .default(default)
            .interact_opt()
            .map_err(map_prompt_error)?
            .ok_or(WizardError::Canceled)
    }
}
