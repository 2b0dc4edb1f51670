use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Terminal styles shared by the wizard output.
#[derive(Debug, Clone)]
pub struct Theme {
    title: Style,
    section: Style,
    label: Style,
    value: Style,
    muted: Style,
    error: Style,
    success: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}

impl Theme {
    pub fn new() -> Self {
        Self {
            title: Style::new().color256(205).bold(),
            section: Style::new().color256(63).bold(),
            label: Style::new().color256(246),
            value: Style::new().color256(252),
            muted: Style::new().color256(241),
            error: Style::new().color256(196).bold(),
            success: Style::new().color256(82).bold(),
        }
    }

    /// No escape codes at all.
    pub fn plain() -> Self {
        let plain = Style::new().force_styling(false);
        Self {
            title: plain.clone(),
            section: plain.clone(),
            label: plain.clone(),
            value: plain.clone(),
            muted: plain.clone(),
            error: plain.clone(),
            success: plain,
        }
    }

    pub fn title(&self, value: &str) -> String {
        self.title.apply_to(value).to_string()
    }

    pub fn section(&self, value: &str) -> String {
        self.section.apply_to(value).to_string()
    }

    pub fn label(&self, value: &str) -> String {
        self.label.apply_to(value).to_string()
    }

    pub fn value(&self, value: &str) -> String {
        self.value.apply_to(value).to_string()
    }

    pub fn muted(&self, value: &str) -> String {
        self.muted.apply_to(value).to_string()
    }

    pub fn error(&self, value: &str) -> String {
        self.error.apply_to(format!("[error] {}", value)).to_string()
    }

    pub fn success(&self, value: &str) -> String {
        self.success.apply_to(value).to_string()
    }
}

/// Shows a spinner on stderr while `action` blocks, then clears it.
pub fn with_spinner<T>(title: &str, action: impl FnOnce() -> T) -> T {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.magenta} {msg}") {
        pb.set_style(style.tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷", "✓"]));
    }
    pb.set_message(title.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = action();

    pb.finish_and_clear();
    result
}
