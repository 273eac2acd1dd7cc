use crate::record::ServiceStatus;
use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
    pub muted: Style,
    pub pending: Style,
    pub completed: Style,
    pub cancelled: Style,
}

impl Theme {
    pub fn detect() -> Self {
        if !console::Term::stdout().is_term() {
            return Self::plain();
        }
        Self::colored()
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            info: Style::new().magenta(),
            dim: Style::new().white().dimmed(),
            muted: Style::new().bright_black(),
            pending: Style::new().yellow(),
            completed: Style::new().green(),
            cancelled: Style::new().red().dimmed(),
        }
    }

    pub fn plain() -> Self {
        Self {
            header: Style::new(),
            success: Style::new(),
            error: Style::new(),
            warn: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            muted: Style::new(),
            pending: Style::new(),
            completed: Style::new(),
            cancelled: Style::new(),
        }
    }

    /// Style for a status cell
    pub fn status(&self, status: &ServiceStatus) -> Style {
        match status {
            ServiceStatus::Pending => self.pending.clone(),
            ServiceStatus::Completed => self.completed.clone(),
            ServiceStatus::Cancelled => self.cancelled.clone(),
            ServiceStatus::Other(_) => self.muted.clone(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
