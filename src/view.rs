//! View models handed to the page, either rendered into HTML or as JSON.

use crate::control::ControlState;
use crate::models::Stats;
use serde::Serialize;

pub const READY_LABEL: &str = "Mark Today Complete";
pub const ALREADY_COMPLETED_LABEL: &str = "Already Completed Today";
pub const COMPLETED_LABEL: &str = "Completed Today!";

pub const MISSING_EMAIL_WELCOME: &str =
    "⚠️ Missing email parameter. Please access this page from your course.";
pub const LOAD_FAILED_WELCOME: &str = "⚠️ Failed to load data. Please refresh the page.";

pub const ALREADY_COMPLETED_ON_LOAD: &str = "✅ You already completed today! Come back tomorrow.";
pub const ALREADY_COMPLETED_ON_SUBMIT: &str = "✅ You already completed today!";
pub const SUBMIT_SUCCEEDED: &str = "🎉 Great job! Check-in completed successfully!";
pub const SUBMIT_FAILED: &str = "❌ Failed to save check-in. Please try again.";
pub const USER_MISSING: &str = "User information missing. Please reload the page.";

pub const LEADERBOARD_EMPTY: &str = "No completions yet. Be the first!";
pub const LEADERBOARD_FAILED: &str = "Failed to load leaderboard";
pub const LEADERBOARD_LOADING: &str = "Loading leaderboard...";

const DEFAULT_DISMISS_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub message: String,
    pub severity: Severity,
    /// `None` keeps the banner up until the page changes it.
    pub dismiss_after_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Feedback {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            dismiss_after_ms: Some(DEFAULT_DISMISS_MS),
            detail: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }

    pub fn persistent(mut self) -> Self {
        self.dismiss_after_ms = None;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonView {
    pub enabled: bool,
    pub label: String,
}

impl ButtonView {
    pub fn ready() -> Self {
        Self {
            enabled: true,
            label: READY_LABEL.to_string(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            label: READY_LABEL.to_string(),
        }
    }

    pub fn locked(label: &str) -> Self {
        Self {
            enabled: false,
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Ok,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Welcome {
    pub message: String,
    pub tone: Tone,
}

impl Welcome {
    pub fn greeting(name: &str) -> Self {
        Self {
            message: format!("Welcome back, {name}! 👋"),
            tone: Tone::Ok,
        }
    }

    pub fn warning(message: &str) -> Self {
        Self {
            message: message.to_string(),
            tone: Tone::Warn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub name: String,
    pub total_completions: u32,
    pub current_streak: u32,
    pub top3: bool,
    pub is_viewer: bool,
}

impl LeaderboardRow {
    pub fn display_name(&self) -> String {
        if self.is_viewer {
            format!("{} (You)", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Either ranked rows or a placeholder message, never both and never neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardView {
    pub rows: Vec<LeaderboardRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl LeaderboardView {
    pub fn placeholder(message: &str) -> Self {
        Self {
            rows: Vec::new(),
            placeholder: Some(message.to_string()),
        }
    }
}

/// Everything the page shows right after it loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub welcome: Welcome,
    pub state: ControlState,
    pub stats: Stats,
    pub button: ButtonView,
    pub feedback: Option<Feedback>,
    pub leaderboard: LeaderboardView,
}

/// Outcome of one check-in action.
///
/// `stats` is absent when nothing new came back; the page keeps what it shows.
/// `leaderboard` is present only when a genuine completion triggered a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckinView {
    pub state: ControlState,
    pub stats: Option<Stats>,
    pub button: ButtonView,
    pub feedback: Feedback,
    pub leaderboard: Option<LeaderboardView>,
}
