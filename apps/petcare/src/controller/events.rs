//! UI actions and error modeling for the petcare controller.

use std::fmt;

use clap::ValueEnum;
use view_core::Retry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Route {
    Home,
    Notifications,
    Reservation,
}

impl Route {
    pub fn title(self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Notifications => "Notifications",
            Route::Reservation => "Reservation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Route::Home => "home",
            Route::Notifications => "notifications",
            Route::Reservation => "reservation",
        })
    }
}

/// What a rendered button does when pressed.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    PickDate(String),
    PickService { name: String, price: u32 },
    Submit,
    Back,
    Retry(Retry),
    Refresh,
    Open(Route),
    Quit,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::PickDate(_) => "pick_date",
            Action::PickService { .. } => "pick_service",
            Action::Submit => "submit",
            Action::Back => "back",
            Action::Retry(_) => "retry",
            Action::Refresh => "refresh",
            Action::Open(_) => "open",
            Action::Quit => "quit",
        }
    }
}

impl From<Retry> for Action {
    fn from(value: Retry) -> Self {
        Action::Retry(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: Route,
    message: String,
}

impl UiError {
    pub fn from_message(context: Route, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
            || message_lower.contains("incomplete")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("unavailable")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    /// Short advice shown under the error message.
    pub fn hint(&self) -> &'static str {
        match self.category {
            UiErrorCategory::Transport => "Check your connection and retry.",
            UiErrorCategory::Validation => "Some details are missing; go back and complete them.",
            UiErrorCategory::Unknown => "Something went wrong on our side.",
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> Route {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
#[path = "../tests/events_tests.rs"]
mod tests;
