//! Routing of UI actions to the app shell or the active screen.

use shared::domain::ReservationDraft;
use view_core::QueryCache;

use crate::{
    controller::events::{Action, Route},
    screens::Screen,
};

/// What the app shell does after an action was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Continue,
    Navigate(Route),
    Completed {
        notice: String,
        draft: ReservationDraft,
    },
    Quit,
}

pub fn dispatch_action(screen: &mut dyn Screen, cache: &QueryCache, action: Action) -> Flow {
    tracing::debug!(action = action.name(), screen = %screen.route(), "dispatching ui action");

    match action {
        Action::Retry(retry) => {
            retry.request();
            Flow::Continue
        }
        Action::Open(route) if route == screen.route() => Flow::Continue,
        Action::Open(route) => Flow::Navigate(route),
        Action::Quit => Flow::Quit,
        other => screen.handle(other, cache),
    }
}
