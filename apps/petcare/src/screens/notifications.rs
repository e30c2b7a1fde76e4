use shared::domain::{Notification, NotificationKind};
use tracing::warn;
use view_core::{AsyncGate, GateStatus, QueryCache, QueryKey, View};

use crate::{
    api::MockApi,
    controller::{
        events::{Action, Route, UiError},
        orchestration::Flow,
    },
    screens::Screen,
};

pub struct NotificationsScreen {
    api: MockApi,
    gate: AsyncGate<Action>,
}

impl NotificationsScreen {
    pub fn new(api: MockApi) -> Self {
        let gate = AsyncGate::new("notifications")
            .pending_fallback(|| View::text("Loading notifications..."))
            .rejected_fallback(|err, retry| {
                let ui_error = UiError::from_message(Route::Notifications, err.message());
                warn!(
                    screen = %ui_error.context(),
                    category = ?ui_error.category(),
                    "notifications unavailable"
                );
                View::column([
                    View::text("Could not load notifications."),
                    View::text(ui_error.message()),
                    View::text(ui_error.hint()),
                    View::button("Retry", Action::Retry(retry)),
                ])
            });
        Self { api, gate }
    }
}

impl Screen for NotificationsScreen {
    fn route(&self) -> Route {
        Route::Notifications
    }

    fn render(&mut self, cache: &QueryCache) -> View<Action> {
        let api = &self.api;
        let body = self.gate.render(cache, |scope| {
            let notifications = scope.read(&api.notifications())?;
            Ok(list_view(&notifications))
        });
        View::column([
            body,
            View::button("Refresh", Action::Refresh),
            View::button("Home", Action::Open(Route::Home)),
        ])
    }

    fn handle(&mut self, action: Action, cache: &QueryCache) -> Flow {
        if action == Action::Refresh {
            cache.refetch(&self.api.notifications());
        }
        Flow::Continue
    }

    fn waits_on(&self, key: &QueryKey) -> bool {
        self.gate.waits_on(key)
    }

    fn is_pending(&self) -> bool {
        self.gate.status() == GateStatus::Pending
    }
}

fn kind_label(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Reservation => "Reservation",
        NotificationKind::Report => "Report",
        NotificationKind::Coupon => "Coupon",
        NotificationKind::Info => "Notice",
    }
}

fn list_view(notifications: &[Notification]) -> View<Action> {
    if notifications.is_empty() {
        return View::text("No notifications yet.");
    }
    let unread = notifications.iter().filter(|n| !n.is_read).count();
    let rows = notifications.iter().map(|n| {
        let marker = if n.is_read { " " } else { "●" };
        View::column([
            View::text(format!(
                "{marker} [{}] {} · {}",
                kind_label(n.kind),
                n.title,
                n.time
            )),
            View::text(format!("    {}", n.description)),
        ])
    });
    View::column([
        View::heading(format!("Notifications ({unread} unread)")),
        View::column(rows),
    ])
}
