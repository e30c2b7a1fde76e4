use shared::domain::{format_won, HomeData};
use tracing::debug;
use view_core::{AsyncGate, GateStatus, QueryCache, QueryKey, View};

use crate::{
    api::MockApi,
    controller::{
        events::{Action, Route},
        orchestration::Flow,
    },
    screens::Screen,
};

pub struct HomeScreen {
    api: MockApi,
    gate: AsyncGate<Action>,
}

impl HomeScreen {
    pub fn new(api: MockApi) -> Self {
        Self {
            api,
            gate: AsyncGate::new("home"),
        }
    }
}

impl Screen for HomeScreen {
    fn route(&self) -> Route {
        Route::Home
    }

    fn render(&mut self, cache: &QueryCache) -> View<Action> {
        let api = &self.api;
        let body = self.gate.render(cache, |scope| {
            let home = scope.read(&api.home())?;
            Ok(home_view(&home))
        });
        View::column([
            body,
            View::button("Notifications", Action::Open(Route::Notifications)),
            View::button("Refresh", Action::Refresh),
            View::button("Quit", Action::Quit),
        ])
    }

    fn handle(&mut self, action: Action, cache: &QueryCache) -> Flow {
        match action {
            Action::Refresh => {
                debug!("refreshing home data");
                cache.refetch(&self.api.home());
                Flow::Continue
            }
            other => {
                debug!(action = other.name(), "home ignores action");
                Flow::Continue
            }
        }
    }

    fn waits_on(&self, key: &QueryKey) -> bool {
        self.gate.waits_on(key)
    }

    fn is_pending(&self) -> bool {
        self.gate.status() == GateStatus::Pending
    }
}

fn home_view(home: &HomeData) -> View<Action> {
    let greeting = match (&home.user, &home.pet_name) {
        (Some(user), Some(pet)) => format!("Hello, {user}! How is {pet} today?"),
        (Some(user), None) => format!("Hello, {user}!"),
        (None, _) => "Welcome! Find trusted care for your pet.".to_string(),
    };
    let location = home
        .location
        .as_ref()
        .map(|location| View::text(format!("Location: {location}")))
        .unwrap_or_default();

    let banner_action = home
        .status
        .target
        .as_deref()
        .and_then(Route::parse)
        .map(|route| View::button(home.status.action.clone(), Action::Open(route)))
        .unwrap_or_default();

    let services = home.popular_services.iter().map(|service| {
        View::text(format!(
            "[{}] {} ★{:.1} ({} reviews) {}",
            service.tag,
            service.title,
            service.rating,
            service.review_count,
            format_won(service.price)
        ))
    });

    View::column([
        View::heading(greeting),
        location,
        View::text(home.status.title.clone()),
        banner_action,
        View::heading("Popular services"),
        View::column(services),
    ])
}
