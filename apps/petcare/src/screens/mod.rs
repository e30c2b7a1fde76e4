//! Screens composed from funnels and gates.

pub mod home;
pub mod notifications;
pub mod reservation;

use view_core::{QueryCache, QueryKey, View};

use crate::{
    api::MockApi,
    controller::{events::{Action, Route}, orchestration::Flow},
};

pub trait Screen {
    fn route(&self) -> Route;

    fn render(&mut self, cache: &QueryCache) -> View<Action>;

    /// Handles an action the controller routed to this screen.
    fn handle(&mut self, action: Action, cache: &QueryCache) -> Flow;

    /// Whether one of the screen's gates read `key` during the last render.
    fn waits_on(&self, key: &QueryKey) -> bool;

    /// Whether the visible part of the screen is waiting on data.
    fn is_pending(&self) -> bool;
}

pub fn open(route: Route, api: &MockApi) -> Box<dyn Screen> {
    match route {
        Route::Home => Box::new(home::HomeScreen::new(api.clone())),
        Route::Notifications => Box::new(notifications::NotificationsScreen::new(api.clone())),
        Route::Reservation => Box::new(reservation::ReservationScreen::new(api.clone())),
    }
}
