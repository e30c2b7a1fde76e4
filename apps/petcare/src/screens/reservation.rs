//! Three-step reservation funnel: date, then service, then confirmation.
//!
//! The whole funnel sits inside one gate. The service step fetches the
//! catalog behind a nested gate so a catalog failure keeps the heading and the
//! chosen date on screen.

use shared::domain::{format_won, ReservationDraft};
use tracing::{debug, info, warn};
use view_core::{
    AsyncGate, Funnel, GateError, GateStatus, Interrupt, QueryCache, QueryKey, View,
};

use crate::{
    api::{MockApi, RESERVATION_DATES},
    controller::{
        events::{Action, Route, UiError},
        orchestration::Flow,
    },
    screens::Screen,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservationStep {
    Date,
    Service,
    Confirm,
}

pub struct ReservationScreen {
    api: MockApi,
    funnel: Funnel<ReservationStep>,
    gate: AsyncGate<Action>,
    catalog_gate: AsyncGate<Action>,
    draft: ReservationDraft,
}

impl ReservationScreen {
    pub fn new(api: MockApi) -> Self {
        let catalog_gate = AsyncGate::new("reservation/services")
            .pending_fallback(|| View::text("Loading services..."))
            .rejected_fallback(|err, retry| {
                let ui_error = UiError::from_message(Route::Reservation, err.message());
                warn!(
                    screen = %ui_error.context(),
                    category = ?ui_error.category(),
                    "service catalog unavailable"
                );
                View::column([
                    View::text(format!("Could not load services: {}", ui_error.message())),
                    View::text(ui_error.hint()),
                    View::button("Retry", Action::Retry(retry)),
                ])
            });
        Self {
            api,
            funnel: Funnel::new(ReservationStep::Date),
            gate: AsyncGate::new("reservation"),
            catalog_gate,
            draft: ReservationDraft::default(),
        }
    }

    pub fn step(&self) -> ReservationStep {
        self.funnel.current_step()
    }

    pub fn draft(&self) -> &ReservationDraft {
        &self.draft
    }

    /// Moves the funnel. An error held by the outer gate belongs to the step
    /// being left, so it is cleared on an effective change.
    fn move_to(&mut self, step: ReservationStep, cache: &QueryCache) {
        if self.funnel.set_step(step) && self.gate.status() == GateStatus::Rejected {
            self.gate.retry(cache);
        }
    }
}

impl Screen for ReservationScreen {
    fn route(&self) -> Route {
        Route::Reservation
    }

    fn render(&mut self, cache: &QueryCache) -> View<Action> {
        let Self {
            api,
            funnel,
            gate,
            catalog_gate,
            draft,
        } = self;

        let body = gate.render(cache, |scope| {
            let cache = scope.cache();
            funnel
                .steps()
                .step(ReservationStep::Date, || {
                    let dates = RESERVATION_DATES
                        .iter()
                        .map(|date| View::button(*date, Action::PickDate(date.to_string())));
                    Ok(View::column([
                        View::heading("When would you like to book?"),
                        View::column(dates),
                    ]))
                })
                .step(ReservationStep::Service, || {
                    let services = catalog_gate.render(cache, |scope| {
                        let services = scope.read(&api.service_catalog())?;
                        Ok(View::column(services.iter().map(|service| {
                            View::button(
                                format!("{} {}", service.name, format_won(service.price)),
                                Action::PickService {
                                    name: service.name.clone(),
                                    price: service.price,
                                },
                            )
                        })))
                    });
                    Ok(View::column([
                        View::heading("Which service do you need?"),
                        View::text(format!("Date: {}", draft.date.as_deref().unwrap_or("-"))),
                        services,
                    ]))
                })
                .step(ReservationStep::Confirm, || {
                    let (Some(date), Some(service)) = (&draft.date, &draft.service_name) else {
                        return Err(Interrupt::Failed(GateError::new(
                            "reservation is incomplete: missing date or service",
                        )));
                    };
                    Ok(View::column([
                        View::heading("Please confirm your reservation"),
                        View::text(format!("Date: {date}")),
                        View::text(format!("Service: {service}")),
                        View::text(format!("Total: {}", format_won(draft.price))),
                        View::button("Book", Action::Submit),
                    ]))
                })
                .render_or_else(|| Ok(View::Empty))
        });

        View::column([body, View::button("Back", Action::Back)])
    }

    fn handle(&mut self, action: Action, cache: &QueryCache) -> Flow {
        match action {
            Action::PickDate(date) => {
                self.draft.date = Some(date);
                self.move_to(ReservationStep::Service, cache);
                Flow::Continue
            }
            Action::PickService { name, price } => {
                self.draft.service_name = Some(name);
                self.draft.price = price;
                self.move_to(ReservationStep::Confirm, cache);
                Flow::Continue
            }
            Action::Back => match self.step() {
                ReservationStep::Confirm => {
                    self.move_to(ReservationStep::Service, cache);
                    Flow::Continue
                }
                ReservationStep::Service => {
                    self.move_to(ReservationStep::Date, cache);
                    Flow::Continue
                }
                ReservationStep::Date => Flow::Navigate(Route::Home),
            },
            Action::Submit => {
                if !self.draft.is_complete() {
                    debug!(draft = ?self.draft(), "submit ignored for incomplete draft");
                    return Flow::Continue;
                }
                let draft = std::mem::take(&mut self.draft);
                self.move_to(ReservationStep::Date, cache);
                let notice = format!(
                    "Reservation requested: {} on {}.",
                    draft.service_name.as_deref().unwrap_or_default(),
                    draft.date.as_deref().unwrap_or_default()
                );
                info!(service = ?draft.service_name, date = ?draft.date, price = draft.price, "reservation submitted");
                Flow::Completed { notice, draft }
            }
            Action::Refresh => {
                cache.refetch(&self.api.service_catalog());
                Flow::Continue
            }
            other => {
                debug!(action = other.name(), "reservation ignores action");
                Flow::Continue
            }
        }
    }

    fn waits_on(&self, key: &QueryKey) -> bool {
        self.gate.waits_on(key) || self.catalog_gate.waits_on(key)
    }

    fn is_pending(&self) -> bool {
        self.gate.status() == GateStatus::Pending
            || (self.funnel.is_at(&ReservationStep::Service)
                && self.catalog_gate.status() == GateStatus::Pending)
    }
}

#[cfg(test)]
#[path = "../tests/reservation_tests.rs"]
mod tests;
