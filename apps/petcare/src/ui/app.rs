//! App shell: owns the active screen and drives the terminal event loop.

use std::{collections::VecDeque, io::Write};

use anyhow::Context;
use shared::domain::ReservationDraft;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::broadcast::error::RecvError,
};
use tracing::{debug, info, warn};
use view_core::{CacheEvent, QueryCache, View};

use crate::{
    api::MockApi,
    controller::{
        events::{Action, Route},
        orchestration::{dispatch_action, Flow},
    },
    screens::{self, Screen},
    ui::render::write_screen,
};

pub struct PetcareApp {
    cache: QueryCache,
    api: MockApi,
    screen: Box<dyn Screen>,
    view: View<Action>,
    notice: Option<String>,
    last_booking: Option<ReservationDraft>,
}

impl PetcareApp {
    pub fn new(cache: QueryCache, api: MockApi, route: Route) -> Self {
        let screen = screens::open(route, &api);
        Self {
            cache,
            api,
            screen,
            view: View::Empty,
            notice: None,
            last_booking: None,
        }
    }

    pub fn route(&self) -> Route {
        self.screen.route()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Last rendered view.
    pub fn view(&self) -> &View<Action> {
        &self.view
    }

    pub fn last_booking(&self) -> Option<&ReservationDraft> {
        self.last_booking.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.screen.is_pending()
    }

    pub fn render(&mut self) -> &View<Action> {
        self.view = self.screen.render(&self.cache);
        &self.view
    }

    pub fn redraw(&mut self, out: &mut impl Write) -> anyhow::Result<()> {
        self.render();
        write_screen(
            out,
            self.screen.route().title(),
            self.notice.as_deref(),
            &self.view,
        )
        .context("failed to write screen")
    }

    /// Whether a cache event concerns what the active screen shows. Events for
    /// keys only a torn-down screen read are ignored.
    pub fn is_relevant(&self, event: &CacheEvent) -> bool {
        self.screen.waits_on(event.key())
    }

    /// Presses the 1-based `choice`-th button of the last rendered view.
    /// Returns `None` when there is no such button.
    pub fn press(&mut self, choice: usize) -> Option<Flow> {
        let action = self
            .view
            .buttons()
            .get(choice.checked_sub(1)?)
            .map(|(_, action)| (*action).clone())?;
        Some(self.apply(action))
    }

    pub fn apply(&mut self, action: Action) -> Flow {
        let flow = dispatch_action(self.screen.as_mut(), &self.cache, action);
        match &flow {
            Flow::Continue | Flow::Quit => {}
            Flow::Navigate(route) => self.navigate(*route),
            Flow::Completed { notice, draft } => {
                self.last_booking = Some(draft.clone());
                self.navigate(Route::Home);
                self.notice = Some(notice.clone());
            }
        }
        flow
    }

    fn navigate(&mut self, route: Route) {
        info!(from = %self.screen.route(), to = %route, "navigating");
        self.notice = None;
        self.screen = screens::open(route, &self.api);
    }
}

/// Runs the event loop until the user quits or input ends.
///
/// With a non-empty `script` the choices are replayed instead of reading
/// `input`; each choice waits until the active screen is no longer pending.
pub async fn run<R, W>(
    app: &mut PetcareApp,
    input: R,
    out: &mut W,
    script: Vec<usize>,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let interactive = script.is_empty();
    let mut script: VecDeque<usize> = script.into();
    let mut events = app.cache().subscribe();
    let mut lines = input.lines();

    app.redraw(out)?;
    loop {
        if !interactive && !app.is_pending() {
            let Some(choice) = script.pop_front() else {
                debug!("script finished");
                break;
            };
            match app.press(choice) {
                Some(Flow::Quit) => break,
                Some(_) => {}
                None => {
                    warn!(choice, "scripted choice has no matching button");
                    writeln!(out, "No option {choice}.")?;
                }
            }
            app.redraw(out)?;
            continue;
        }

        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if app.is_relevant(&event) {
                        debug!(query = %event.key(), "re-rendering after cache event");
                        app.redraw(out)?;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "cache events lagged; re-rendering");
                    app.redraw(out)?;
                }
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line(), if interactive => {
                let Some(line) = line.context("failed to read input")? else {
                    break;
                };
                let line = line.trim();
                if line.eq_ignore_ascii_case("q") {
                    break;
                }
                match line.parse::<usize>().ok().and_then(|choice| app.press(choice)) {
                    Some(Flow::Quit) => break,
                    Some(_) => app.redraw(out)?,
                    None => writeln!(out, "Type a listed number, or q to quit.")?,
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/app_tests.rs"]
mod tests;
