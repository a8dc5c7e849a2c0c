use ratatui::Frame;

use crate::{
    ui::{auth::render_auth, dashboard::render_dashboard},
    App, AppState,
};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Login / sign-up form
pub struct AuthScreen;

impl Screen for AuthScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_auth(&app.form, app.awaiting_provider(), f);
    }
}

/// Timer dashboard for the signed-in user
pub struct TimerScreen;

impl Screen for TimerScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        match (app.session.as_ref(), app.timer.as_ref()) {
            (Some(session), Some(timer)) => render_dashboard(session, timer, f),
            // a timer screen without a session is never mounted; draw the form
            _ => render_auth(&app.form, app.awaiting_provider(), f),
        }
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Auth => Box::new(AuthScreen),
        AppState::Timer => Box::new(TimerScreen),
    }
}
