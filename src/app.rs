use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::accounts::{validate_login, AccountStore};
use crate::auth_form::{AuthForm, AuthMode};
use crate::error::{AuthError, ProviderError};
use crate::provider::PendingSignIn;
use crate::scheduler::TickId;
use crate::session::{Identity, Session};
use crate::timer::TimerController;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Auth,
    Timer,
}

/// Builds a fresh controller each time a session starts
pub type TimerFactory = Box<dyn Fn() -> TimerController>;

/// The UI shell: one screen at a time, a session only while on the timer
/// screen, and a controller that lives exactly as long as the session.
pub struct App {
    pub state: AppState,
    pub form: AuthForm,
    pub session: Option<Session>,
    pub timer: Option<TimerController>,
    pub should_quit: bool,
    accounts: AccountStore,
    federated: Option<PendingSignIn>,
    make_timer: TimerFactory,
}

impl App {
    /// Starts on the timer screen when a persisted session exists
    pub fn new(accounts: AccountStore, make_timer: TimerFactory) -> Self {
        let mut app = Self {
            state: AppState::Auth,
            form: AuthForm::default(),
            session: None,
            timer: None,
            should_quit: false,
            accounts,
            federated: None,
            make_timer,
        };
        if let Some(identity) = app.accounts.current_session() {
            log::info!("restored session for {}", identity.email);
            app.sign_in(identity);
        }
        app
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn submit(&mut self) {
        self.form.error = None;
        let form = &self.form;
        let result = match form.mode {
            AuthMode::Login => validate_login(&form.email, &form.password)
                .map_err(AuthError::from)
                .and_then(|_| self.accounts.authenticate(&form.email, &form.password)),
            AuthMode::SignUp => {
                self.accounts
                    .register(&form.email, &form.password, &form.confirm)
            }
        };
        self.finish_auth(result);
    }

    /// Starts the provider flow; its answer is picked up by `poll_federated`
    pub fn federated_login(&mut self) {
        if self.federated.is_some() {
            return;
        }
        self.form.error = None;
        self.federated = Some(self.accounts.begin_federated());
        // providers that cannot start answer right away
        self.poll_federated();
    }

    pub fn awaiting_provider(&self) -> bool {
        self.federated.is_some()
    }

    pub fn poll_federated(&mut self) {
        let outcome = match self.federated.as_ref().and_then(PendingSignIn::poll) {
            Some(outcome) => outcome,
            None => return,
        };
        self.federated = None;
        let result = self.accounts.complete_federated(outcome);
        self.finish_auth(result);
    }

    pub fn cancel_federated(&mut self) {
        if let Some(pending) = self.federated.take() {
            pending.cancel();
            log::info!("federated sign-in cancelled by user");
            self.form.error = Some(ProviderError::Cancelled.to_string());
        }
    }

    fn finish_auth(&mut self, result: Result<Identity, AuthError>) {
        match result {
            Ok(identity) => self.sign_in(identity),
            Err(e) => {
                log::debug!("sign-in rejected: {}", e);
                self.form.error = Some(e.to_string());
            }
        }
    }

    fn sign_in(&mut self, identity: Identity) {
        self.session = Some(Session::begin(identity));
        self.timer = Some((self.make_timer)());
        self.form.clear();
        self.state = AppState::Timer;
    }

    pub fn logout(&mut self) {
        if let Err(e) = self.accounts.clear_session() {
            log::warn!("could not clear stored session: {}", e);
        }
        if let Some(session) = self.session.take() {
            log::info!("{} signed out", session.identity.email);
        }
        // dropping the controller cancels its tick
        self.timer = None;
        self.form.clear();
        self.state = AppState::Auth;
    }

    /// One elapsed second, unconditionally
    pub fn on_tick(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.tick();
        }
    }

    /// A tick from the scheduler; only the live handle's ticks count
    pub fn on_scheduled_tick(&mut self, id: TickId) {
        if let Some(timer) = self.timer.as_mut() {
            timer.on_scheduled_tick(id);
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.state {
            AppState::Auth => self.on_auth_key(key),
            AppState::Timer => self.on_timer_key(key),
        }
    }

    fn on_auth_key(&mut self, key: KeyEvent) {
        if self.federated.is_some() {
            if key.code == KeyCode::Esc {
                self.cancel_federated();
            }
            return;
        }

        // AltGr arrives as ctrl+alt on Windows and types characters such as '@'
        let shortcut = key.modifiers.contains(KeyModifiers::CONTROL)
            && !key.modifiers.contains(KeyModifiers::ALT);
        if shortcut {
            match key.code {
                KeyCode::Char('s') => self.form.toggle_visibility(),
                KeyCode::Char('t') => self.form.toggle_mode(),
                KeyCode::Char('g') => self.federated_login(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => self.submit(),
            KeyCode::Tab | KeyCode::Down => self.form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.form.focus_prev(),
            KeyCode::Backspace => self.form.backspace(),
            KeyCode::Char(c) => self.form.push_char(c),
            _ => {}
        }
    }

    fn on_timer_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(' ') => {
                if let Some(timer) = self.timer.as_mut() {
                    timer.toggle();
                }
            }
            KeyCode::Char('r') => {
                if let Some(timer) = self.timer.as_mut() {
                    timer.reset();
                }
            }
            KeyCode::Char('l') => self.logout(),
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
    }
}
