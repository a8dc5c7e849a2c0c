// Library surface for the binary and for headless/integration tests.
pub mod accounts;
pub mod app;
pub mod app_dirs;
pub mod auth_form;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod notify;
pub mod provider;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod timer;
pub mod ui;
pub mod util;

pub use app::{App, AppState};
