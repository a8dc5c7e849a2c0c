use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};
use tomato::{
    accounts::AccountStore,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    credentials::SqliteDirectory,
    logging, notify, provider,
    runtime::{AppEvent, CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    scheduler::{ThreadTickScheduler, TickScheduler, TICK_INTERVAL},
    session::FileSessionStore,
    timer::TimerController,
    ui, App,
};

const REDRAW_MS: u64 = 250;

/// focused pomodoro timer for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A pomodoro timer for the terminal: 25 minutes of focus, 5 minutes of break, repeat. Sign in with a local account or a delegated identity provider."
)]
pub struct Cli {
    /// length of a focus phase in minutes (default 25)
    #[clap(short = 'w', long)]
    work_mins: Option<u32>,

    /// length of a break in minutes (default 5)
    #[clap(short = 'b', long)]
    break_mins: Option<u32>,

    /// do not ring the terminal bell when a phase ends
    #[clap(long)]
    no_bell: bool,

    /// keep config, accounts, session and log under this directory
    #[clap(long)]
    data_dir: Option<PathBuf>,

    /// command that runs federated sign-in and prints {"email": ..., "name": ...}
    #[clap(long)]
    provider_cmd: Option<String>,

    /// log filter written to the log file (RUST_LOG overrides)
    #[clap(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Flags given on the command line win over the config file
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(work) = self.work_mins {
            cfg.work_mins = work;
        }
        if let Some(brk) = self.break_mins {
            cfg.break_mins = brk;
        }
        if self.no_bell {
            cfg.bell = false;
        }
        if let Some(cmd) = &self.provider_cmd {
            let argv: Vec<String> = cmd.split_whitespace().map(String::from).collect();
            cfg.provider_command = if argv.is_empty() { None } else { Some(argv) };
        }
        cfg
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let dirs = AppDirs::resolve(cli.data_dir.as_deref());
    logging::init(&dirs.log_path(), &cli.log_level)?;

    let config = cli.apply(FileConfigStore::with_path(dirs.config_path()).load());
    let durations = match config.durations() {
        Ok(durations) => durations,
        Err(e) => Cli::command().error(ErrorKind::ValueValidation, e).exit(),
    };
    log::info!("starting with {:?}", config);

    let accounts = AccountStore::new(
        Box::new(SqliteDirectory::open(dirs.accounts_db_path())?),
        Box::new(FileSessionStore::with_path(dirs.session_path())),
        provider::from_config(config.provider_command.as_deref()),
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = CrosstermEventSource::new();
    let scheduler: Arc<dyn TickScheduler> =
        Arc::new(ThreadTickScheduler::new(events.sender(), TICK_INTERVAL));
    let bell = config.bell;
    let mut app = App::new(
        accounts,
        Box::new(move || {
            TimerController::new(durations, Arc::clone(&scheduler), notify::from_config(bell))
        }),
    );
    let runner = Runner::new(events, FixedTicker::new(Duration::from_millis(REDRAW_MS)));

    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            AppEvent::Key(key) => app.on_key(key),
            AppEvent::Tick(id) => app.on_scheduled_tick(id),
            AppEvent::Resize | AppEvent::Idle => {}
        }
        app.poll_federated();

        if app.should_quit {
            break;
        }
    }

    log::info!("exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use std::sync::mpsc;
    use tomato::{
        credentials::MemoryDirectory,
        notify::SilentNotifier,
        provider::UnconfiguredProvider,
        runtime::TestEventSource,
        scheduler::ManualTickScheduler,
        session::{Identity, MemorySessionStore},
        timer::Durations,
    };

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["tomato"]);

        assert_eq!(cli.work_mins, None);
        assert_eq!(cli.break_mins, None);
        assert!(!cli.no_bell);
        assert_eq!(cli.data_dir, None);
        assert_eq!(cli.provider_cmd, None);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_cli_durations() {
        let cli = Cli::parse_from(["tomato", "-w", "50", "--break-mins", "10"]);
        assert_eq!(cli.work_mins, Some(50));
        assert_eq!(cli.break_mins, Some(10));
    }

    #[test]
    fn test_cli_rejects_negative_minutes() {
        assert!(Cli::try_parse_from(["tomato", "-w", "-5"]).is_err());
    }

    #[test]
    fn test_apply_keeps_file_values_without_flags() {
        let file = Config {
            work_mins: 45,
            break_mins: 15,
            bell: false,
            provider_command: Some(vec!["helper".into()]),
        };
        let cli = Cli::parse_from(["tomato"]);
        assert_eq!(cli.apply(file.clone()), file);
    }

    #[test]
    fn test_apply_flags_override_file() {
        let cli = Cli::parse_from([
            "tomato",
            "-w",
            "30",
            "--no-bell",
            "--provider-cmd",
            "tomato-oauth --google",
        ]);
        let cfg = cli.apply(Config::default());
        assert_eq!(cfg.work_mins, 30);
        assert_eq!(cfg.break_mins, 5);
        assert!(!cfg.bell);
        assert_eq!(
            cfg.provider_command,
            Some(vec!["tomato-oauth".to_string(), "--google".to_string()])
        );
    }

    #[test]
    fn test_apply_blank_provider_clears_it() {
        let cli = Cli::parse_from(["tomato", "--provider-cmd", "  "]);
        let cfg = cli.apply(Config {
            provider_command: Some(vec!["helper".into()]),
            ..Config::default()
        });
        assert_eq!(cfg.provider_command, None);
    }

    #[test]
    fn test_start_tui_runs_until_quit() {
        let accounts = AccountStore::new(
            Box::new(MemoryDirectory::new()),
            Box::new(MemorySessionStore::with_identity(Identity::from_email(
                "a@b.com",
            ))),
            Box::new(UnconfiguredProvider),
        );
        let mut app = App::new(
            accounts,
            Box::new(|| {
                TimerController::new(
                    Durations::default(),
                    Arc::new(ManualTickScheduler::new()),
                    Box::new(SilentNotifier),
                )
            }),
        );

        app.on_key(KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE));
        let id = app.timer.as_ref().unwrap().tick_id().unwrap();

        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Tick(id)).unwrap();
        tx.send(AppEvent::Resize).unwrap();
        tx.send(AppEvent::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)))
            .unwrap();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(5)),
        );

        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        start_tui(&mut terminal, &mut app, &runner).unwrap();

        assert!(app.should_quit);
        assert_eq!(app.timer.as_ref().unwrap().state().remaining_secs, 1499);
    }

    #[test]
    fn test_redraw_constant() {
        assert!(Duration::from_millis(REDRAW_MS) < TICK_INTERVAL);
    }
}
