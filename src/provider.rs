use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ProviderError;
use crate::session::Identity;
use crate::util::local_part;

/// Exit status a helper uses to say the user closed the prompt (SIGINT convention)
const CANCELLED_EXIT_CODE: i32 = 130;

/// How often the worker checks whether the helper has exited
const EXIT_POLL: Duration = Duration::from_millis(50);

pub type SignInOutcome = Result<Identity, ProviderError>;

/// A consent flow in progress.
///
/// The outcome is picked up with `poll` (non-blocking) or `wait`. Cancelling
/// or dropping the handle stops the flow; a late outcome is discarded.
#[derive(Debug)]
pub struct PendingSignIn {
    outcome: Receiver<SignInOutcome>,
    cancelled: Arc<AtomicBool>,
    child: Option<Arc<Mutex<Child>>>,
}

impl PendingSignIn {
    /// A handle plus the sending half for whoever produces the outcome
    pub fn channel() -> (Self, Sender<SignInOutcome>) {
        Self::watching(None)
    }

    fn watching(child: Option<Arc<Mutex<Child>>>) -> (Self, Sender<SignInOutcome>) {
        let (tx, rx) = mpsc::channel();
        let pending = Self {
            outcome: rx,
            cancelled: Arc::new(AtomicBool::new(false)),
            child,
        };
        (pending, tx)
    }

    /// Already answered, e.g. when the provider cannot even start
    pub fn ready(outcome: SignInOutcome) -> Self {
        let (pending, tx) = Self::channel();
        // the receiver is alive in `pending`
        let _ = tx.send(outcome);
        pending
    }

    pub fn poll(&self) -> Option<SignInOutcome> {
        match self.outcome.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(stopped())),
        }
    }

    pub fn wait(&self) -> SignInOutcome {
        self.outcome.recv().unwrap_or_else(|_| Err(stopped()))
    }

    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(child) = &self.child {
            if let Ok(mut child) = child.lock() {
                if let Err(e) = child.kill() {
                    log::debug!("could not stop identity provider: {}", e);
                }
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for PendingSignIn {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn stopped() -> ProviderError {
    ProviderError::Failed("identity provider stopped unexpectedly".into())
}

/// Third-party identity provider behind an interactive consent prompt
pub trait IdentityProvider {
    /// Starts the consent flow without blocking the caller
    fn begin(&mut self) -> PendingSignIn;

    /// Blocks until the consent flow finishes
    fn authenticate(&mut self) -> SignInOutcome {
        self.begin().wait()
    }

    /// Best effort; called on logout
    fn sign_out(&mut self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Used when no provider command is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredProvider;

impl IdentityProvider for UnconfiguredProvider {
    fn begin(&mut self) -> PendingSignIn {
        PendingSignIn::ready(Err(ProviderError::Unavailable))
    }
}

#[derive(Debug, Deserialize)]
struct ProviderReply {
    email: Option<String>,
    name: Option<String>,
}

impl ProviderReply {
    fn into_identity(self) -> SignInOutcome {
        let email = match self.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => email.to_string(),
            _ => return Err(ProviderError::Failed("provider reply has no email".into())),
        };
        let name = match self.name.filter(|n| !n.trim().is_empty()) {
            Some(name) => name,
            None if !local_part(&email).is_empty() => local_part(&email).to_string(),
            None => "User".to_string(),
        };
        Ok(Identity::new(email, name))
    }
}

/// Delegates the consent flow to an external helper program.
///
/// The helper prints `{"email": ..., "name": ...}` on stdout and exits 0.
/// Empty output or exit code 130 means the user backed out. The helper runs
/// on a worker thread; cancelling the pending handle kills it.
#[derive(Debug, Clone)]
pub struct CommandProvider {
    program: String,
    args: Vec<String>,
}

impl CommandProvider {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// First element is the program, the rest its arguments
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }
}

impl IdentityProvider for CommandProvider {
    fn begin(&mut self) -> PendingSignIn {
        log::info!("starting federated sign-in via {}", self.program);
        let spawned = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                return PendingSignIn::ready(Err(ProviderError::Failed(format!(
                    "cannot run {}: {}",
                    self.program, e
                ))))
            }
        };

        // read both pipes concurrently so a chatty helper cannot fill one and stall
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);
        let child = Arc::new(Mutex::new(child));
        let (pending, tx) = PendingSignIn::watching(Some(Arc::clone(&child)));
        let cancelled = Arc::clone(&pending.cancelled);
        let program = self.program.clone();

        thread::spawn(move || match supervise(&child, &cancelled) {
            Some(Ok(status)) => {
                let outcome = interpret(status, &collect(stdout), &collect(stderr));
                // nobody listening means the handle was dropped
                let _ = tx.send(outcome);
            }
            Some(Err(e)) => {
                let _ = tx.send(Err(e));
            }
            None => log::info!("federated sign-in via {} cancelled", program),
        });

        pending
    }
}

/// Waits for the helper to exit. `None` once the flow was cancelled.
fn supervise(
    child: &Mutex<Child>,
    cancelled: &AtomicBool,
) -> Option<Result<ExitStatus, ProviderError>> {
    loop {
        if cancelled.load(Ordering::SeqCst) {
            if let Ok(mut child) = child.lock() {
                // kill here as well, `cancel` may still be waiting for the lock
                let _ = child.kill();
                let _ = child.wait();
            }
            return None;
        }

        let polled = match child.lock() {
            Ok(mut child) => child.try_wait(),
            Err(_) => return Some(Err(stopped())),
        };
        match polled {
            Ok(Some(status)) => return Some(Ok(status)),
            Ok(None) => thread::sleep(EXIT_POLL),
            Err(e) => {
                return Some(Err(ProviderError::Failed(format!(
                    "lost identity provider: {}",
                    e
                ))))
            }
        }
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buf) {
            log::debug!("identity provider output cut short: {}", e);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(reader: Option<JoinHandle<String>>) -> String {
    reader
        .and_then(|reader| reader.join().ok())
        .unwrap_or_default()
}

fn interpret(status: ExitStatus, stdout: &str, stderr: &str) -> SignInOutcome {
    if status.code() == Some(CANCELLED_EXIT_CODE) {
        return Err(ProviderError::Cancelled);
    }
    if !status.success() {
        log::warn!("identity provider failed ({}): {}", status, stderr.trim());
        return Err(ProviderError::Failed(stderr.to_string()));
    }

    let reply = stdout.trim();
    if reply.is_empty() {
        return Err(ProviderError::Cancelled);
    }
    serde_json::from_str::<ProviderReply>(reply)
        .map_err(|e| ProviderError::Failed(format!("unreadable provider reply: {}", e)))?
        .into_identity()
}

pub fn from_config(command: Option<&[String]>) -> Box<dyn IdentityProvider> {
    match command.and_then(CommandProvider::from_argv) {
        Some(provider) => Box::new(provider),
        None => Box::new(UnconfiguredProvider),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::time::Instant;

    #[test]
    fn unconfigured_provider_is_unavailable() {
        assert_eq!(
            UnconfiguredProvider.authenticate(),
            Err(ProviderError::Unavailable)
        );
    }

    #[test]
    fn reply_name_fallbacks() {
        let full = ProviderReply {
            email: Some("g@mail.com".into()),
            name: Some("Grace".into()),
        };
        assert_eq!(full.into_identity(), Ok(Identity::new("g@mail.com", "Grace")));

        let nameless = ProviderReply {
            email: Some("g@mail.com".into()),
            name: None,
        };
        assert_eq!(nameless.into_identity().unwrap().name, "g");

        let blank_local = ProviderReply {
            email: Some("@mail.com".into()),
            name: Some("  ".into()),
        };
        assert_eq!(blank_local.into_identity().unwrap().name, "User");
    }

    #[test]
    fn reply_without_email_is_rejected() {
        let missing = ProviderReply {
            email: None,
            name: Some("Grace".into()),
        };
        assert_matches!(
            missing.into_identity(),
            Err(ProviderError::Failed(msg)) if msg.contains("no email")
        );

        let blank = ProviderReply {
            email: Some("   ".into()),
            name: None,
        };
        assert_matches!(blank.into_identity(), Err(ProviderError::Failed(_)));
    }

    #[test]
    fn ready_handle_answers_once() {
        let pending = PendingSignIn::ready(Err(ProviderError::Cancelled));
        assert_eq!(pending.poll(), Some(Err(ProviderError::Cancelled)));
        // producer is gone after the single answer
        assert_matches!(pending.poll(), Some(Err(ProviderError::Failed(_))));
    }

    #[test]
    fn channel_handle_stays_pending_until_answered() {
        let (pending, tx) = PendingSignIn::channel();
        assert_eq!(pending.poll(), None);
        tx.send(Ok(Identity::from_email("g@mail.com"))).unwrap();
        assert_eq!(pending.poll(), Some(Ok(Identity::from_email("g@mail.com"))));
    }

    #[test]
    fn dropping_handle_cancels_it() {
        let (pending, tx) = PendingSignIn::channel();
        let flag = Arc::clone(&pending.cancelled);
        drop(pending);
        assert!(flag.load(Ordering::SeqCst));
        // late answers go nowhere
        assert!(tx.send(Err(ProviderError::Cancelled)).is_err());
    }

    #[test]
    fn from_argv_needs_a_program() {
        assert!(CommandProvider::from_argv(&[]).is_none());
        let p = CommandProvider::from_argv(&["helper".into(), "--flag".into()]).unwrap();
        assert_eq!(p.program, "helper");
        assert_eq!(p.args, vec!["--flag".to_string()]);
    }

    #[test]
    fn missing_program_is_a_failure() {
        let mut p = CommandProvider::new("definitely-not-a-real-binary-tomato", vec![]);
        assert_matches!(p.authenticate(), Err(ProviderError::Failed(msg)) if msg.contains("cannot run"));
    }

    #[cfg(unix)]
    fn sh(script: &str) -> CommandProvider {
        CommandProvider::new("sh", vec!["-c".into(), script.into()])
    }

    #[cfg(unix)]
    #[test]
    fn helper_reply_becomes_identity() {
        let mut p = sh(r#"echo '{"email":"g@mail.com","name":"Grace"}'"#);
        assert_eq!(p.authenticate(), Ok(Identity::new("g@mail.com", "Grace")));
    }

    #[cfg(unix)]
    #[test]
    fn helper_without_email_is_a_failure() {
        let mut p = sh(r#"echo '{"name":"Grace"}'"#);
        assert_matches!(p.authenticate(), Err(ProviderError::Failed(_)));
    }

    #[cfg(unix)]
    #[test]
    fn helper_cancel_paths() {
        assert_eq!(sh("exit 130").authenticate(), Err(ProviderError::Cancelled));
        assert_eq!(sh("true").authenticate(), Err(ProviderError::Cancelled));
    }

    #[cfg(unix)]
    #[test]
    fn helper_error_text_is_surfaced() {
        let err = sh("echo 'consent denied' >&2; exit 1")
            .authenticate()
            .unwrap_err();
        assert_eq!(err.to_string(), "consent denied");

        let silent = sh("exit 3").authenticate().unwrap_err();
        assert_eq!(silent.to_string(), "Federated sign-in failed");
    }

    #[cfg(unix)]
    #[test]
    fn helper_garbage_is_a_failure() {
        assert_matches!(
            sh("echo nope").authenticate(),
            Err(ProviderError::Failed(_))
        );
    }

    #[cfg(unix)]
    #[test]
    fn begin_returns_while_helper_still_runs() {
        let started = Instant::now();
        let pending = sh("exec sleep 5").begin();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(pending.poll(), None);

        pending.cancel();
        assert!(pending.is_cancelled());
        // the worker gives up without answering
        let answered = pending.wait();
        assert_matches!(answered, Err(ProviderError::Failed(_)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
