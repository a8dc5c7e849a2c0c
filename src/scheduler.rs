use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::runtime::AppEvent;

/// Period of the countdown driver
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

static NEXT_TICK_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies the handle a tick was posted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickId(u64);

/// Cancellable claim on a running periodic tick.
///
/// The tick source keeps firing until the handle is cancelled or dropped.
/// Every handle gets a fresh `TickId`, unique within the process.
#[derive(Debug)]
pub struct TickHandle {
    id: TickId,
    cancelled: Arc<AtomicBool>,
}

impl TickHandle {
    fn new() -> (Self, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Self {
                id: TickId(NEXT_TICK_ID.fetch_add(1, Ordering::Relaxed)),
                cancelled: Arc::clone(&flag),
            },
            flag,
        )
    }

    pub fn id(&self) -> TickId {
        self.id
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Something that can start a one-second periodic tick
pub trait TickScheduler {
    fn schedule_tick(&self) -> TickHandle;
}

/// Production scheduler: one background thread per handle, posting
/// `AppEvent::Tick` tagged with the handle's id into the app's event channel.
#[derive(Debug, Clone)]
pub struct ThreadTickScheduler {
    tx: Sender<AppEvent>,
    interval: Duration,
}

impl ThreadTickScheduler {
    pub fn new(tx: Sender<AppEvent>, interval: Duration) -> Self {
        Self { tx, interval }
    }
}

impl TickScheduler for ThreadTickScheduler {
    fn schedule_tick(&self) -> TickHandle {
        let (handle, cancelled) = TickHandle::new();
        let id = handle.id();
        let tx = self.tx.clone();
        let interval = self.interval;

        thread::spawn(move || loop {
            thread::sleep(interval);
            if cancelled.load(Ordering::SeqCst) {
                break;
            }
            if tx.send(AppEvent::Tick(id)).is_err() {
                break;
            }
        });

        handle
    }
}

/// Test scheduler: hands out handles without spawning anything, and keeps
/// the flags so tests can count live handles.
#[derive(Debug, Clone, Default)]
pub struct ManualTickScheduler {
    issued: Arc<AtomicUsize>,
    flags: Arc<Mutex<Vec<Arc<AtomicBool>>>>,
}

impl ManualTickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles handed out so far
    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    /// Number of handles not yet cancelled
    pub fn live(&self) -> usize {
        self.flags
            .lock()
            .map(|flags| flags.iter().filter(|f| !f.load(Ordering::SeqCst)).count())
            .unwrap_or(0)
    }
}

impl TickScheduler for ManualTickScheduler {
    fn schedule_tick(&self) -> TickHandle {
        let (handle, flag) = TickHandle::new();
        self.issued.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut flags) = self.flags.lock() {
            flags.push(flag);
        }
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn dropping_handle_cancels_it() {
        let scheduler = ManualTickScheduler::new();
        let handle = scheduler.schedule_tick();
        assert_eq!(scheduler.live(), 1);
        drop(handle);
        assert_eq!(scheduler.live(), 0);
        assert_eq!(scheduler.issued(), 1);
    }

    #[test]
    fn cancel_is_idempotent() {
        let scheduler = ManualTickScheduler::new();
        let handle = scheduler.schedule_tick();
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(scheduler.live(), 0);
    }

    #[test]
    fn every_handle_gets_its_own_id() {
        let scheduler = ManualTickScheduler::new();
        let first = scheduler.schedule_tick();
        let second = scheduler.schedule_tick();
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn thread_scheduler_posts_ticks_until_cancelled() {
        let (tx, rx) = mpsc::channel();
        let scheduler = ThreadTickScheduler::new(tx, Duration::from_millis(5));
        let handle = scheduler.schedule_tick();

        match rx.recv_timeout(Duration::from_secs(2)) {
            Ok(AppEvent::Tick(id)) => assert_eq!(id, handle.id()),
            other => panic!("expected a tick, got {:?}", other),
        }

        handle.cancel();
        // let any in-flight sleep finish, then drain
        thread::sleep(Duration::from_millis(30));
        while rx.try_recv().is_ok() {}
        thread::sleep(Duration::from_millis(30));
        assert!(rx.try_recv().is_err(), "no ticks after cancel");
    }

    #[test]
    fn thread_scheduler_stops_when_channel_closes() {
        let (tx, rx) = mpsc::channel();
        let scheduler = ThreadTickScheduler::new(tx, Duration::from_millis(1));
        let handle = scheduler.schedule_tick();
        drop(rx);
        drop(scheduler);
        thread::sleep(Duration::from_millis(10));
        // thread exits on send failure; handle is still usable
        assert!(!handle.is_cancelled());
    }
}
