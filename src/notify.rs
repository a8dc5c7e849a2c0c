use std::io::{self, Write};

use crate::timer::Phase;

/// Audible alert fired when a phase runs out
pub trait Notifier {
    /// `finished` is the phase that just ended.
    fn notify(&mut self, finished: Phase) -> io::Result<()>;
}

/// Rings the terminal bell on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl Notifier for TerminalBell {
    fn notify(&mut self, _finished: Phase) -> io::Result<()> {
        let mut out = io::stdout();
        out.write_all(b"\x07")?;
        out.flush()
    }
}

/// Used with `--no-bell`
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&mut self, _finished: Phase) -> io::Result<()> {
        Ok(())
    }
}

pub fn from_config(bell: bool) -> Box<dyn Notifier> {
    if bell {
        Box::new(TerminalBell)
    } else {
        Box::new(SilentNotifier)
    }
}
