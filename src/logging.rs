use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use env_logger::{Builder, Env, Target};

/// Send log output to `path`. The terminal belongs to the TUI, so nothing
/// is ever written to stderr. `RUST_LOG` wins over `level`.
pub fn init(path: &Path, level: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let result = Builder::from_env(Env::default().default_filter_or(level))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init();
    if result.is_err() {
        // already initialised (tests, repeated calls)
        log::debug!("logger already installed");
    }
    Ok(())
}
