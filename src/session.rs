use std::cell::RefCell;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::util::local_part;

/// Who is signed in, independent of how they authenticated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub name: String,
}

impl Identity {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }

    /// Local accounts are named after the local part of their email
    pub fn from_email(email: &str) -> Self {
        Self::new(email, local_part(email))
    }

    /// Avatar letter for the dashboard header
    pub fn initial(&self) -> char {
        self.name
            .chars()
            .next()
            .and_then(|c| c.to_uppercase().next())
            .unwrap_or('?')
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub identity: Identity,
    pub authenticated_at: DateTime<Local>,
}

impl Session {
    pub fn begin(identity: Identity) -> Self {
        Self {
            identity,
            authenticated_at: Local::now(),
        }
    }
}

/// Persistence boundary for the signed-in identity snapshot
pub trait SessionStore {
    /// Missing or unreadable snapshots load as no session
    fn load(&self) -> Option<Identity>;
    fn save(&self, identity: &Identity) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<Identity> {
        let bytes = fs::read(&self.path).ok()?;
        match serde_json::from_slice::<Identity>(&bytes) {
            Ok(identity) => Some(identity),
            Err(e) => {
                log::warn!(
                    "ignoring unreadable session snapshot {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    fn save(&self, identity: &Identity) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(identity)?;
        fs::write(&self.path, data)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local store; nothing survives the process. Used by tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: RefCell<Option<Identity>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(identity: Identity) -> Self {
        Self {
            slot: RefCell::new(Some(identity)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<Identity> {
        self.slot.borrow().clone()
    }

    fn save(&self, identity: &Identity) -> Result<(), StoreError> {
        *self.slot.borrow_mut() = Some(identity.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.slot.borrow_mut().take();
        Ok(())
    }
}
