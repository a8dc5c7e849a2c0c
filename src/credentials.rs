use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Local;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;

/// One row of the credential directory. The password is only ever held as
/// an Argon2 PHC string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub name: String,
    pub password_hash: String,
}

/// Email-keyed credential table
pub trait CredentialDirectory {
    fn lookup(&self, email: &str) -> Result<Option<CredentialRecord>, StoreError>;
    fn insert(&self, email: &str, record: &CredentialRecord) -> Result<(), StoreError>;
}

pub fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::Hash(e.to_string()))
}

/// False for a wrong password and for an unparseable stored hash alike
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::warn!("stored password hash is unreadable: {}", e);
            false
        }
    }
}

/// SQLite-backed directory
#[derive(Debug)]
pub struct SqliteDirectory {
    conn: Connection,
}

impl SqliteDirectory {
    /// Open (creating if needed) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                email TEXT PRIMARY KEY NOT NULL,
                name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        Ok(SqliteDirectory { conn })
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

impl CredentialDirectory for SqliteDirectory {
    fn lookup(&self, email: &str) -> Result<Option<CredentialRecord>, StoreError> {
        let record = self
            .conn
            .query_row(
                "SELECT name, password_hash FROM accounts WHERE email = ?1",
                [email],
                |row| {
                    Ok(CredentialRecord {
                        name: row.get(0)?,
                        password_hash: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn insert(&self, email: &str, record: &CredentialRecord) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO accounts (email, name, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                email,
                record.name,
                record.password_hash,
                Local::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryDirectory {
    records: RefCell<HashMap<String, CredentialRecord>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialDirectory for MemoryDirectory {
    fn lookup(&self, email: &str) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.records.borrow().get(email).cloned())
    }

    fn insert(&self, email: &str, record: &CredentialRecord) -> Result<(), StoreError> {
        self.records
            .borrow_mut()
            .insert(email.to_string(), record.clone());
        Ok(())
    }
}
