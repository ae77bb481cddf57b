//! SQLite persistence layer.
//!
//! RULE: Only the store modules talk to the database.
//! Everything else calls store methods and never executes SQL directly.
//! Multi-row mutations run inside one transaction; a dropped transaction
//! rolls back, so a failure never leaves a half-applied change.

use crate::{
    error::{JournalError, JournalResult},
    profile::{Organization, User},
};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::time::Duration;

mod category;
mod group;
mod journal;
mod profile;
mod prompt;

pub struct JournalStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl JournalStore {
    pub fn open(path: &str) -> JournalResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        // Writers on other connections queue for the lock instead of failing.
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> JournalResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new in-memory database (isolated).
    /// For file-based databases, this opens the same file, which lets each
    /// worker thread resolve prompts on its own connection.
    pub fn reopen(&self) -> JournalResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Run `f` inside one write transaction, taken up front so no other
    /// connection can write between its reads and its writes. An error from
    /// `f` rolls everything back. Calls made while a transaction is already
    /// open join it.
    pub fn immediate<T>(&self, f: impl FnOnce(&Self) -> JournalResult<T>) -> JournalResult<T> {
        if !self.conn.is_autocommit() {
            return f(self);
        }
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> JournalResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_prompts.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_profiles.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/004_journal.sql"))?;
        Ok(())
    }

    // ── Organization ───────────────────────────────────────────

    pub fn insert_organization(&self, org: &Organization) -> JournalResult<()> {
        self.conn.execute(
            "INSERT INTO organization (organization_id, name, code, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![org.organization_id, org.name, org.code, org.created_at],
        )?;
        Ok(())
    }

    pub fn organization_by_code(&self, code: &str) -> JournalResult<Option<Organization>> {
        let org = self
            .conn
            .query_row(
                "SELECT organization_id, name, code, created_at
                 FROM organization WHERE code = ?1",
                params![code],
                |row| {
                    Ok(Organization {
                        organization_id: row.get(0)?,
                        name: row.get(1)?,
                        code: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(org)
    }

    // ── User ───────────────────────────────────────────────────

    pub fn insert_user(&self, user: &User) -> JournalResult<()> {
        self.conn.execute(
            "INSERT INTO app_user (user_id, organization_id, email, name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.user_id,
                user.organization_id,
                user.email,
                user.name,
                user.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, user_id: &str) -> JournalResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT user_id, organization_id, email, name, created_at
                 FROM app_user WHERE user_id = ?1",
                params![user_id],
                user_row_mapper,
            )
            .optional()?;
        Ok(user)
    }

    pub fn find_user_by_email(&self, email: &str) -> JournalResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT user_id, organization_id, email, name, created_at
                 FROM app_user WHERE email = ?1",
                params![email],
                user_row_mapper,
            )
            .optional()?;
        Ok(user)
    }

    /// Fetch a user or fail with NotFound.
    pub fn require_user(&self, user_id: &str) -> JournalResult<User> {
        self.get_user(user_id)?
            .ok_or_else(|| JournalError::not_found("User", user_id))
    }
}

fn user_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        user_id: row.get(0)?,
        organization_id: row.get(1)?,
        email: row.get(2)?,
        name: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// `?1, ?2, ... ?n` for dynamic IN lists.
fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}
