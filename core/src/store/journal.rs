//! Store methods for recorded journal entries.

use super::JournalStore;
use crate::{date::JournalDate, error::JournalResult, journal::JournalEntry};
use rusqlite::params;

fn entry_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<JournalEntry> {
    let entry_date = row.get::<_, String>(3)?.parse::<JournalDate>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(JournalEntry {
        entry_id: row.get(0)?,
        user_id: row.get(1)?,
        prompt_id: row.get(2)?,
        entry_date,
        answer: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl JournalStore {
    // ── Journal entry ──────────────────────────────────────────────

    /// Insert a day's entries together, or none of them.
    pub fn insert_entries(&self, entries: &[JournalEntry]) -> JournalResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for e in entries {
            tx.execute(
                "INSERT INTO journal_entry (entry_id, user_id, prompt_id, entry_date, answer, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    e.entry_id,
                    e.user_id,
                    e.prompt_id,
                    e.entry_date.to_string(),
                    e.answer,
                    e.created_at,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn entries_for_date(
        &self,
        user_id: &str,
        date: &JournalDate,
    ) -> JournalResult<Vec<JournalEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT entry_id, user_id, prompt_id, entry_date, answer, created_at
             FROM journal_entry WHERE user_id = ?1 AND entry_date = ?2
             ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![user_id, date.to_string()], entry_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Distinct days with at least one entry, newest first.
    pub fn entry_dates(&self, user_id: &str) -> JournalResult<Vec<JournalDate>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT entry_date FROM journal_entry
             WHERE user_id = ?1 ORDER BY entry_date DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            row.get::<_, String>(0)?.parse::<JournalDate>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Number of entries answering a prompt, across all users and days.
    pub fn entry_count_for_prompt(&self, prompt_id: &str) -> JournalResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM journal_entry WHERE prompt_id = ?1",
            params![prompt_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
