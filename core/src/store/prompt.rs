use super::JournalStore;
use crate::{
    error::{JournalError, JournalResult},
    profile::PoolKey,
    prompt::{ChoiceLabels, Prompt, PromptType},
};
use rusqlite::{params, OptionalExtension};
use std::collections::HashSet;

const PROMPT_COLUMNS: &str = "prompt_id, organization_id, content, prompt_type, options,
    is_active, is_global, category_id, category_name, sort_order, created_at";

// Helper function for mapping prompt rows
fn prompt_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Prompt> {
    let prompt_id: String = row.get(0)?;
    let prompt_type = row
        .get::<_, String>(3)?
        .parse::<PromptType>()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;
    // A corrupt label list must not take the whole prompt down with it.
    let options = row
        .get::<_, Option<String>>(4)?
        .and_then(|raw| match ChoiceLabels::decode(&raw) {
            Ok(labels) => Some(labels),
            Err(e) => {
                log::warn!("Ignoring undecodable options on prompt {prompt_id}: {e}");
                None
            }
        });
    Ok(Prompt {
        prompt_id,
        organization_id: row.get(1)?,
        content: row.get(2)?,
        prompt_type,
        options,
        is_active: row.get::<_, i32>(5)? != 0,
        is_global: row.get::<_, i32>(6)? != 0,
        category_id: row.get(7)?,
        category_name: row.get(8)?,
        sort_order: row.get(9)?,
        created_at: row.get(10)?,
    })
}

impl JournalStore {
    // ── Prompt ─────────────────────────────────────────────────────

    pub fn insert_prompt(&self, p: &Prompt) -> JournalResult<()> {
        let options = p.options.as_ref().map(ChoiceLabels::encode).transpose()?;
        self.conn.execute(
            "INSERT INTO prompt (
                prompt_id, organization_id, content, prompt_type, options,
                is_active, is_global, category_id, category_name, sort_order, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                p.prompt_id,
                p.organization_id,
                p.content,
                p.prompt_type.as_str(),
                options,
                if p.is_active { 1i32 } else { 0i32 },
                if p.is_global { 1i32 } else { 0i32 },
                p.category_id,
                p.category_name,
                p.sort_order,
                p.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_prompt(&self, prompt_id: &str) -> JournalResult<Option<Prompt>> {
        let prompt = self
            .conn
            .query_row(
                &format!("SELECT {PROMPT_COLUMNS} FROM prompt WHERE prompt_id = ?1"),
                params![prompt_id],
                prompt_row_mapper,
            )
            .optional()?;
        Ok(prompt)
    }

    /// Every prompt in the organization, grouped for admin listing.
    pub fn list_prompts(&self, organization_id: &str) -> JournalResult<Vec<Prompt>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROMPT_COLUMNS} FROM prompt WHERE organization_id = ?1
             ORDER BY category_name ASC, sort_order ASC, created_at ASC, rowid ASC"
        ))?;
        let rows = stmt.query_map(params![organization_id], prompt_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Active global prompts of an organization, oldest first.
    pub fn global_prompts(&self, organization_id: &str) -> JournalResult<Vec<Prompt>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROMPT_COLUMNS} FROM prompt
             WHERE organization_id = ?1 AND is_active = 1 AND is_global = 1
             ORDER BY created_at ASC, rowid ASC"
        ))?;
        let rows = stmt.query_map(params![organization_id], prompt_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Active, non-global prompts of the pool, minus `exclude`.
    /// Rows come back in creation order so shuffles are reproducible.
    pub fn prompt_pool(
        &self,
        organization_id: &str,
        key: &PoolKey,
        exclude: &HashSet<String>,
    ) -> JournalResult<Vec<Prompt>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROMPT_COLUMNS} FROM prompt
             WHERE organization_id = ?1 AND is_active = 1 AND is_global = 0
               AND (category_id = ?2 OR category_name = ?3)
             ORDER BY created_at ASC, rowid ASC"
        ))?;
        let rows = stmt.query_map(
            params![organization_id, key.category_id, key.category_name],
            prompt_row_mapper,
        )?;
        let mut pool = Vec::new();
        for prompt in rows {
            let prompt = prompt?;
            if !exclude.contains(&prompt.prompt_id) {
                pool.push(prompt);
            }
        }
        Ok(pool)
    }

    /// Prompts filed under a category id, in display order.
    pub fn prompts_in_category(&self, category_id: &str) -> JournalResult<Vec<Prompt>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROMPT_COLUMNS} FROM prompt WHERE category_id = ?1
             ORDER BY sort_order ASC, created_at ASC, rowid ASC"
        ))?;
        let rows = stmt.query_map(params![category_id], prompt_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn prompt_content_exists(
        &self,
        organization_id: &str,
        content: &str,
    ) -> JournalResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM prompt WHERE organization_id = ?1 AND content = ?2",
            params![organization_id, content],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn next_prompt_sort_order(&self, category_id: Option<&str>) -> JournalResult<i64> {
        let next: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM prompt WHERE category_id IS ?1",
            params![category_id],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    /// Rewrite content, type, options and category of an existing prompt.
    pub fn update_prompt(&self, p: &Prompt) -> JournalResult<()> {
        let options = p.options.as_ref().map(ChoiceLabels::encode).transpose()?;
        let changed = self.conn.execute(
            "UPDATE prompt SET content = ?1, prompt_type = ?2, options = ?3,
                 category_id = ?4, category_name = ?5
             WHERE prompt_id = ?6",
            params![
                p.content,
                p.prompt_type.as_str(),
                options,
                p.category_id,
                p.category_name,
                p.prompt_id,
            ],
        )?;
        if changed == 0 {
            return Err(JournalError::not_found("Prompt", p.prompt_id.as_str()));
        }
        Ok(())
    }

    pub fn set_prompt_active(&self, prompt_id: &str, active: bool) -> JournalResult<()> {
        let changed = self.conn.execute(
            "UPDATE prompt SET is_active = ?1 WHERE prompt_id = ?2",
            params![if active { 1i32 } else { 0i32 }, prompt_id],
        )?;
        if changed == 0 {
            return Err(JournalError::not_found("Prompt", prompt_id));
        }
        Ok(())
    }

    /// Delete a prompt and the journal entries answering it.
    /// Returns the number of entries removed.
    pub fn delete_prompt(&self, prompt_id: &str) -> JournalResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let entries = tx.execute(
            "DELETE FROM journal_entry WHERE prompt_id = ?1",
            params![prompt_id],
        )?;
        let deleted = tx.execute("DELETE FROM prompt WHERE prompt_id = ?1", params![prompt_id])?;
        if deleted == 0 {
            // Dropping tx rolls back.
            return Err(JournalError::not_found("Prompt", prompt_id));
        }
        tx.commit()?;
        Ok(entries)
    }

    /// Persist `ordered` as sort_order 0..n-1 in one transaction.
    pub fn renumber_prompts(&self, ordered: &[String]) -> JournalResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for (index, prompt_id) in ordered.iter().enumerate() {
            tx.execute(
                "UPDATE prompt SET sort_order = ?1 WHERE prompt_id = ?2",
                params![index as i64, prompt_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
