use super::JournalStore;
use crate::{
    error::{JournalError, JournalResult},
    prompt::{CategoryDeletion, PromptCategory},
};
use rusqlite::{params, OptionalExtension};

fn category_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<PromptCategory> {
    Ok(PromptCategory {
        category_id: row.get(0)?,
        organization_id: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl JournalStore {
    // ── Prompt category ───────────────────────────────────────────

    pub fn insert_category(&self, c: &PromptCategory) -> JournalResult<()> {
        self.conn.execute(
            "INSERT INTO prompt_category (category_id, organization_id, name, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![c.category_id, c.organization_id, c.name, c.created_at],
        )?;
        Ok(())
    }

    pub fn get_category(&self, category_id: &str) -> JournalResult<Option<PromptCategory>> {
        let category = self
            .conn
            .query_row(
                "SELECT category_id, organization_id, name, created_at
                 FROM prompt_category WHERE category_id = ?1",
                params![category_id],
                category_row_mapper,
            )
            .optional()?;
        Ok(category)
    }

    /// Look a category up by name, ignoring ASCII case.
    /// An exact-case match wins when both spellings exist.
    pub fn find_category_by_name(
        &self,
        organization_id: &str,
        name: &str,
    ) -> JournalResult<Option<PromptCategory>> {
        let category = self
            .conn
            .query_row(
                "SELECT category_id, organization_id, name, created_at
                 FROM prompt_category
                 WHERE organization_id = ?1 AND name = ?2 COLLATE NOCASE
                 ORDER BY (name = ?2) DESC, created_at ASC
                 LIMIT 1",
                params![organization_id, name],
                category_row_mapper,
            )
            .optional()?;
        Ok(category)
    }

    pub fn list_categories(&self, organization_id: &str) -> JournalResult<Vec<PromptCategory>> {
        let mut stmt = self.conn.prepare(
            "SELECT category_id, organization_id, name, created_at
             FROM prompt_category WHERE organization_id = ?1
             ORDER BY name ASC",
        )?;
        let rows = stmt.query_map(params![organization_id], category_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a category together with everything hanging off it:
    /// journal entries answering its prompts, the prompts, and the rules
    /// targeting it. Legacy rows are matched by name. One transaction.
    pub fn delete_category_cascade(&self, category_id: &str) -> JournalResult<CategoryDeletion> {
        let tx = self.conn.unchecked_transaction()?;

        let (organization_id, name): (String, String) = tx
            .query_row(
                "SELECT organization_id, name FROM prompt_category WHERE category_id = ?1",
                params![category_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| JournalError::not_found("Category", category_id))?;

        let entries_deleted = tx.execute(
            "DELETE FROM journal_entry WHERE prompt_id IN (
                SELECT prompt_id FROM prompt
                WHERE category_id = ?1
                   OR (category_id IS NULL AND organization_id = ?2 AND category_name = ?3)
             )",
            params![category_id, organization_id, name],
        )?;

        let prompts_deleted = tx.execute(
            "DELETE FROM prompt
             WHERE category_id = ?1
                OR (category_id IS NULL AND organization_id = ?2 AND category_name = ?3)",
            params![category_id, organization_id, name],
        )?;

        let rules_deleted = tx.execute(
            "DELETE FROM profile_rule
             WHERE category_id = ?1
                OR (category_id IS NULL
                    AND lower(category_name) = lower(?3)
                    AND profile_id IN (SELECT profile_id FROM profile WHERE organization_id = ?2))",
            params![category_id, organization_id, name],
        )?;

        tx.execute(
            "DELETE FROM prompt_category WHERE category_id = ?1",
            params![category_id],
        )?;
        tx.commit()?;

        log::info!(
            "Deleted category '{name}': {prompts_deleted} prompts, {rules_deleted} rules, \
             {entries_deleted} entries"
        );
        Ok(CategoryDeletion {
            prompts_deleted,
            rules_deleted,
            category_name: name,
        })
    }
}
