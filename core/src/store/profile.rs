use super::{placeholders, JournalStore};
use crate::{
    error::{JournalError, JournalResult},
    profile::{Profile, ProfileRule, ProfileWithRules},
};
use rusqlite::{params, params_from_iter, OptionalExtension};

const RULE_COLUMNS: &str = "rule_id, profile_id, category_id, category_name,
    min_count, max_count, include_all, sort_order, created_at";

fn profile_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        profile_id: row.get(0)?,
        organization_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn rule_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProfileRule> {
    Ok(ProfileRule {
        rule_id: row.get(0)?,
        profile_id: row.get(1)?,
        category_id: row.get(2)?,
        category_name: row.get(3)?,
        min_count: row.get(4)?,
        max_count: row.get(5)?,
        include_all: row.get::<_, i32>(6)? != 0,
        sort_order: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl JournalStore {
    // ── Profile ────────────────────────────────────────────────────

    pub fn insert_profile(&self, p: &Profile) -> JournalResult<()> {
        self.conn.execute(
            "INSERT INTO profile (profile_id, organization_id, name, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![p.profile_id, p.organization_id, p.name, p.description, p.created_at],
        )?;
        Ok(())
    }

    pub fn get_profile(&self, profile_id: &str) -> JournalResult<Option<Profile>> {
        let profile = self
            .conn
            .query_row(
                "SELECT profile_id, organization_id, name, description, created_at
                 FROM profile WHERE profile_id = ?1",
                params![profile_id],
                profile_row_mapper,
            )
            .optional()?;
        Ok(profile)
    }

    pub fn list_profiles(&self, organization_id: &str) -> JournalResult<Vec<Profile>> {
        let mut stmt = self.conn.prepare(
            "SELECT profile_id, organization_id, name, description, created_at
             FROM profile WHERE organization_id = ?1
             ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![organization_id], profile_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn update_profile(
        &self,
        profile_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> JournalResult<()> {
        let changed = self.conn.execute(
            "UPDATE profile SET name = ?1, description = ?2 WHERE profile_id = ?3",
            params![name, description, profile_id],
        )?;
        if changed == 0 {
            return Err(JournalError::not_found("Profile", profile_id));
        }
        Ok(())
    }

    /// Rules and assignments go with the profile (ON DELETE CASCADE).
    pub fn delete_profile(&self, profile_id: &str) -> JournalResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM profile WHERE profile_id = ?1", params![profile_id])?;
        if changed == 0 {
            return Err(JournalError::not_found("Profile", profile_id));
        }
        Ok(())
    }

    /// Load profiles by id, oldest first, each with its rules in
    /// evaluation order. Unknown ids are skipped.
    pub fn profiles_with_rules(&self, profile_ids: &[String]) -> JournalResult<Vec<ProfileWithRules>> {
        if profile_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(&format!(
            "SELECT profile_id, organization_id, name, description, created_at
             FROM profile WHERE profile_id IN ({})
             ORDER BY created_at ASC, rowid ASC",
            placeholders(profile_ids.len())
        ))?;
        let profiles = stmt
            .query_map(params_from_iter(profile_ids.iter()), profile_row_mapper)?
            .collect::<Result<Vec<_>, _>>()?;

        profiles
            .into_iter()
            .map(|profile| {
                let rules = self.rules_for_profile(&profile.profile_id)?;
                Ok(ProfileWithRules { profile, rules })
            })
            .collect()
    }

    // ── Profile rule ───────────────────────────────────────────────

    pub fn insert_rule(&self, r: &ProfileRule) -> JournalResult<()> {
        self.conn.execute(
            "INSERT INTO profile_rule (
                rule_id, profile_id, category_id, category_name,
                min_count, max_count, include_all, sort_order, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                r.rule_id,
                r.profile_id,
                r.category_id,
                r.category_name,
                r.min_count,
                r.max_count,
                if r.include_all { 1i32 } else { 0i32 },
                r.sort_order,
                r.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_rule(&self, rule_id: &str) -> JournalResult<Option<ProfileRule>> {
        let rule = self
            .conn
            .query_row(
                &format!("SELECT {RULE_COLUMNS} FROM profile_rule WHERE rule_id = ?1"),
                params![rule_id],
                rule_row_mapper,
            )
            .optional()?;
        Ok(rule)
    }

    /// A profile's rules, stably sorted: sort_order, then creation time.
    pub fn rules_for_profile(&self, profile_id: &str) -> JournalResult<Vec<ProfileRule>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RULE_COLUMNS} FROM profile_rule WHERE profile_id = ?1
             ORDER BY sort_order ASC, created_at ASC, rowid ASC"
        ))?;
        let rows = stmt.query_map(params![profile_id], rule_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// First rule of the profile already targeting this category, matched
    /// exactly on id or case-insensitively on the legacy name.
    pub fn find_conflicting_rule(
        &self,
        profile_id: &str,
        category_id: Option<&str>,
        category_name: &str,
        excluding_rule: Option<&str>,
    ) -> JournalResult<Option<ProfileRule>> {
        let rule = self
            .conn
            .query_row(
                &format!(
                    "SELECT {RULE_COLUMNS} FROM profile_rule
                     WHERE profile_id = ?1
                       AND (?4 IS NULL OR rule_id != ?4)
                       AND ((?2 IS NOT NULL AND category_id = ?2)
                            OR lower(category_name) = lower(?3))
                     ORDER BY sort_order ASC, created_at ASC, rowid ASC
                     LIMIT 1"
                ),
                params![profile_id, category_id, category_name, excluding_rule],
                rule_row_mapper,
            )
            .optional()?;
        Ok(rule)
    }

    pub fn next_rule_sort_order(&self, profile_id: &str) -> JournalResult<i64> {
        let next: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM profile_rule WHERE profile_id = ?1",
            params![profile_id],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    /// Rewrite target and counts; sort_order and created_at are kept.
    pub fn update_rule(&self, r: &ProfileRule) -> JournalResult<()> {
        let changed = self.conn.execute(
            "UPDATE profile_rule SET category_id = ?1, category_name = ?2,
                 min_count = ?3, max_count = ?4, include_all = ?5
             WHERE rule_id = ?6",
            params![
                r.category_id,
                r.category_name,
                r.min_count,
                r.max_count,
                if r.include_all { 1i32 } else { 0i32 },
                r.rule_id,
            ],
        )?;
        if changed == 0 {
            return Err(JournalError::not_found("Rule", r.rule_id.as_str()));
        }
        Ok(())
    }

    pub fn delete_rule(&self, rule_id: &str) -> JournalResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM profile_rule WHERE rule_id = ?1", params![rule_id])?;
        if changed == 0 {
            return Err(JournalError::not_found("Rule", rule_id));
        }
        Ok(())
    }

    /// Persist `ordered` as sort_order 0..n-1. All rows or none.
    pub fn renumber_rules(&self, ordered: &[String]) -> JournalResult<()> {
        self.immediate(|store| {
            for (index, rule_id) in ordered.iter().enumerate() {
                let changed = store.conn.execute(
                    "UPDATE profile_rule SET sort_order = ?1 WHERE rule_id = ?2",
                    params![index as i64, rule_id],
                )?;
                if changed == 0 {
                    return Err(JournalError::not_found("Rule", rule_id.as_str()));
                }
            }
            Ok(())
        })
    }
}
