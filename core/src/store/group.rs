//! Store methods for user groups and profile assignments.

use super::{user_row_mapper, JournalStore};
use crate::{
    error::{JournalError, JournalResult},
    profile::{User, UserGroup},
};
use rusqlite::{params, OptionalExtension};

fn group_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserGroup> {
    Ok(UserGroup {
        group_id: row.get(0)?,
        organization_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl JournalStore {
    // ── User group ─────────────────────────────────────────────────

    pub fn insert_group(&self, g: &UserGroup) -> JournalResult<()> {
        self.conn.execute(
            "INSERT INTO user_group (group_id, organization_id, name, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![g.group_id, g.organization_id, g.name, g.description, g.created_at],
        )?;
        Ok(())
    }

    pub fn get_group(&self, group_id: &str) -> JournalResult<Option<UserGroup>> {
        let group = self
            .conn
            .query_row(
                "SELECT group_id, organization_id, name, description, created_at
                 FROM user_group WHERE group_id = ?1",
                params![group_id],
                group_row_mapper,
            )
            .optional()?;
        Ok(group)
    }

    pub fn list_groups(&self, organization_id: &str) -> JournalResult<Vec<UserGroup>> {
        let mut stmt = self.conn.prepare(
            "SELECT group_id, organization_id, name, description, created_at
             FROM user_group WHERE organization_id = ?1
             ORDER BY name ASC",
        )?;
        let rows = stmt.query_map(params![organization_id], group_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn update_group(
        &self,
        group_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> JournalResult<()> {
        let changed = self.conn.execute(
            "UPDATE user_group SET name = ?1, description = ?2 WHERE group_id = ?3",
            params![name, description, group_id],
        )?;
        if changed == 0 {
            return Err(JournalError::not_found("Group", group_id));
        }
        Ok(())
    }

    pub fn delete_group(&self, group_id: &str) -> JournalResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM user_group WHERE group_id = ?1", params![group_id])?;
        if changed == 0 {
            return Err(JournalError::not_found("Group", group_id));
        }
        Ok(())
    }

    // ── Membership ─────────────────────────────────────────────────

    pub fn add_group_member(&self, group_id: &str, user_id: &str) -> JournalResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO group_member (group_id, user_id) VALUES (?1, ?2)",
            params![group_id, user_id],
        )?;
        Ok(())
    }

    pub fn remove_group_member(&self, group_id: &str, user_id: &str) -> JournalResult<()> {
        self.conn.execute(
            "DELETE FROM group_member WHERE group_id = ?1 AND user_id = ?2",
            params![group_id, user_id],
        )?;
        Ok(())
    }

    pub fn group_members(&self, group_id: &str) -> JournalResult<Vec<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT u.user_id, u.organization_id, u.email, u.name, u.created_at
             FROM group_member gm JOIN app_user u ON u.user_id = gm.user_id
             WHERE gm.group_id = ?1
             ORDER BY u.email ASC",
        )?;
        let rows = stmt.query_map(params![group_id], user_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Profile assignment ─────────────────────────────────────────

    /// Replace the group's profile set in one transaction.
    pub fn set_group_profiles(&self, group_id: &str, profile_ids: &[String]) -> JournalResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM group_profile WHERE group_id = ?1", params![group_id])?;
        for profile_id in profile_ids {
            tx.execute(
                "INSERT OR IGNORE INTO group_profile (group_id, profile_id) VALUES (?1, ?2)",
                params![group_id, profile_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Replace the user's direct profile set in one transaction.
    pub fn set_user_profiles(&self, user_id: &str, profile_ids: &[String]) -> JournalResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM user_profile WHERE user_id = ?1", params![user_id])?;
        for profile_id in profile_ids {
            tx.execute(
                "INSERT OR IGNORE INTO user_profile (user_id, profile_id) VALUES (?1, ?2)",
                params![user_id, profile_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn direct_profile_ids(&self, user_id: &str) -> JournalResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT profile_id FROM user_profile WHERE user_id = ?1")?;
        let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Profile ids of every group the user belongs to (may repeat).
    pub fn group_profile_ids_for_user(&self, user_id: &str) -> JournalResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT gp.profile_id
             FROM group_member gm JOIN group_profile gp ON gp.group_id = gm.group_id
             WHERE gm.user_id = ?1",
        )?;
        let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
