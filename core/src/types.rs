//! Shared primitive types used across the journal core.

/// Identifier of an organization (tenant).
pub type OrgId = String;

/// Identifier of a user.
pub type UserId = String;

/// Identifier of a prompt.
pub type PromptId = String;

/// Identifier of a prompt category.
pub type CategoryId = String;

/// Identifier of a profile.
pub type ProfileId = String;

/// Identifier of a profile rule.
pub type RuleId = String;

/// Identifier of a user group.
pub type GroupId = String;

/// Identifier of a recorded journal entry.
pub type EntryId = String;

/// Creation timestamp, microseconds since the Unix epoch.
pub type Timestamp = i64;

/// Fresh random identifier for a new row.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current wall-clock time as a [`Timestamp`].
///
/// Only used to stamp new rows. Nothing in resolution reads the clock.
pub fn now_micros() -> Timestamp {
    chrono::Utc::now().timestamp_micros()
}
