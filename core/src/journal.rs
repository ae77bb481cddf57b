//! Recorded answers and the per-day journal view.

use crate::{
    date::JournalDate,
    error::{JournalError, JournalResult},
    prompt::Prompt,
    store::JournalStore,
    types::{new_id, now_micros, EntryId, OrgId, PromptId, Timestamp, UserId},
};
use serde::{Deserialize, Serialize};

/// One answer to one prompt on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub entry_id: EntryId,
    pub user_id: UserId,
    pub prompt_id: PromptId,
    pub entry_date: JournalDate,
    /// Plain text for a single value, a JSON array for several.
    pub answer: String,
    pub created_at: Timestamp,
}

/// Submitted values for a prompt. Checkbox prompts submit several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub prompt_id: PromptId,
    pub values: Vec<String>,
}

impl Answer {
    pub fn text(prompt_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            prompt_id: prompt_id.into(),
            values: vec![value.into()],
        }
    }

    /// Stored form, or None when every value is blank.
    fn encode(&self) -> JournalResult<Option<String>> {
        let values: Vec<&str> = self
            .values
            .iter()
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
            .collect();
        Ok(match values.as_slice() {
            [] => None,
            [single] => Some(single.to_string()),
            many => Some(serde_json::to_string(many)?),
        })
    }
}

/// What a user sees for one day.
#[derive(Debug, Clone, Serialize)]
pub struct DailyView {
    pub user_id: UserId,
    pub organization_id: OrgId,
    pub date: JournalDate,
    /// False when the user inherits no profile at all.
    pub has_configuration: bool,
    pub prompts: Vec<Prompt>,
    pub entries: Vec<JournalEntry>,
}

/// Store a day's answers. Blank answers are dropped; the rest are written
/// together or not at all. Returns the stored entries.
pub fn record_answers(
    store: &JournalStore,
    user_id: &str,
    date: &JournalDate,
    answers: &[Answer],
) -> JournalResult<Vec<JournalEntry>> {
    store.require_user(user_id)?;

    let mut entries = Vec::with_capacity(answers.len());
    for answer in answers {
        let Some(encoded) = answer.encode()? else {
            continue;
        };
        if store.get_prompt(&answer.prompt_id)?.is_none() {
            return Err(JournalError::not_found("Prompt", answer.prompt_id.as_str()));
        }
        entries.push(JournalEntry {
            entry_id: new_id(),
            user_id: user_id.to_string(),
            prompt_id: answer.prompt_id.clone(),
            entry_date: *date,
            answer: encoded,
            created_at: now_micros(),
        });
    }

    store.insert_entries(&entries)?;
    log::debug!("Recorded {} entries for {user_id} on {date}", entries.len());
    Ok(entries)
}

pub fn entries_for_date(
    store: &JournalStore,
    user_id: &str,
    date: &JournalDate,
) -> JournalResult<Vec<JournalEntry>> {
    store.entries_for_date(user_id, date)
}

/// Days with at least one entry, newest first.
pub fn history_dates(store: &JournalStore, user_id: &str) -> JournalResult<Vec<JournalDate>> {
    store.entry_dates(user_id)
}
