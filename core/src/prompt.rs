//! Prompts, prompt categories and the category reference type.

use crate::{
    error::{JournalError, JournalResult},
    types::{CategoryId, OrgId, PromptId, Timestamp},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a prompt is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromptType {
    /// Free text.
    Text,
    /// Single choice.
    Radio,
    /// Multiple choice.
    Checkbox,
    /// Scaled answer on a numeric range.
    Range,
}

impl PromptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Radio => "RADIO",
            Self::Checkbox => "CHECKBOX",
            Self::Range => "RANGE",
        }
    }

    /// Radio and checkbox prompts carry choice labels.
    pub fn has_choices(&self) -> bool {
        matches!(self, Self::Radio | Self::Checkbox)
    }
}

impl FromStr for PromptType {
    type Err = JournalError;

    fn from_str(s: &str) -> JournalResult<Self> {
        match s {
            "TEXT" => Ok(Self::Text),
            "RADIO" => Ok(Self::Radio),
            "CHECKBOX" => Ok(Self::Checkbox),
            "RANGE" => Ok(Self::Range),
            other => Err(JournalError::validation(
                "type",
                format!("unknown prompt type '{other}'"),
            )),
        }
    }
}

impl fmt::Display for PromptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered choice labels of a radio/checkbox prompt.
///
/// Stored as a JSON array string; encoded and decoded only at the store
/// boundary. Resolution never looks inside.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChoiceLabels(pub Vec<String>);

impl ChoiceLabels {
    /// Split an admin-entered "a, b, c" list, dropping blank entries.
    pub fn parse_list(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    pub fn encode(&self) -> JournalResult<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    pub fn decode(raw: &str) -> JournalResult<Self> {
        let labels: Vec<String> = serde_json::from_str(raw)?;
        Ok(Self(labels))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }
}

/// A piece of journaling content shown to users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub prompt_id: PromptId,
    pub organization_id: OrgId,
    pub content: String,
    pub prompt_type: PromptType,
    pub options: Option<ChoiceLabels>,
    pub is_active: bool,
    pub is_global: bool,
    pub category_id: Option<CategoryId>,
    /// Denormalised legacy category name.
    pub category_name: Option<String>,
    pub sort_order: i64,
    pub created_at: Timestamp,
}

/// Named grouping of prompts, unique per (organization, name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptCategory {
    pub category_id: CategoryId,
    pub organization_id: OrgId,
    pub name: String,
    pub created_at: Timestamp,
}

/// How an admin names a category: by id, or by its legacy name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum CategoryRef {
    Id(CategoryId),
    Name(String),
}

impl CategoryRef {
    /// Reject empty references before they reach the store.
    pub fn validate(&self) -> JournalResult<()> {
        let blank = match self {
            Self::Id(id) => id.trim().is_empty(),
            Self::Name(name) => name.trim().is_empty(),
        };
        if blank {
            return Err(JournalError::validation(
                "category",
                "a category id or name is required",
            ));
        }
        Ok(())
    }
}

/// A category reference after lookup: the canonical id when the category
/// exists, and the name used for legacy matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCategory {
    pub category_id: Option<CategoryId>,
    pub name: String,
}

/// Admin input for creating a prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptDraft {
    pub content: String,
    pub prompt_type: PromptType,
    /// Comma-separated labels as typed by the admin.
    pub options_raw: Option<String>,
    pub is_global: bool,
    pub category: Option<CategoryRef>,
}

impl PromptDraft {
    pub fn text(content: impl Into<String>, category: Option<CategoryRef>) -> Self {
        Self {
            content: content.into(),
            prompt_type: PromptType::Text,
            options_raw: None,
            is_global: false,
            category,
        }
    }

    pub fn global(mut self) -> Self {
        self.is_global = true;
        self
    }
}

/// What a category cascade removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDeletion {
    pub prompts_deleted: usize,
    pub rules_deleted: usize,
    pub category_name: String,
}
