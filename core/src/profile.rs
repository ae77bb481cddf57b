//! Profiles, their selection rules, groups, organizations and users.

use crate::{
    prompt::CategoryRef,
    types::{CategoryId, GroupId, OrgId, ProfileId, RuleId, Timestamp, UserId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub organization_id: OrgId,
    pub name: String,
    pub code: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub organization_id: OrgId,
    pub email: String,
    pub name: Option<String>,
    pub created_at: Timestamp,
}

/// Named bundle of rules, assignable to users and groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub profile_id: ProfileId,
    pub organization_id: OrgId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroup {
    pub group_id: GroupId,
    pub organization_id: OrgId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

/// One profile's instruction to pull N (or all) prompts from a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRule {
    pub rule_id: RuleId,
    pub profile_id: ProfileId,
    pub category_id: Option<CategoryId>,
    /// Legacy name; older rules carry only this.
    pub category_name: Option<String>,
    pub min_count: i64,
    pub max_count: i64,
    pub include_all: bool,
    pub sort_order: i64,
    pub created_at: Timestamp,
}

impl ProfileRule {
    /// The pool this rule draws from, or None when it names no category.
    pub fn pool_key(&self) -> Option<PoolKey> {
        if self.category_id.is_none() && self.category_name.is_none() {
            return None;
        }
        Some(PoolKey {
            category_id: self.category_id.clone(),
            category_name: self.category_name.clone(),
        })
    }
}

/// Identifies a prompt pool. A prompt belongs to the pool when it matches
/// the category id or the legacy category name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolKey {
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
}

/// A profile with its rules in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileWithRules {
    pub profile: Profile,
    pub rules: Vec<ProfileRule>,
}

/// Admin input for creating or updating a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDraft {
    pub category: CategoryRef,
    #[serde(default)]
    pub min_count: Option<i64>,
    #[serde(default)]
    pub max_count: Option<i64>,
    #[serde(default)]
    pub include_all: bool,
}

impl RuleDraft {
    /// Pick between `min` and `max` prompts from the category.
    pub fn pick(category: CategoryRef, min: i64, max: i64) -> Self {
        Self {
            category,
            min_count: Some(min),
            max_count: Some(max),
            include_all: false,
        }
    }

    /// Take every eligible prompt in the category.
    pub fn include_all(category: CategoryRef) -> Self {
        Self {
            category,
            min_count: None,
            max_count: None,
            include_all: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoveDirection {
    Up,
    Down,
}
