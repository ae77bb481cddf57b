//! Rule store: the ordered selection rules of a profile.
//!
//! RULES:
//!   - Every check runs before the first write. A rejected create or
//!     update leaves the store untouched.
//!   - Checks, reads and writes of one operation share a single write
//!     transaction, so a second connection cannot slip a rule in between.
//!   - A profile holds at most one rule per category, compared exactly on
//!     the category id and case-insensitively on the legacy name.
//!   - move() renumbers every rule of the profile to 0..n-1 in a single
//!     transaction, which also repairs profiles whose rules share a
//!     sort_order.

use crate::{
    config::EngineConfig,
    error::{JournalError, JournalResult},
    library::resolve_category,
    profile::{MoveDirection, Profile, ProfileRule, RuleDraft},
    prompt::ResolvedCategory,
    store::JournalStore,
    types::{new_id, now_micros},
};

/// Largest count a rule may ask for.
pub const MAX_RULE_COUNT: i64 = u32::MAX as i64;

/// Fill in default counts and reject unusable ranges.
fn validated_counts(config: &EngineConfig, draft: &RuleDraft) -> JournalResult<(i64, i64)> {
    let min = draft.min_count.unwrap_or(config.default_min_count);
    let max = draft.max_count.unwrap_or(config.default_max_count);
    if draft.include_all {
        return Ok((min, max));
    }
    if min < 0 || max < 0 {
        return Err(JournalError::validation("count", "counts must not be negative"));
    }
    if max > MAX_RULE_COUNT {
        return Err(JournalError::validation(
            "count",
            format!("counts must not exceed {MAX_RULE_COUNT}"),
        ));
    }
    if min > max {
        return Err(JournalError::InvalidRange { min, max });
    }
    Ok((min, max))
}

fn require_profile(store: &JournalStore, profile_id: &str) -> JournalResult<Profile> {
    store
        .get_profile(profile_id)?
        .ok_or_else(|| JournalError::not_found("Profile", profile_id))
}

fn ensure_unique_category(
    store: &JournalStore,
    profile_id: &str,
    category: &ResolvedCategory,
    excluding_rule: Option<&str>,
) -> JournalResult<()> {
    let conflict = store.find_conflicting_rule(
        profile_id,
        category.category_id.as_deref(),
        &category.name,
        excluding_rule,
    )?;
    if let Some(existing) = conflict {
        log::debug!(
            "Rule {} already targets '{}' in profile {profile_id}",
            existing.rule_id,
            category.name
        );
        return Err(JournalError::DuplicateCategory {
            profile_id: profile_id.to_string(),
            category: category.name.clone(),
        });
    }
    Ok(())
}

/// Append a rule to the end of the profile's evaluation order.
pub fn create_rule(
    store: &JournalStore,
    config: &EngineConfig,
    profile_id: &str,
    draft: &RuleDraft,
) -> JournalResult<ProfileRule> {
    let (min_count, max_count) = validated_counts(config, draft)?;
    let rule = store.immediate(|store| {
        let profile = require_profile(store, profile_id)?;
        let category = resolve_category(store, &profile.organization_id, &draft.category)?;
        ensure_unique_category(store, profile_id, &category, None)?;

        let rule = ProfileRule {
            rule_id: new_id(),
            profile_id: profile_id.to_string(),
            category_id: category.category_id,
            category_name: Some(category.name),
            min_count,
            max_count,
            include_all: draft.include_all,
            sort_order: store.next_rule_sort_order(profile_id)?,
            created_at: now_micros(),
        };
        store.insert_rule(&rule)?;
        Ok(rule)
    })?;
    log::info!(
        "Created rule {} on profile {profile_id} for {:?}",
        rule.rule_id,
        rule.category_name
    );
    Ok(rule)
}

/// Retarget or resize a rule. Its position in the profile is kept.
pub fn update_rule(
    store: &JournalStore,
    config: &EngineConfig,
    rule_id: &str,
    draft: &RuleDraft,
) -> JournalResult<ProfileRule> {
    let (min_count, max_count) = validated_counts(config, draft)?;
    let rule = store.immediate(|store| {
        let existing = store
            .get_rule(rule_id)?
            .ok_or_else(|| JournalError::not_found("Rule", rule_id))?;
        let profile = require_profile(store, &existing.profile_id)?;
        let category = resolve_category(store, &profile.organization_id, &draft.category)?;
        ensure_unique_category(store, &existing.profile_id, &category, Some(rule_id))?;

        let rule = ProfileRule {
            category_id: category.category_id,
            category_name: Some(category.name),
            min_count,
            max_count,
            include_all: draft.include_all,
            ..existing
        };
        store.update_rule(&rule)?;
        Ok(rule)
    })?;
    log::info!("Updated rule {rule_id}");
    Ok(rule)
}

pub fn delete_rule(store: &JournalStore, rule_id: &str) -> JournalResult<()> {
    store.delete_rule(rule_id)?;
    log::info!("Deleted rule {rule_id}");
    Ok(())
}

/// Swap a rule with its neighbour in the current stable order and persist
/// the whole profile as 0..n-1.
///
/// Returns false, writing nothing, when the rule is already first (Up) or
/// last (Down).
pub fn move_rule(store: &JournalStore, rule_id: &str, direction: MoveDirection) -> JournalResult<bool> {
    store.immediate(|store| {
        let rule = store
            .get_rule(rule_id)?
            .ok_or_else(|| JournalError::not_found("Rule", rule_id))?;
        let mut rules = store.rules_for_profile(&rule.profile_id)?;
        let index = rules
            .iter()
            .position(|r| r.rule_id == rule_id)
            .ok_or_else(|| JournalError::not_found("Rule", rule_id))?;

        let neighbour = match direction {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < rules.len() => index + 1,
            _ => return Ok(false),
        };
        rules.swap(index, neighbour);

        let ordered: Vec<String> = rules.into_iter().map(|r| r.rule_id).collect();
        store.renumber_rules(&ordered)?;
        log::info!(
            "Moved rule {rule_id} {direction:?} in profile {}; renumbered {} rules",
            rule.profile_id,
            ordered.len()
        );
        Ok(true)
    })
}
