//! Prompt library administration: categories, prompts and bulk import.
//!
//! Category references are resolved here, once, before anything reaches a
//! rule or a prompt row: an id must name an existing category of the
//! organization; a name resolves to that category when one exists and is
//! otherwise kept as a legacy name.

use crate::{
    config::EngineConfig,
    error::{require_text, JournalError, JournalResult},
    prompt::{
        CategoryDeletion, CategoryRef, ChoiceLabels, Prompt, PromptCategory, PromptDraft,
        PromptType, ResolvedCategory,
    },
    store::JournalStore,
    types::{new_id, now_micros},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Turn a category reference into (canonical id, name).
pub fn resolve_category(
    store: &JournalStore,
    organization_id: &str,
    category: &CategoryRef,
) -> JournalResult<ResolvedCategory> {
    category.validate()?;
    match category {
        CategoryRef::Id(id) => {
            let found = store
                .get_category(id)?
                .filter(|c| c.organization_id == organization_id)
                .ok_or_else(|| JournalError::not_found("Category", id.as_str()))?;
            Ok(ResolvedCategory {
                category_id: Some(found.category_id),
                name: found.name,
            })
        }
        CategoryRef::Name(name) => {
            let name = name.trim();
            Ok(match store.find_category_by_name(organization_id, name)? {
                Some(found) => ResolvedCategory {
                    category_id: Some(found.category_id),
                    name: found.name,
                },
                None => ResolvedCategory {
                    category_id: None,
                    name: name.to_string(),
                },
            })
        }
    }
}

// ── Categories ──────────────────────────────────────────────────────

pub fn create_category(
    store: &JournalStore,
    organization_id: &str,
    name: &str,
) -> JournalResult<PromptCategory> {
    let name = require_text("name", name)?;
    if let Some(existing) = store.find_category_by_name(organization_id, &name)? {
        return Err(JournalError::validation(
            "name",
            format!("category '{}' already exists", existing.name),
        ));
    }
    let category = PromptCategory {
        category_id: new_id(),
        organization_id: organization_id.to_string(),
        name,
        created_at: now_micros(),
    };
    store.insert_category(&category)?;
    log::info!("Created category '{}'", category.name);
    Ok(category)
}

/// Delete the category, its prompts (and their entries) and every rule
/// targeting it, atomically.
pub fn delete_category(store: &JournalStore, category_id: &str) -> JournalResult<CategoryDeletion> {
    store.delete_category_cascade(category_id)
}

// ── Prompts ─────────────────────────────────────────────────────────

/// Labels to store for a prompt of `prompt_type`.
fn labels_for(
    config: &EngineConfig,
    prompt_type: PromptType,
    raw: Option<&str>,
) -> Option<ChoiceLabels> {
    if !prompt_type.has_choices() {
        return None;
    }
    let labels = raw.map(ChoiceLabels::parse_list).unwrap_or_default();
    if labels.is_empty() {
        Some(ChoiceLabels(config.default_choice_labels.clone()))
    } else {
        Some(labels)
    }
}

pub fn create_prompt(
    store: &JournalStore,
    config: &EngineConfig,
    organization_id: &str,
    draft: &PromptDraft,
) -> JournalResult<Prompt> {
    let content = require_text("content", &draft.content)?;
    let category = match &draft.category {
        Some(reference) => resolve_category(store, organization_id, reference)?,
        None => ResolvedCategory {
            category_id: None,
            name: config.fallback_category_name.clone(),
        },
    };
    let prompt = Prompt {
        prompt_id: new_id(),
        organization_id: organization_id.to_string(),
        content,
        prompt_type: draft.prompt_type,
        options: labels_for(config, draft.prompt_type, draft.options_raw.as_deref()),
        is_active: true,
        is_global: draft.is_global,
        sort_order: store.next_prompt_sort_order(category.category_id.as_deref())?,
        category_id: category.category_id,
        category_name: Some(category.name),
        created_at: now_micros(),
    };
    store.insert_prompt(&prompt)?;
    log::debug!("Created prompt {} in '{:?}'", prompt.prompt_id, prompt.category_name);
    Ok(prompt)
}

/// Admin edit of an existing prompt. The category only moves when a new
/// reference is given.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptUpdate {
    pub content: String,
    pub prompt_type: PromptType,
    pub options_raw: Option<String>,
    pub category: Option<CategoryRef>,
}

pub fn update_prompt(
    store: &JournalStore,
    config: &EngineConfig,
    prompt_id: &str,
    update: &PromptUpdate,
) -> JournalResult<Prompt> {
    let mut prompt = store
        .get_prompt(prompt_id)?
        .ok_or_else(|| JournalError::not_found("Prompt", prompt_id))?;
    prompt.content = require_text("content", &update.content)?;
    prompt.prompt_type = update.prompt_type;
    prompt.options = labels_for(config, update.prompt_type, update.options_raw.as_deref());
    if let Some(reference) = &update.category {
        let category = resolve_category(store, &prompt.organization_id, reference)?;
        prompt.category_id = category.category_id;
        prompt.category_name = Some(category.name);
    }
    store.update_prompt(&prompt)?;
    Ok(prompt)
}

pub fn set_prompt_active(store: &JournalStore, prompt_id: &str, active: bool) -> JournalResult<()> {
    store.set_prompt_active(prompt_id, active)?;
    log::info!("Prompt {prompt_id} active={active}");
    Ok(())
}

/// Remove a prompt; its journal entries go first, in the same transaction.
pub fn delete_prompt(store: &JournalStore, prompt_id: &str) -> JournalResult<usize> {
    let entries = store.delete_prompt(prompt_id)?;
    log::info!("Deleted prompt {prompt_id} and {entries} entries");
    Ok(entries)
}

/// Persist a new display order for the prompts of a category.
/// `ordered` must list exactly the category's prompts.
pub fn reorder_prompts(
    store: &JournalStore,
    category_id: &str,
    ordered: &[String],
) -> JournalResult<()> {
    if store.get_category(category_id)?.is_none() {
        return Err(JournalError::not_found("Category", category_id));
    }
    let mut current: Vec<String> = store
        .prompts_in_category(category_id)?
        .into_iter()
        .map(|p| p.prompt_id)
        .collect();
    let mut requested = ordered.to_vec();
    current.sort();
    requested.sort();
    if current != requested {
        return Err(JournalError::validation(
            "order",
            "order must list every prompt of the category exactly once",
        ));
    }
    store.renumber_prompts(ordered)
}

// ── Bulk import ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedCategory {
    pub category: String,
    pub added: usize,
    pub skipped: usize,
}

/// Import `{ "Category": ["prompt", ...], ... }` into an organization.
///
/// Categories are created when missing. Prompts whose content already
/// exists anywhere in the organization are skipped. Imported prompts are
/// active, non-global free-text prompts.
pub fn import_prompts(
    store: &JournalStore,
    config: &EngineConfig,
    organization_id: &str,
    json: &str,
) -> JournalResult<Vec<ImportedCategory>> {
    let data: BTreeMap<String, Vec<String>> = serde_json::from_str(json)?;
    let mut summary = Vec::with_capacity(data.len());

    for (category_name, contents) in data {
        let category = match store.find_category_by_name(organization_id, category_name.trim())? {
            Some(existing) => existing,
            None => create_category(store, organization_id, &category_name)?,
        };

        let mut added = 0;
        let mut skipped = 0;
        for content in contents {
            if content.trim().is_empty() || store.prompt_content_exists(organization_id, &content)? {
                skipped += 1;
                continue;
            }
            let draft = PromptDraft::text(content, Some(CategoryRef::Id(category.category_id.clone())));
            create_prompt(store, config, organization_id, &draft)?;
            added += 1;
        }
        log::info!("Imported {added} prompts into '{}' ({skipped} skipped)", category.name);
        summary.push(ImportedCategory {
            category: category.name,
            added,
            skipped,
        });
    }
    Ok(summary)
}
