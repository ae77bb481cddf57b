//! Prompt resolution: which prompts a user sees on a given day.
//!
//! PROCEDURE (fixed, documented, never reordered):
//!   1. Seed the selection with the organization's active global prompts.
//!   2. Load the effective profiles, rules sorted by (sort_order, created_at).
//!   3. Seed one DailyRng from "{user_id}-{YYYY-MM-DD}".
//!   4. Walk profiles in load order, rules in sorted order:
//!      - include_all: take the whole pool. No draws.
//!      - otherwise: draw a count in [min, max] (one draw); skip the rule if
//!        it is <= 0; shuffle the pool (len - 1 draws) and take the first
//!        `count`.
//!      Rules naming no category are skipped after their count draw.
//!   5. Return the selection in insertion order.
//!
//! RULES:
//!   - Every pool fetch excludes what is already selected, so a prompt is
//!     never picked twice, even when reachable through two rules.
//!   - The draw sequence depends on how many earlier rules were include_all.
//!     Giving include_all rules a dummy draw would change every existing
//!     resolution, so they consume nothing.
//!   - Missing data is not an error: empty pools, empty profiles and users
//!     without profiles just produce fewer prompts.

use crate::{
    catalog::PromptCatalog,
    date::JournalDate,
    error::JournalResult,
    prompt::Prompt,
    rng::{DailyRng, RngAlgorithm},
    types::{ProfileId, PromptId},
};
use std::collections::HashSet;

/// Prompts picked so far, in first-seen order, with a membership set.
#[derive(Debug, Default)]
struct Selection {
    prompts: Vec<Prompt>,
    ids: HashSet<PromptId>,
}

impl Selection {
    fn insert(&mut self, prompt: Prompt) {
        if self.ids.insert(prompt.prompt_id.clone()) {
            self.prompts.push(prompt);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptResolver {
    algorithm: RngAlgorithm,
}

impl PromptResolver {
    pub fn new(algorithm: RngAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Compute the ordered, duplicate-free prompt set for one user and day.
    ///
    /// Only store failures are returned as errors.
    pub fn resolve<C: PromptCatalog + ?Sized>(
        &self,
        catalog: &C,
        user_id: &str,
        organization_id: &str,
        profile_ids: &[ProfileId],
        date: &JournalDate,
    ) -> JournalResult<Vec<Prompt>> {
        let mut selection = Selection::default();
        for prompt in catalog.global_prompts(organization_id)? {
            selection.insert(prompt);
        }
        let global_count = selection.prompts.len();

        let profiles = catalog.profiles_with_rules(profile_ids)?;
        let mut rng = DailyRng::for_user_day(user_id, date, self.algorithm);

        for entry in &profiles {
            for rule in &entry.rules {
                let count = if rule.include_all {
                    None
                } else {
                    let n = rng.draw_count(rule.min_count, rule.max_count);
                    if n <= 0 {
                        log::debug!("Rule {} drew {n}; skipped", rule.rule_id);
                        continue;
                    }
                    Some(n as usize)
                };

                let Some(key) = rule.pool_key() else {
                    log::warn!(
                        "Rule {} in profile {} names no category; skipped",
                        rule.rule_id,
                        entry.profile.profile_id
                    );
                    continue;
                };

                let mut pool = catalog.pool(organization_id, &key, &selection.ids)?;
                let picked = match count {
                    None => pool.len(),
                    Some(n) => {
                        rng.shuffle(&mut pool);
                        n.min(pool.len())
                    }
                };
                log::debug!(
                    "Rule {} picked {picked} of {} eligible prompts",
                    rule.rule_id,
                    pool.len()
                );
                for prompt in pool.into_iter().take(picked) {
                    selection.insert(prompt);
                }
            }
        }

        log::debug!(
            "Resolved {} prompts ({global_count} global) for {} on {date}",
            selection.prompts.len(),
            rng.seed_key
        );
        Ok(selection.prompts)
    }
}
