//! Read-only view of prompts and rules consumed by resolution.
//!
//! RULE: Resolution reads through this trait only. It never writes, so any
//! number of resolutions can run side by side on their own catalogs.

use crate::{
    error::JournalResult,
    profile::{PoolKey, ProfileWithRules},
    prompt::Prompt,
    store::JournalStore,
    types::{ProfileId, PromptId},
};
use std::collections::HashSet;

pub trait PromptCatalog {
    /// Active global prompts of the organization, in a stable order.
    fn global_prompts(&self, organization_id: &str) -> JournalResult<Vec<Prompt>>;

    /// Profiles for the given ids, each with rules sorted by
    /// (sort_order, created_at). Unknown ids are skipped.
    fn profiles_with_rules(&self, profile_ids: &[ProfileId]) -> JournalResult<Vec<ProfileWithRules>>;

    /// Active, non-global prompts of the organization in the pool,
    /// minus `exclude`, in a stable order.
    fn pool(
        &self,
        organization_id: &str,
        key: &PoolKey,
        exclude: &HashSet<PromptId>,
    ) -> JournalResult<Vec<Prompt>>;
}

impl PromptCatalog for JournalStore {
    fn global_prompts(&self, organization_id: &str) -> JournalResult<Vec<Prompt>> {
        JournalStore::global_prompts(self, organization_id)
    }

    fn profiles_with_rules(&self, profile_ids: &[ProfileId]) -> JournalResult<Vec<ProfileWithRules>> {
        JournalStore::profiles_with_rules(self, profile_ids)
    }

    fn pool(
        &self,
        organization_id: &str,
        key: &PoolKey,
        exclude: &HashSet<PromptId>,
    ) -> JournalResult<Vec<Prompt>> {
        self.prompt_pool(organization_id, key, exclude)
    }
}
