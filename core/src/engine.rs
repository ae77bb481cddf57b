//! The journal engine: one entry point over the store, the rule store and
//! prompt resolution.
//!
//! RULES:
//!   - Every operation takes the organization and user explicitly; the
//!     engine keeps no notion of a "current" tenant or session.
//!   - Resolution is pure over the store: it writes nothing and caches
//!     nothing, so it is recomputed on every call.

use crate::{
    config::EngineConfig,
    date::JournalDate,
    error::{require_text, JournalError, JournalResult},
    journal::{self, Answer, DailyView, JournalEntry},
    library::{self, ImportedCategory, PromptUpdate},
    membership,
    profile::{
        MoveDirection, Organization, Profile, ProfileRule, ProfileWithRules, RuleDraft, User,
        UserGroup,
    },
    prompt::{CategoryDeletion, Prompt, PromptCategory, PromptDraft},
    resolver::PromptResolver,
    rules,
    store::JournalStore,
    types::{new_id, now_micros, ProfileId},
};

pub struct JournalEngine {
    pub store: JournalStore,
    pub config: EngineConfig,
    resolver: PromptResolver,
}

impl JournalEngine {
    pub fn new(store: JournalStore, config: EngineConfig) -> Self {
        let resolver = PromptResolver::new(config.rng_algorithm);
        Self {
            store,
            config,
            resolver,
        }
    }

    /// Open (or create) a database at `path` and bring its schema up to date.
    pub fn open(path: &str, config: EngineConfig) -> JournalResult<Self> {
        let store = JournalStore::open(path)?;
        store.migrate()?;
        Ok(Self::new(store, config))
    }

    /// Migrated in-memory engine with default settings (used in tests).
    pub fn in_memory() -> JournalResult<Self> {
        let store = JournalStore::in_memory()?;
        store.migrate()?;
        Ok(Self::new(store, EngineConfig::default()))
    }

    // ── Organizations and users ────────────────────────────────

    pub fn create_organization(&self, name: &str, code: &str) -> JournalResult<Organization> {
        let code = require_text("code", code)?;
        if self.store.organization_by_code(&code)?.is_some() {
            return Err(JournalError::validation(
                "code",
                format!("organization code '{code}' is taken"),
            ));
        }
        let org = Organization {
            organization_id: new_id(),
            name: require_text("name", name)?,
            code,
            created_at: now_micros(),
        };
        self.store.insert_organization(&org)?;
        Ok(org)
    }

    pub fn create_user(
        &self,
        organization_id: &str,
        email: &str,
        name: Option<&str>,
    ) -> JournalResult<User> {
        let email = require_text("email", email)?;
        if self.store.find_user_by_email(&email)?.is_some() {
            return Err(JournalError::validation(
                "email",
                "a user with this email already exists",
            ));
        }
        let user = User {
            user_id: new_id(),
            organization_id: organization_id.to_string(),
            email,
            name: name.map(String::from),
            created_at: now_micros(),
        };
        self.store.insert_user(&user)?;
        Ok(user)
    }

    // ── Resolution ─────────────────────────────────────────────

    /// Direct profiles plus those inherited through groups.
    pub fn effective_profile_ids(&self, user_id: &str) -> JournalResult<Vec<ProfileId>> {
        membership::effective_profile_ids(&self.store, user_id)
    }

    /// Resolve the prompts shown to a user on `date` (`YYYY-MM-DD`).
    ///
    /// Callers that need to know whether the user has any configuration
    /// check `profile_ids.is_empty()` themselves.
    pub fn resolve_active_prompts(
        &self,
        user_id: &str,
        organization_id: &str,
        profile_ids: &[ProfileId],
        date: &str,
    ) -> JournalResult<Vec<Prompt>> {
        let date: JournalDate = date.parse()?;
        self.resolve_for_date(user_id, organization_id, profile_ids, &date)
    }

    pub fn resolve_for_date(
        &self,
        user_id: &str,
        organization_id: &str,
        profile_ids: &[ProfileId],
        date: &JournalDate,
    ) -> JournalResult<Vec<Prompt>> {
        self.resolver
            .resolve(&self.store, user_id, organization_id, profile_ids, date)
    }

    /// Everything needed to render a user's day. Without a date, "today"
    /// at the configured UTC offset.
    pub fn daily_view(&self, user_id: &str, date: Option<JournalDate>) -> JournalResult<DailyView> {
        let user = self.store.require_user(user_id)?;
        let date = date.unwrap_or_else(|| JournalDate::today(self.config.utc_offset_minutes));
        let profile_ids = self.effective_profile_ids(user_id)?;
        let prompts = self.resolve_for_date(user_id, &user.organization_id, &profile_ids, &date)?;
        let entries = journal::entries_for_date(&self.store, user_id, &date)?;
        Ok(DailyView {
            user_id: user.user_id,
            organization_id: user.organization_id,
            date,
            has_configuration: !profile_ids.is_empty(),
            prompts,
            entries,
        })
    }

    // ── Profiles ───────────────────────────────────────────────

    pub fn create_profile(
        &self,
        organization_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> JournalResult<Profile> {
        let profile = Profile {
            profile_id: new_id(),
            organization_id: organization_id.to_string(),
            name: require_text("name", name)?,
            description: description.map(String::from),
            created_at: now_micros(),
        };
        self.store.insert_profile(&profile)?;
        Ok(profile)
    }

    pub fn update_profile(
        &self,
        profile_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> JournalResult<()> {
        let name = require_text("name", name)?;
        self.store.update_profile(profile_id, &name, description)
    }

    pub fn delete_profile(&self, profile_id: &str) -> JournalResult<()> {
        self.store.delete_profile(profile_id)
    }

    pub fn profile_with_rules(&self, profile_id: &str) -> JournalResult<ProfileWithRules> {
        self.store
            .profiles_with_rules(&[profile_id.to_string()])?
            .pop()
            .ok_or_else(|| JournalError::not_found("Profile", profile_id))
    }

    /// Replace a user's direct profile assignments.
    pub fn assign_user_profiles(&self, user_id: &str, profile_ids: &[ProfileId]) -> JournalResult<()> {
        self.store.require_user(user_id)?;
        self.store.set_user_profiles(user_id, profile_ids)
    }

    // ── Rules ──────────────────────────────────────────────────

    pub fn create_rule(&self, profile_id: &str, draft: &RuleDraft) -> JournalResult<ProfileRule> {
        rules::create_rule(&self.store, &self.config, profile_id, draft)
    }

    pub fn update_rule(&self, rule_id: &str, draft: &RuleDraft) -> JournalResult<ProfileRule> {
        rules::update_rule(&self.store, &self.config, rule_id, draft)
    }

    pub fn delete_rule(&self, rule_id: &str) -> JournalResult<()> {
        rules::delete_rule(&self.store, rule_id)
    }

    pub fn move_rule(&self, rule_id: &str, direction: MoveDirection) -> JournalResult<bool> {
        rules::move_rule(&self.store, rule_id, direction)
    }

    pub fn rules_for_profile(&self, profile_id: &str) -> JournalResult<Vec<ProfileRule>> {
        self.store.rules_for_profile(profile_id)
    }

    // ── Groups ─────────────────────────────────────────────────

    pub fn create_group(
        &self,
        organization_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> JournalResult<UserGroup> {
        let group = UserGroup {
            group_id: new_id(),
            organization_id: organization_id.to_string(),
            name: require_text("name", name)?,
            description: description.map(String::from),
            created_at: now_micros(),
        };
        self.store.insert_group(&group)?;
        Ok(group)
    }

    pub fn update_group(&self, group_id: &str, name: &str, description: Option<&str>) -> JournalResult<()> {
        let name = require_text("name", name)?;
        self.store.update_group(group_id, &name, description)
    }

    pub fn delete_group(&self, group_id: &str) -> JournalResult<()> {
        self.store.delete_group(group_id)
    }

    /// Add a user, looked up by e-mail, to a group of the same organization.
    pub fn add_user_to_group(&self, group_id: &str, email: &str) -> JournalResult<User> {
        let group = self
            .store
            .get_group(group_id)?
            .ok_or_else(|| JournalError::not_found("Group", group_id))?;
        let user = self
            .store
            .find_user_by_email(email)?
            .filter(|u| u.organization_id == group.organization_id)
            .ok_or_else(|| JournalError::not_found("User", email))?;
        self.store.add_group_member(group_id, &user.user_id)?;
        Ok(user)
    }

    pub fn remove_user_from_group(&self, group_id: &str, user_id: &str) -> JournalResult<()> {
        self.store.remove_group_member(group_id, user_id)
    }

    /// Replace a group's profile assignments.
    pub fn set_group_profiles(&self, group_id: &str, profile_ids: &[ProfileId]) -> JournalResult<()> {
        if self.store.get_group(group_id)?.is_none() {
            return Err(JournalError::not_found("Group", group_id));
        }
        self.store.set_group_profiles(group_id, profile_ids)
    }

    // ── Prompt library ─────────────────────────────────────────

    pub fn create_category(&self, organization_id: &str, name: &str) -> JournalResult<PromptCategory> {
        library::create_category(&self.store, organization_id, name)
    }

    pub fn delete_category(&self, category_id: &str) -> JournalResult<CategoryDeletion> {
        library::delete_category(&self.store, category_id)
    }

    pub fn create_prompt(&self, organization_id: &str, draft: &PromptDraft) -> JournalResult<Prompt> {
        library::create_prompt(&self.store, &self.config, organization_id, draft)
    }

    pub fn update_prompt(&self, prompt_id: &str, update: &PromptUpdate) -> JournalResult<Prompt> {
        library::update_prompt(&self.store, &self.config, prompt_id, update)
    }

    pub fn set_prompt_active(&self, prompt_id: &str, active: bool) -> JournalResult<()> {
        library::set_prompt_active(&self.store, prompt_id, active)
    }

    pub fn delete_prompt(&self, prompt_id: &str) -> JournalResult<usize> {
        library::delete_prompt(&self.store, prompt_id)
    }

    pub fn reorder_prompts(&self, category_id: &str, ordered: &[String]) -> JournalResult<()> {
        library::reorder_prompts(&self.store, category_id, ordered)
    }

    pub fn import_prompts(&self, organization_id: &str, json: &str) -> JournalResult<Vec<ImportedCategory>> {
        library::import_prompts(&self.store, &self.config, organization_id, json)
    }

    // ── Journal ────────────────────────────────────────────────

    pub fn record_answers(
        &self,
        user_id: &str,
        date: &JournalDate,
        answers: &[Answer],
    ) -> JournalResult<Vec<JournalEntry>> {
        journal::record_answers(&self.store, user_id, date, answers)
    }

    pub fn history_dates(&self, user_id: &str) -> JournalResult<Vec<JournalDate>> {
        journal::history_dates(&self.store, user_id)
    }
}
