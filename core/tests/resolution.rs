use journal_core::{
    date::JournalDate,
    engine::JournalEngine,
    error::JournalError,
    profile::{Profile, RuleDraft},
    prompt::{CategoryRef, Prompt, PromptCategory, PromptDraft},
};
use std::collections::HashSet;

// ── Test helpers ────────────────────────────────────────────────────────────

fn make_engine() -> (JournalEngine, String) {
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = JournalEngine::in_memory().unwrap();
    let org = engine.create_organization("Resolution Org", "RES").unwrap();
    (engine, org.organization_id)
}

/// A category holding `size` free-text prompts, returned in creation order.
fn category_with_prompts(
    engine: &JournalEngine,
    org_id: &str,
    name: &str,
    size: usize,
) -> (PromptCategory, Vec<Prompt>) {
    let category = engine.create_category(org_id, name).unwrap();
    let prompts = (0..size)
        .map(|i| {
            let draft = PromptDraft::text(
                format!("{name} #{i}"),
                Some(CategoryRef::Id(category.category_id.clone())),
            );
            engine.create_prompt(org_id, &draft).unwrap()
        })
        .collect();
    (category, prompts)
}

fn profile_for(engine: &JournalEngine, org_id: &str, user_id: &str, name: &str) -> Profile {
    let profile = engine.create_profile(org_id, name, None).unwrap();
    let mut ids = engine.effective_profile_ids(user_id).unwrap();
    ids.push(profile.profile_id.clone());
    engine.assign_user_profiles(user_id, &ids).unwrap();
    profile
}

fn ids_of(prompts: &[Prompt]) -> Vec<String> {
    prompts.iter().map(|p| p.prompt_id.clone()).collect()
}

fn resolve(engine: &JournalEngine, user_id: &str, org_id: &str, date: &str) -> Vec<Prompt> {
    let profile_ids = engine.effective_profile_ids(user_id).unwrap();
    engine
        .resolve_active_prompts(user_id, org_id, &profile_ids, date)
        .unwrap()
}

fn dates(n: u32) -> impl Iterator<Item = String> {
    (0..n).map(|i| format!("2024-{:02}-{:02}", 1 + i / 28, 1 + i % 28))
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Profile P has an include_all rule on Tasks (A, B); a second Tasks rule is
/// rejected. Profile P2 picks exactly one of General (C, D, E). The day's
/// selection holds the global, A, B and one of C/D/E, and is stable.
#[test]
fn tasks_and_general_scenario() {
    let (engine, org_id) = make_engine();
    let user = engine.create_user(&org_id, "u@example.com", None).unwrap();
    let global = engine
        .create_prompt(&org_id, &PromptDraft::text("Daily mood", None).global())
        .unwrap();

    let (tasks, tasks_prompts) = category_with_prompts(&engine, &org_id, "Tasks", 2);
    let (general, general_prompts) = category_with_prompts(&engine, &org_id, "General", 3);

    let p = profile_for(&engine, &org_id, &user.user_id, "P");
    engine
        .create_rule(
            &p.profile_id,
            &RuleDraft::include_all(CategoryRef::Id(tasks.category_id.clone())),
        )
        .unwrap();
    let duplicate = engine.create_rule(
        &p.profile_id,
        &RuleDraft::pick(CategoryRef::Name("Tasks".into()), 1, 1),
    );
    assert!(
        matches!(duplicate, Err(JournalError::DuplicateCategory { .. })),
        "Second Tasks rule should be rejected; got {duplicate:?}"
    );

    let p2 = profile_for(&engine, &org_id, &user.user_id, "P2");
    engine
        .create_rule(
            &p2.profile_id,
            &RuleDraft::pick(CategoryRef::Id(general.category_id), 1, 1),
        )
        .unwrap();

    let first = resolve(&engine, &user.user_id, &org_id, "2024-06-01");
    let ids = ids_of(&first);
    assert_eq!(ids.len(), 4, "Expected global + 2 tasks + 1 general; got {ids:?}");
    assert_eq!(ids[0], global.prompt_id, "Global prompts come first");
    for task in &tasks_prompts {
        assert!(ids.contains(&task.prompt_id), "include_all missed {}", task.content);
    }
    let general_ids: HashSet<String> = ids_of(&general_prompts).into_iter().collect();
    let picked: Vec<&String> = ids.iter().filter(|id| general_ids.contains(*id)).collect();
    assert_eq!(picked.len(), 1, "Exactly one General prompt expected; got {picked:?}");

    let again = resolve(&engine, &user.user_id, &org_id, "2024-06-01");
    assert_eq!(ids, ids_of(&again), "Same user and date must give the same prompts");
}

#[test]
fn fixed_range_always_contributes_exactly_that_many() {
    let (engine, org_id) = make_engine();
    let user = engine.create_user(&org_id, "range@example.com", None).unwrap();
    let (category, pool) = category_with_prompts(&engine, &org_id, "Pool", 5);
    let profile = profile_for(&engine, &org_id, &user.user_id, "Two");
    engine
        .create_rule(
            &profile.profile_id,
            &RuleDraft::pick(CategoryRef::Id(category.category_id), 2, 2),
        )
        .unwrap();

    let pool_ids: HashSet<String> = ids_of(&pool).into_iter().collect();
    for date in dates(60) {
        let ids = ids_of(&resolve(&engine, &user.user_id, &org_id, &date));
        assert_eq!(ids.len(), 2, "Expected 2 prompts on {date}; got {ids:?}");
        assert!(
            ids.iter().all(|id| pool_ids.contains(id)),
            "Prompt outside the pool on {date}: {ids:?}"
        );
    }
}

#[test]
fn include_all_takes_the_whole_pool_in_creation_order() {
    let (engine, org_id) = make_engine();
    let user = engine.create_user(&org_id, "all@example.com", None).unwrap();
    let (category, pool) = category_with_prompts(&engine, &org_id, "Everything", 7);
    let profile = profile_for(&engine, &org_id, &user.user_id, "All");
    engine
        .create_rule(
            &profile.profile_id,
            &RuleDraft::include_all(CategoryRef::Id(category.category_id)),
        )
        .unwrap();

    for date in dates(5) {
        let ids = ids_of(&resolve(&engine, &user.user_id, &org_id, &date));
        assert_eq!(ids, ids_of(&pool), "include_all must return the pool unshuffled on {date}");
    }
}

#[test]
fn overlapping_rules_never_repeat_a_prompt() {
    let (engine, org_id) = make_engine();
    let user = engine.create_user(&org_id, "dup@example.com", None).unwrap();
    let (shared, _) = category_with_prompts(&engine, &org_id, "Shared", 6);
    let (other, _) = category_with_prompts(&engine, &org_id, "Other", 4);

    let first = profile_for(&engine, &org_id, &user.user_id, "First");
    let second = profile_for(&engine, &org_id, &user.user_id, "Second");
    for profile in [&first, &second] {
        engine
            .create_rule(
                &profile.profile_id,
                &RuleDraft::pick(CategoryRef::Id(shared.category_id.clone()), 2, 5),
            )
            .unwrap();
        engine
            .create_rule(
                &profile.profile_id,
                &RuleDraft::pick(CategoryRef::Name("other".into()), 1, 4),
            )
            .unwrap();
    }
    assert_eq!(
        engine.rules_for_profile(&first.profile_id).unwrap()[1].category_id,
        Some(other.category_id),
        "A name reference resolves to the existing category"
    );

    for date in dates(40) {
        let ids = ids_of(&resolve(&engine, &user.user_id, &org_id, &date));
        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len(), "Duplicate prompt on {date}: {ids:?}");
    }
}

#[test]
fn global_prompts_reach_every_user_of_the_organization() {
    let (engine, org_id) = make_engine();
    let global = engine
        .create_prompt(&org_id, &PromptDraft::text("Gratitude", None).global())
        .unwrap();
    let (category, _) = category_with_prompts(&engine, &org_id, "Mixed", 3);

    let with_rules = engine.create_user(&org_id, "a@example.com", None).unwrap();
    let profile = profile_for(&engine, &org_id, &with_rules.user_id, "Some");
    engine
        .create_rule(
            &profile.profile_id,
            &RuleDraft::pick(CategoryRef::Id(category.category_id), 0, 3),
        )
        .unwrap();
    let without_rules = engine.create_user(&org_id, "b@example.com", None).unwrap();

    for user in [&with_rules, &without_rules] {
        for date in dates(10) {
            let prompts = resolve(&engine, &user.user_id, &org_id, &date);
            assert_eq!(
                prompts.first().map(|p| p.prompt_id.as_str()),
                Some(global.prompt_id.as_str()),
                "Global prompt missing for {} on {date}",
                user.email
            );
        }
    }
}

#[test]
fn inactive_and_foreign_prompts_are_never_selected() {
    let (engine, org_id) = make_engine();
    let other_org = engine.create_organization("Elsewhere", "ELS").unwrap();
    engine
        .create_prompt(
            &other_org.organization_id,
            &PromptDraft::text("Not ours", None).global(),
        )
        .unwrap();

    let user = engine.create_user(&org_id, "x@example.com", None).unwrap();
    let (category, pool) = category_with_prompts(&engine, &org_id, "Toggle", 4);
    engine.set_prompt_active(&pool[0].prompt_id, false).unwrap();
    engine.set_prompt_active(&pool[2].prompt_id, false).unwrap();
    let profile = profile_for(&engine, &org_id, &user.user_id, "Active only");
    engine
        .create_rule(
            &profile.profile_id,
            &RuleDraft::include_all(CategoryRef::Id(category.category_id)),
        )
        .unwrap();

    let ids = ids_of(&resolve(&engine, &user.user_id, &org_id, "2024-05-05"));
    assert_eq!(ids, vec![pool[1].prompt_id.clone(), pool[3].prompt_id.clone()]);
}

#[test]
fn legacy_category_names_still_form_a_pool() {
    let (engine, org_id) = make_engine();
    let user = engine.create_user(&org_id, "legacy@example.com", None).unwrap();
    for i in 0..3 {
        let draft = PromptDraft::text(format!("Old {i}"), Some(CategoryRef::Name("Archive".into())));
        let prompt = engine.create_prompt(&org_id, &draft).unwrap();
        assert_eq!(prompt.category_id, None, "No Archive category exists");
        assert_eq!(prompt.category_name.as_deref(), Some("Archive"));
    }
    let profile = profile_for(&engine, &org_id, &user.user_id, "Legacy");
    let rule = engine
        .create_rule(
            &profile.profile_id,
            &RuleDraft::include_all(CategoryRef::Name("Archive".into())),
        )
        .unwrap();
    assert_eq!(rule.category_id, None);

    let prompts = resolve(&engine, &user.user_id, &org_id, "2024-07-07");
    assert_eq!(prompts.len(), 3, "Legacy rule should match by name; got {prompts:?}");
}

#[test]
fn users_without_profiles_get_only_globals_and_no_configuration() {
    let (engine, org_id) = make_engine();
    engine
        .create_prompt(&org_id, &PromptDraft::text("Always", None).global())
        .unwrap();
    category_with_prompts(&engine, &org_id, "Unused", 3);
    let user = engine.create_user(&org_id, "empty@example.com", None).unwrap();

    let date: JournalDate = "2024-08-08".parse().unwrap();
    let view = engine.daily_view(&user.user_id, Some(date)).unwrap();
    assert!(!view.has_configuration, "No profiles means no configuration");
    assert_eq!(view.prompts.len(), 1);
    assert_eq!(view.date, date);
    assert!(view.entries.is_empty());
}

#[test]
fn empty_profiles_and_pools_are_not_errors() {
    let (engine, org_id) = make_engine();
    let user = engine.create_user(&org_id, "quiet@example.com", None).unwrap();
    profile_for(&engine, &org_id, &user.user_id, "No rules");
    let empty = engine.create_category(&org_id, "Empty").unwrap();
    let profile = profile_for(&engine, &org_id, &user.user_id, "Empty pool");
    engine
        .create_rule(
            &profile.profile_id,
            &RuleDraft::pick(CategoryRef::Id(empty.category_id), 1, 3),
        )
        .unwrap();

    let view = engine.daily_view(&user.user_id, None).unwrap();
    assert!(view.has_configuration);
    assert!(view.prompts.is_empty(), "Nothing to pick from; got {:?}", view.prompts);
}
