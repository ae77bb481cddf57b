use journal_core::{
    date::JournalDate,
    engine::JournalEngine,
    error::JournalError,
    journal::Answer,
    profile::{ProfileRule, RuleDraft},
    prompt::{CategoryRef, PromptDraft},
    types::{new_id, now_micros},
};

fn make_engine() -> (JournalEngine, String) {
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = JournalEngine::in_memory().unwrap();
    let org = engine.create_organization("Cascade Org", "CAS").unwrap();
    (engine, org.organization_id)
}

/// Deleting a category removes its prompts (with their answers), legacy
/// prompts filed under its name, and every rule targeting it by id or by
/// name, and reports the counts.
#[test]
fn delete_category_cascades_to_prompts_rules_and_entries() {
    let (engine, org_id) = make_engine();

    // Filed by name before the category existed.
    let legacy = engine
        .create_prompt(&org_id, &PromptDraft::text("Legacy task", Some(CategoryRef::Name("Tasks".into()))))
        .unwrap();
    assert_eq!(legacy.category_id, None);

    let tasks = engine.create_category(&org_id, "Tasks").unwrap();
    let keep = engine.create_category(&org_id, "Keep").unwrap();
    let mut task_prompts = Vec::new();
    for content in ["Water plants", "Call mum", "Pay rent"] {
        let draft = PromptDraft::text(content, Some(CategoryRef::Id(tasks.category_id.clone())));
        task_prompts.push(engine.create_prompt(&org_id, &draft).unwrap());
    }
    let kept_prompt = engine
        .create_prompt(&org_id, &PromptDraft::text("Still here", Some(CategoryRef::Id(keep.category_id.clone()))))
        .unwrap();

    let by_id = engine.create_profile(&org_id, "By id", None).unwrap();
    engine
        .create_rule(&by_id.profile_id, &RuleDraft::include_all(CategoryRef::Id(tasks.category_id.clone())))
        .unwrap();
    let kept_rule = engine
        .create_rule(&by_id.profile_id, &RuleDraft::pick(CategoryRef::Id(keep.category_id.clone()), 1, 1))
        .unwrap();

    // A rule written before categories existed: name only, other casing.
    let by_name = engine.create_profile(&org_id, "By name", None).unwrap();
    engine
        .store
        .insert_rule(&ProfileRule {
            rule_id: new_id(),
            profile_id: by_name.profile_id.clone(),
            category_id: None,
            category_name: Some("tasks".into()),
            min_count: 1,
            max_count: 2,
            include_all: false,
            sort_order: 0,
            created_at: now_micros(),
        })
        .unwrap();

    let user = engine.create_user(&org_id, "c@example.com", None).unwrap();
    let date: JournalDate = "2024-04-04".parse().unwrap();
    engine
        .record_answers(
            &user.user_id,
            &date,
            &[
                Answer::text(task_prompts[0].prompt_id.clone(), "done"),
                Answer::text(kept_prompt.prompt_id.clone(), "yes"),
            ],
        )
        .unwrap();

    let deletion = engine.delete_category(&tasks.category_id).unwrap();
    assert_eq!(deletion.category_name, "Tasks");
    assert_eq!(deletion.prompts_deleted, 4, "3 filed by id + 1 legacy");
    assert_eq!(deletion.rules_deleted, 2, "1 by id + 1 by legacy name");

    assert!(engine.store.get_category(&tasks.category_id).unwrap().is_none());
    assert!(engine.store.get_prompt(&legacy.prompt_id).unwrap().is_none());
    for p in &task_prompts {
        assert!(engine.store.get_prompt(&p.prompt_id).unwrap().is_none());
    }
    assert!(engine.rules_for_profile(&by_name.profile_id).unwrap().is_empty());
    assert_eq!(
        engine.rules_for_profile(&by_id.profile_id).unwrap(),
        vec![kept_rule],
        "Rules on other categories survive"
    );
    let entries = engine.store.entries_for_date(&user.user_id, &date).unwrap();
    assert_eq!(entries.len(), 1, "Only the answer to the kept prompt remains");
    assert_eq!(entries[0].prompt_id, kept_prompt.prompt_id);
}

#[test]
fn cascade_leaves_other_organizations_alone() {
    let (engine, org_id) = make_engine();
    let other = engine.create_organization("Neighbour", "NBR").unwrap();
    let theirs = engine
        .create_prompt(
            &other.organization_id,
            &PromptDraft::text("Their task", Some(CategoryRef::Name("Tasks".into()))),
        )
        .unwrap();
    let their_profile = engine.create_profile(&other.organization_id, "Theirs", None).unwrap();
    engine
        .create_rule(&their_profile.profile_id, &RuleDraft::pick(CategoryRef::Name("Tasks".into()), 1, 1))
        .unwrap();

    let ours = engine.create_category(&org_id, "Tasks").unwrap();
    let deletion = engine.delete_category(&ours.category_id).unwrap();
    assert_eq!((deletion.prompts_deleted, deletion.rules_deleted), (0, 0));
    assert!(engine.store.get_prompt(&theirs.prompt_id).unwrap().is_some());
    assert_eq!(engine.rules_for_profile(&their_profile.profile_id).unwrap().len(), 1);
}

#[test]
fn deleting_an_unknown_category_changes_nothing() {
    let (engine, org_id) = make_engine();
    let category = engine.create_category(&org_id, "Present").unwrap();
    let result = engine.delete_category("no-such-category");
    assert!(
        matches!(result, Err(JournalError::NotFound { entity: "Category", .. })),
        "got {result:?}"
    );
    assert!(engine.store.get_category(&category.category_id).unwrap().is_some());
}

#[test]
fn category_names_are_unique_ignoring_case() {
    let (engine, org_id) = make_engine();
    engine.create_category(&org_id, "Sleep").unwrap();
    let again = engine.create_category(&org_id, "sleep");
    assert!(again.as_ref().is_err_and(JournalError::is_validation), "got {again:?}");
    let blank = engine.create_category(&org_id, " ");
    assert!(blank.as_ref().is_err_and(JournalError::is_validation));

    let other = engine.create_organization("Other", "OTH").unwrap();
    engine.create_category(&other.organization_id, "Sleep").unwrap();
    let names: Vec<String> = engine
        .store
        .list_categories(&org_id)
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Sleep".to_string()]);
}

#[test]
fn category_ids_from_another_organization_are_not_found() {
    let (engine, org_id) = make_engine();
    let other = engine.create_organization("Other", "OTH").unwrap();
    let foreign = engine.create_category(&other.organization_id, "Foreign").unwrap();
    let result = engine.create_prompt(
        &org_id,
        &PromptDraft::text("Sneaky", Some(CategoryRef::Id(foreign.category_id))),
    );
    assert!(matches!(result, Err(JournalError::NotFound { entity: "Category", .. })));
}
