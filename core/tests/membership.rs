use journal_core::{engine::JournalEngine, error::JournalError};

fn make_engine() -> (JournalEngine, String) {
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = JournalEngine::in_memory().unwrap();
    let org = engine.create_organization("Members Org", "MEM").unwrap();
    (engine, org.organization_id)
}

fn sorted(mut ids: Vec<String>) -> Vec<String> {
    ids.sort();
    ids
}

#[test]
fn effective_profiles_union_direct_and_group_assignments() {
    let (engine, org_id) = make_engine();
    let user = engine.create_user(&org_id, "m@example.com", Some("M")).unwrap();
    let direct = engine.create_profile(&org_id, "Direct", None).unwrap();
    let shared = engine.create_profile(&org_id, "Shared", None).unwrap();
    let via_group = engine.create_profile(&org_id, "Group only", None).unwrap();

    engine
        .assign_user_profiles(
            &user.user_id,
            &[direct.profile_id.clone(), shared.profile_id.clone()],
        )
        .unwrap();
    let group = engine.create_group(&org_id, "Night shift", None).unwrap();
    engine.add_user_to_group(&group.group_id, "m@example.com").unwrap();
    engine
        .set_group_profiles(
            &group.group_id,
            &[shared.profile_id.clone(), via_group.profile_id.clone()],
        )
        .unwrap();

    let members = engine.store.group_members(&group.group_id).unwrap();
    assert_eq!(members, vec![user.clone()]);

    let ids = engine.effective_profile_ids(&user.user_id).unwrap();
    assert_eq!(
        sorted(ids),
        sorted(vec![direct.profile_id, shared.profile_id, via_group.profile_id]),
        "Shared profile must appear once"
    );
}

#[test]
fn leaving_a_group_drops_its_profiles() {
    let (engine, org_id) = make_engine();
    let user = engine.create_user(&org_id, "leaver@example.com", None).unwrap();
    let profile = engine.create_profile(&org_id, "Group", None).unwrap();
    let group = engine.create_group(&org_id, "Temp", None).unwrap();
    engine.add_user_to_group(&group.group_id, &user.email).unwrap();
    engine
        .set_group_profiles(&group.group_id, &[profile.profile_id.clone()])
        .unwrap();
    assert_eq!(engine.effective_profile_ids(&user.user_id).unwrap(), vec![profile.profile_id]);

    engine.remove_user_from_group(&group.group_id, &user.user_id).unwrap();
    assert!(engine.effective_profile_ids(&user.user_id).unwrap().is_empty());
}

#[test]
fn reassignment_replaces_direct_profiles() {
    let (engine, org_id) = make_engine();
    let user = engine.create_user(&org_id, "r@example.com", None).unwrap();
    let a = engine.create_profile(&org_id, "A", None).unwrap();
    let b = engine.create_profile(&org_id, "B", None).unwrap();

    engine.assign_user_profiles(&user.user_id, &[a.profile_id.clone()]).unwrap();
    engine.assign_user_profiles(&user.user_id, &[b.profile_id.clone()]).unwrap();
    assert_eq!(engine.effective_profile_ids(&user.user_id).unwrap(), vec![b.profile_id]);

    engine.assign_user_profiles(&user.user_id, &[]).unwrap();
    assert!(engine.effective_profile_ids(&user.user_id).unwrap().is_empty());
}

#[test]
fn deleting_groups_and_profiles_updates_membership() {
    let (engine, org_id) = make_engine();
    let user = engine.create_user(&org_id, "d@example.com", None).unwrap();
    let kept = engine.create_profile(&org_id, "Kept", None).unwrap();
    let dropped = engine.create_profile(&org_id, "Dropped", None).unwrap();
    engine
        .assign_user_profiles(&user.user_id, &[kept.profile_id.clone(), dropped.profile_id.clone()])
        .unwrap();
    engine.delete_profile(&dropped.profile_id).unwrap();
    assert_eq!(engine.effective_profile_ids(&user.user_id).unwrap(), vec![kept.profile_id.clone()]);

    let group = engine.create_group(&org_id, "Gone", None).unwrap();
    let extra = engine.create_profile(&org_id, "Extra", None).unwrap();
    engine.add_user_to_group(&group.group_id, &user.email).unwrap();
    engine.set_group_profiles(&group.group_id, &[extra.profile_id]).unwrap();
    engine.delete_group(&group.group_id).unwrap();
    assert_eq!(engine.effective_profile_ids(&user.user_id).unwrap(), vec![kept.profile_id]);
}

#[test]
fn unknown_users_are_not_found() {
    let (engine, _org_id) = make_engine();
    let result = engine.effective_profile_ids("nobody");
    assert!(
        matches!(result, Err(JournalError::NotFound { entity: "User", .. })),
        "got {result:?}"
    );
    assert!(matches!(
        engine.daily_view("nobody", None),
        Err(JournalError::NotFound { .. })
    ));
}

#[test]
fn group_membership_stays_within_the_organization() {
    let (engine, org_id) = make_engine();
    let other = engine.create_organization("Other", "OTH").unwrap();
    engine
        .create_user(&other.organization_id, "outsider@example.com", None)
        .unwrap();
    let group = engine.create_group(&org_id, "Insiders", None).unwrap();

    let result = engine.add_user_to_group(&group.group_id, "outsider@example.com");
    assert!(matches!(result, Err(JournalError::NotFound { entity: "User", .. })));
    assert!(matches!(
        engine.add_user_to_group("no-such-group", "outsider@example.com"),
        Err(JournalError::NotFound { entity: "Group", .. })
    ));
}

#[test]
fn names_and_emails_are_validated() {
    let (engine, org_id) = make_engine();
    engine.create_user(&org_id, "taken@example.com", None).unwrap();

    let duplicate = engine.create_user(&org_id, "taken@example.com", None);
    assert!(duplicate.as_ref().is_err_and(JournalError::is_validation));
    assert!(engine
        .create_group(&org_id, "  ", None)
        .as_ref()
        .is_err_and(JournalError::is_validation));
    assert!(engine
        .create_profile(&org_id, "", None)
        .as_ref()
        .is_err_and(JournalError::is_validation));
    assert!(engine
        .create_organization("Again", "MEM")
        .as_ref()
        .is_err_and(JournalError::is_validation));
}

#[test]
fn profiles_and_groups_can_be_renamed() {
    let (engine, org_id) = make_engine();
    let profile = engine.create_profile(&org_id, "Before", None).unwrap();
    engine
        .update_profile(&profile.profile_id, "After", Some("renamed"))
        .unwrap();
    let loaded = engine.profile_with_rules(&profile.profile_id).unwrap();
    assert_eq!(loaded.profile.name, "After");
    assert_eq!(loaded.profile.description.as_deref(), Some("renamed"));

    let group = engine.create_group(&org_id, "G", None).unwrap();
    engine.update_group(&group.group_id, "G2", None).unwrap();
    assert_eq!(engine.store.get_group(&group.group_id).unwrap().unwrap().name, "G2");
    let groups = engine.store.list_groups(&org_id).unwrap();
    assert_eq!(groups.len(), 1);
    let profiles = engine.store.list_profiles(&org_id).unwrap();
    assert_eq!(profiles.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(), vec!["After"]);
    assert!(matches!(
        engine.update_group("missing", "X", None),
        Err(JournalError::NotFound { .. })
    ));
}
