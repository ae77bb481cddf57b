//! journal-runner: headless driver for the journal engine.
//!
//! Usage:
//!   journal-runner --seed-demo --user demo@example.com --date 2024-06-01
//!   journal-runner --db journal.db --import prompts.json --org ACME
//!   journal-runner --db journal.db --user ana@example.com --json

use anyhow::{bail, Context, Result};
use journal_core::{
    config::EngineConfig,
    date::JournalDate,
    engine::JournalEngine,
    journal::DailyView,
    profile::RuleDraft,
    prompt::{CategoryRef, PromptDraft, PromptType},
};
use std::env;

const DEMO_ORG_CODE: &str = "DEMO";
const DEMO_USER: &str = "demo@example.com";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let json = args.iter().any(|a| a == "--json");
    let seed_demo = args.iter().any(|a| a == "--seed-demo");

    let config = match flag_value(&args, "--config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let engine = JournalEngine::open(db, config)?;

    if !json {
        println!("journal-runner");
        println!("  db:        {db}");
        println!("  rng:       {:?}", engine.config.rng_algorithm);
        println!();
    }

    if seed_demo {
        seed_demo_data(&engine)?;
    }

    if let Some(file) = flag_value(&args, "--import") {
        let code = flag_value(&args, "--org").context("--import needs --org <code>")?;
        import_file(&engine, file, code, json)?;
    }

    let user = flag_value(&args, "--user").or(seed_demo.then_some(DEMO_USER));
    if let Some(email) = user {
        let date = flag_value(&args, "--date")
            .map(str::parse::<JournalDate>)
            .transpose()?;
        let view = daily_view_for(&engine, email, date)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&view)?);
        } else {
            print_view(&view, email);
        }
    }

    Ok(())
}

fn daily_view_for(engine: &JournalEngine, email: &str, date: Option<JournalDate>) -> Result<DailyView> {
    let user = engine
        .store
        .find_user_by_email(email)?
        .with_context(|| format!("no user with email {email}"))?;
    Ok(engine.daily_view(&user.user_id, date)?)
}

fn import_file(engine: &JournalEngine, file: &str, code: &str, json: bool) -> Result<()> {
    let Some(org) = engine.store.organization_by_code(code)? else {
        bail!("no organization with code {code}");
    };
    let content = std::fs::read_to_string(file).with_context(|| format!("Cannot read {file}"))?;
    let summary = engine.import_prompts(&org.organization_id, &content)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    println!("=== IMPORT ({}) ===", org.name);
    for row in &summary {
        println!("  {:<20} added: {:>3}  skipped: {:>3}", row.category, row.added, row.skipped);
    }
    println!();
    Ok(())
}

/// One organization, three categories, a profile with one rule of each
/// kind, a user assigned through a group.
fn seed_demo_data(engine: &JournalEngine) -> Result<()> {
    if engine.store.organization_by_code(DEMO_ORG_CODE)?.is_some() {
        log::info!("Demo organization already present; not seeding");
        return Ok(());
    }

    let org = engine.create_organization("Demo Clinic", DEMO_ORG_CODE)?;
    let org_id = org.organization_id.as_str();

    let general = engine.create_category(org_id, "General")?;
    let tasks = engine.create_category(org_id, "Tasks")?;
    let anxiety = engine.create_category(org_id, "Anxiety")?;

    engine.create_prompt(org_id, &PromptDraft::text("How are you feeling today?", None).global())?;
    for content in [
        "What made you smile today?",
        "What are you grateful for?",
        "Describe one thing you learned.",
        "Who did you talk to today?",
    ] {
        let draft = PromptDraft::text(content, Some(CategoryRef::Id(general.category_id.clone())));
        engine.create_prompt(org_id, &draft)?;
    }
    for content in ["Did you take your medication?", "Did you go for a walk?"] {
        let draft = PromptDraft {
            prompt_type: PromptType::Radio,
            ..PromptDraft::text(content, Some(CategoryRef::Id(tasks.category_id.clone())))
        };
        engine.create_prompt(org_id, &draft)?;
    }
    for content in [
        "What is worrying you right now?",
        "Rate your anxiety today.",
        "What helped you calm down?",
    ] {
        let draft = PromptDraft::text(content, Some(CategoryRef::Id(anxiety.category_id.clone())));
        engine.create_prompt(org_id, &draft)?;
    }

    let profile = engine.create_profile(org_id, "Daily Basics", Some("Default journaling routine"))?;
    engine.create_rule(
        &profile.profile_id,
        &RuleDraft::include_all(CategoryRef::Id(tasks.category_id)),
    )?;
    engine.create_rule(
        &profile.profile_id,
        &RuleDraft::pick(CategoryRef::Id(general.category_id), 1, 2),
    )?;
    engine.create_rule(
        &profile.profile_id,
        &RuleDraft::pick(CategoryRef::Id(anxiety.category_id), 0, 1),
    )?;

    engine.create_user(org_id, DEMO_USER, Some("Demo User"))?;
    let group = engine.create_group(org_id, "Everyone", None)?;
    engine.add_user_to_group(&group.group_id, DEMO_USER)?;
    engine.set_group_profiles(&group.group_id, &[profile.profile_id])?;

    log::info!("Seeded demo organization {}", org.organization_id);
    Ok(())
}

fn print_view(view: &DailyView, email: &str) {
    println!("=== PROMPTS FOR {email} ON {} ===", view.date);
    if !view.has_configuration {
        println!("  (No profiles assigned)");
    }
    if view.prompts.is_empty() {
        println!("  (No prompts)");
    }
    for (i, p) in view.prompts.iter().enumerate() {
        let scope = if p.is_global { "global" } else { "rule" };
        println!(
            "  {:>2}. [{:<8}] {:<6} {} ({})",
            i + 1,
            p.prompt_type.as_str(),
            scope,
            p.content,
            p.category_name.as_deref().unwrap_or("-")
        );
    }
    if !view.entries.is_empty() {
        println!();
        println!("  {} answers recorded", view.entries.len());
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
