// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Run with FIRESTORE_EMULATOR_HOST set, e.g. `gcloud emulators firestore start`.
//!
//! The emulator keeps state across tests, so every test uses its own user ID.

use chrono::{Duration, Utc};
use fitplan_pro::db::{FirestoreDb, Store};
use fitplan_pro::error::AppError;
use fitplan_pro::models::tracking::{DailyFields, MeasurementFields};
use fitplan_pro::models::{
    BodyMeasurement, DailyTracking, Plan, PlanContent, PlanType, PromptTemplate, UserProfile,
};
use fitplan_pro::services::SimilarityBands;
use serde_json::Value;
use uuid::Uuid;

mod common;
use common::{meal_response, reference_fields, test_db};

/// Generate a unique user ID for test isolation.
fn unique_user_id() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64
}

fn meal_content() -> PlanContent {
    let record = match serde_json::from_str(&meal_response()).unwrap() {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    PlanContent::from_record(PlanType::MealPlan, record).unwrap()
}

fn plan_for(profile: &UserProfile) -> Plan {
    Plan::generated(
        profile.user_id,
        profile.fingerprint.clone(),
        profile.traits(),
        meal_content(),
        "openai:gpt-4o".to_string(),
        Utc::now(),
    )
}

#[tokio::test]
async fn test_offline_client_reports_database_error() {
    // Runs without the emulator.
    let db = FirestoreDb::new_mock();
    let err = db.get_profile(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::Database(_)));

    let err = db.delete_user_data(1).await.unwrap_err();
    assert!(matches!(err, AppError::Database(_)));
}

// ═══════════════════════════════════════════════════════════════════════════
// PROFILE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_profile_roundtrip() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();

    let profile = UserProfile::new(user_id, reference_fields(), Utc::now());
    assert!(db.get_profile(profile.id).await.unwrap().is_none());

    db.upsert_profile(&profile).await.unwrap();

    let fetched = db.get_profile(profile.id).await.unwrap().unwrap();
    assert_eq!(fetched.user_id, user_id);
    assert_eq!(fetched.fingerprint, profile.fingerprint);
    assert_eq!(fetched.fields.location_culture, "MOROCCO");

    println!("✓ Profile stored and read back: user_id={}", user_id);
}

#[tokio::test]
async fn test_profiles_for_user_newest_first() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();
    let now = Utc::now();

    let older = UserProfile::new(user_id, reference_fields(), now - Duration::hours(1));
    let mut newer_fields = reference_fields();
    newer_fields.age = 40;
    let newer = UserProfile::new(user_id, newer_fields, now);

    db.upsert_profile(&older).await.unwrap();
    db.upsert_profile(&newer).await.unwrap();

    let profiles = db.profiles_for_user(user_id).await.unwrap();
    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[0].id, newer.id);
    assert_eq!(profiles[1].id, older.id);
}

// ═══════════════════════════════════════════════════════════════════════════
// PLAN TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_plan_lookup_by_fingerprint() {
    require_emulator!();

    let db = test_db().await;
    let profile = UserProfile::new(unique_user_id(), reference_fields(), Utc::now());
    let plan = plan_for(&profile);
    db.insert_plan(&plan).await.unwrap();

    let found = db
        .plans_for_fingerprint(&profile.fingerprint, PlanType::MealPlan)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, plan.id);
    assert_eq!(found[0].content, plan.content);

    let other_type = db
        .plans_for_fingerprint(&profile.fingerprint, PlanType::WorkoutPlan)
        .await
        .unwrap();
    assert!(other_type.is_empty());
}

#[tokio::test]
async fn test_similar_candidates_use_coarse_filters() {
    require_emulator!();

    let db = test_db().await;
    let bands = SimilarityBands::default();

    let near = UserProfile::new(unique_user_id(), reference_fields(), Utc::now());
    let mut far_fields = reference_fields();
    far_fields.age = 60;
    let far = UserProfile::new(unique_user_id(), far_fields, Utc::now());

    let near_plan = plan_for(&near);
    let far_plan = plan_for(&far);
    db.insert_plan(&near_plan).await.unwrap();
    db.insert_plan(&far_plan).await.unwrap();

    let mut target_fields = reference_fields();
    target_fields.age = 32;
    let target = UserProfile::new(unique_user_id(), target_fields, Utc::now());

    let candidates = db
        .similar_plan_candidates(&target.traits(), PlanType::MealPlan, &bands)
        .await
        .unwrap();
    let ids: Vec<Uuid> = candidates.iter().map(|p| p.id).collect();

    assert!(ids.contains(&near_plan.id));
    assert!(!ids.contains(&far_plan.id));
}

#[tokio::test]
async fn test_delete_plan_reports_existence() {
    require_emulator!();

    let db = test_db().await;
    let profile = UserProfile::new(unique_user_id(), reference_fields(), Utc::now());
    let plan = plan_for(&profile);
    db.insert_plan(&plan).await.unwrap();

    assert!(db.delete_plan(plan.id).await.unwrap());
    assert!(db.get_plan(plan.id).await.unwrap().is_none());
    assert!(!db.delete_plan(plan.id).await.unwrap());
}

// ═══════════════════════════════════════════════════════════════════════════
// TEMPLATE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_active_template_picks_highest_version() {
    require_emulator!();

    let db = test_db().await;
    let now = Utc::now();
    // Versions far above anything a seeded template would use.
    let base = (unique_user_id() % 1_000_000) as u32 + 1_000_000;

    let make = |version: u32, active: bool| PromptTemplate {
        id: Uuid::new_v4(),
        name: format!("integration-{}", base),
        template_type: PlanType::WorkoutPlan,
        body: "{\"system_prompt\": \"s\", \"user_context\": {}}".to_string(),
        version,
        active,
        created_at: now,
        updated_at: now,
    };

    let v1 = make(base, true);
    let v2 = make(base + 1, true);
    let v3 = make(base + 2, false);
    for template in [&v1, &v2, &v3] {
        db.upsert_template(template).await.unwrap();
    }

    let active = db
        .active_template(PlanType::WorkoutPlan)
        .await
        .unwrap()
        .unwrap();
    assert!(active.version >= v2.version);
    assert!(active.active);

    let fetched = db.get_template(v3.id).await.unwrap().unwrap();
    assert!(!fetched.active);
}

// ═══════════════════════════════════════════════════════════════════════════
// TRACKING TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_tracking_date_range_query() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();
    let today = Utc::now().date_naive();
    let now = Utc::now();

    for n in [0, 3, 10] {
        let fields = DailyFields {
            date: today - Duration::days(n),
            weight_kg: Some(80.0),
            water_ml: None,
            meals: vec![],
            workout: None,
            progress_photo_url: None,
            notes: None,
        };
        db.upsert_daily_tracking(&DailyTracking::new(user_id, fields, now))
            .await
            .unwrap();
    }

    let entries = db
        .daily_tracking_between(user_id, today - Duration::days(5), today)
        .await
        .unwrap();
    let dates: Vec<_> = entries.iter().map(|e| e.fields.date).collect();
    assert_eq!(dates, vec![today - Duration::days(3), today]);

    let measurement = BodyMeasurement::new(
        user_id,
        MeasurementFields {
            date: today,
            chest_cm: None,
            waist_cm: Some(90.0),
            hips_cm: None,
            arms_cm: None,
            thighs_cm: None,
        },
        now,
    );
    db.upsert_body_measurement(&measurement).await.unwrap();
    let fetched = db.get_body_measurement(user_id, today).await.unwrap().unwrap();
    assert_eq!(fetched.fields.waist_cm, Some(90.0));

    assert_eq!(db.delete_user_data(user_id).await.unwrap(), 4);
    assert!(db.get_daily_tracking(user_id, today).await.unwrap().is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// ACCOUNT DELETION
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_delete_user_data_cascades() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();
    let profile = UserProfile::new(user_id, reference_fields(), Utc::now());
    db.upsert_profile(&profile).await.unwrap();
    db.insert_plan(&plan_for(&profile)).await.unwrap();

    let bystander = UserProfile::new(unique_user_id(), reference_fields(), Utc::now());
    db.upsert_profile(&bystander).await.unwrap();

    let deleted = db.delete_user_data(user_id).await.unwrap();
    assert_eq!(deleted, 2);

    assert!(db.profiles_for_user(user_id).await.unwrap().is_empty());
    assert!(db.plans_for_user(user_id).await.unwrap().is_empty());
    assert!(db.get_profile(bystander.id).await.unwrap().is_some());

    println!("✓ User data deleted: user_id={}", user_id);
}
