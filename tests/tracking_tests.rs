// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress tracking over the HTTP API.

use axum::http::{Method, StatusCode};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::{json, Value};

mod common;
use common::{create_test_app, reference_fields, send, TestApp};

const USER: u64 = 10;
const OTHER_USER: u64 = 20;

fn days_ago(n: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(n)
}

async fn post(app: &TestApp, user_id: u64, uri: &str, body: Value) -> (StatusCode, Value) {
    send(&app.router, Method::POST, uri, Some(user_id), Some(body)).await
}

async fn get(app: &TestApp, user_id: u64, uri: &str) -> (StatusCode, Value) {
    send(&app.router, Method::GET, uri, Some(user_id), None).await
}

#[tokio::test]
async fn test_tracking_requires_auth() {
    let app = create_test_app().await;
    for uri in [
        "/api/tracking/daily",
        "/api/tracking/measurements",
        "/api/tracking/workouts",
        "/api/tracking/summary",
    ] {
        let (status, _) = send(&app.router, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn test_daily_entry_roundtrip() {
    let app = create_test_app().await;
    let date = days_ago(1);

    let (status, saved) = post(
        &app,
        USER,
        "/api/tracking/daily",
        json!({
            "date": date,
            "weight_kg": 84.6,
            "water_ml": 2000,
            "meals": [{"meal_number": 1, "name": "Oats", "planned_meal": true}],
            "workout": {"workout_name": "Upper body", "duration_minutes": 50}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", saved);
    assert_eq!(saved["id"], format!("{}_{}", USER, date));

    let (status, fetched) = get(&app, USER, &format!("/api/tracking/daily/{}", date)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["water_ml"], 2000);
    assert_eq!(fetched["meals"][0]["name"], "Oats");

    // Another user's day is not visible.
    let (status, body) = get(&app, OTHER_USER, &format!("/api/tracking/daily/{}", date)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "tracking_not_found");
}

#[tokio::test]
async fn test_daily_entry_validation() {
    let app = create_test_app().await;

    let future = Utc::now().date_naive() + Duration::days(2);
    let (status, body) = post(&app, USER, "/api/tracking/daily", json!({"date": future})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = post(
        &app,
        USER,
        "/api/tracking/daily",
        json!({"date": days_ago(0), "weight_kg": 12.0}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, USER, "/api/tracking/daily/yesterday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_daily_range_is_filtered_and_ordered() {
    let app = create_test_app().await;
    for n in [9, 2, 5, 40] {
        post(&app, USER, "/api/tracking/daily", json!({"date": days_ago(n)})).await;
    }

    // Default range is the last 30 days.
    let (status, entries) = get(&app, USER, "/api/tracking/daily").await;
    assert_eq!(status, StatusCode::OK);
    let dates: Vec<&str> = entries
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["date"].as_str().unwrap())
        .collect();
    let expected: Vec<String> = [9, 5, 2].iter().map(|n| days_ago(*n).to_string()).collect();
    assert_eq!(dates, expected);

    let uri = format!(
        "/api/tracking/daily?start={}&end={}",
        days_ago(5),
        days_ago(2)
    );
    let (_, entries) = get(&app, USER, &uri).await;
    assert_eq!(entries.as_array().unwrap().len(), 2);

    let uri = format!(
        "/api/tracking/daily?start={}&end={}",
        days_ago(2),
        days_ago(5)
    );
    let (status, _) = get(&app, USER, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_measurements_merge_by_date() {
    let app = create_test_app().await;
    let date = days_ago(3);

    post(
        &app,
        USER,
        "/api/tracking/measurements",
        json!({"date": date, "chest_cm": 102.0, "waist_cm": 91.0}),
    )
    .await;
    let (status, merged) = post(
        &app,
        USER,
        "/api/tracking/measurements",
        json!({"date": date, "waist_cm": 90.0, "arms_cm": 36.5}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", merged);
    assert_eq!(merged["chest_cm"], 102.0);
    assert_eq!(merged["waist_cm"], 90.0);
    assert_eq!(merged["arms_cm"], 36.5);

    let (_, list) = get(&app, USER, "/api/tracking/measurements").await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, body) = post(
        &app,
        USER,
        "/api/tracking/measurements",
        json!({"date": date, "arms_cm": 120.0}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].as_str().unwrap().contains("arms_cm"));
}

#[tokio::test]
async fn test_summary_combines_every_record() {
    let app = create_test_app().await;

    post(&app, USER, "/api/tracking/daily", json!({"date": days_ago(6), "weight_kg": 86.0})).await;
    post(&app, USER, "/api/tracking/daily", json!({"date": days_ago(3)})).await;
    post(&app, USER, "/api/tracking/daily", json!({"date": days_ago(0), "weight_kg": 85.0})).await;

    post(
        &app,
        USER,
        "/api/tracking/workouts",
        json!({"date": days_ago(6), "workout_name": "Legs", "duration_minutes": 40}),
    )
    .await;
    let (status, logged) = post(
        &app,
        USER,
        "/api/tracking/workouts",
        json!({"workout_name": "Push", "duration_minutes": 60}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", logged);
    assert_eq!(logged["date"], days_ago(0).to_string());

    post(&app, USER, "/api/tracking/measurements", json!({"date": days_ago(6), "waist_cm": 92.0})).await;
    post(&app, USER, "/api/tracking/measurements", json!({"date": days_ago(1), "waist_cm": 90.0})).await;

    // Records of other users stay out of the summary.
    post(&app, OTHER_USER, "/api/tracking/daily", json!({"date": days_ago(2), "weight_kg": 60.0})).await;

    let uri = format!(
        "/api/tracking/summary?start={}&end={}",
        days_ago(6),
        days_ago(0)
    );
    let (status, summary) = get(&app, USER, &uri).await;
    assert_eq!(status, StatusCode::OK, "{}", summary);
    assert_eq!(summary["days_tracked"], 3);
    assert_eq!(summary["start_weight_kg"], 86.0);
    assert_eq!(summary["current_weight_kg"], 85.0);
    assert_eq!(summary["weight_change_kg"], -1.0);
    assert_eq!(summary["workouts_completed"], 2);
    assert_eq!(summary["total_workout_minutes"], 100);
    assert_eq!(summary["average_workout_minutes"], 50.0);
    assert_eq!(summary["measurement_changes"]["waist_cm"], -2.0);
    let adherence = summary["adherence_percent"].as_f64().unwrap();
    assert!((adherence - 300.0 / 7.0).abs() < 1e-3);
}

#[tokio::test]
async fn test_account_deletion_removes_tracking() {
    let app = create_test_app().await;
    let (status, _) = post(
        &app,
        USER,
        "/api/profiles",
        serde_json::to_value(reference_fields()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    post(&app, USER, "/api/tracking/daily", json!({"date": days_ago(1)})).await;
    post(&app, USER, "/api/tracking/measurements", json!({"date": days_ago(1), "hips_cm": 100.0})).await;
    post(
        &app,
        USER,
        "/api/tracking/workouts",
        json!({"workout_name": "Run", "duration_minutes": 25}),
    )
    .await;

    let (status, body) = send(&app.router, Method::DELETE, "/api/account", Some(USER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 4);

    let (_, entries) = get(&app, USER, "/api/tracking/daily").await;
    assert!(entries.as_array().unwrap().is_empty());
    let (_, summary) = get(&app, USER, "/api/tracking/summary").await;
    assert_eq!(summary["workouts_completed"], 0);
}
