// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::Utc;
use fitplan_pro::config::Config;
use fitplan_pro::db::{FirestoreDb, MemoryDb, Store};
use fitplan_pro::error::AppError;
use fitplan_pro::middleware::auth::create_jwt;
use fitplan_pro::models::profile::{
    BudgetConstraint, DietPreference, TrainingExperience, TrainingLocation,
};
use fitplan_pro::models::{Gender, GoalType, PlanType, ProfileFields, PromptTemplate};
use fitplan_pro::routes::create_router;
use fitplan_pro::services::{AiGateway, Backend, ChatBackend, CompletionRequest, ResponseCache};
use fitplan_pro::AppState;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

// ─── Fake LLM backend ────────────────────────────────────────

/// What a [`FakeBackend`] answers with.
#[derive(Clone)]
#[allow(dead_code)]
pub enum Reply {
    Text(String),
    Fail(String),
    /// A valid plan for whichever plan type the system prompt names.
    ForPlanType,
}

/// Scripted LLM backend that counts its calls.
pub struct FakeBackend {
    backend: Backend,
    reply: Mutex<Reply>,
    calls: AtomicUsize,
    delay: Mutex<Duration>,
    last_request: Mutex<Option<CompletionRequest>>,
}

#[allow(dead_code)]
impl FakeBackend {
    pub fn new(backend: Backend, reply: Reply) -> Self {
        Self {
            backend,
            reply: Mutex::new(reply),
            calls: AtomicUsize::new(0),
            delay: Mutex::new(Duration::ZERO),
            last_request: Mutex::new(None),
        }
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn model(&self) -> &str {
        match self.backend {
            Backend::OpenAi => "fake-gpt",
            Backend::Anthropic => "fake-claude",
        }
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let reply = self.reply.lock().unwrap().clone();
        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Fail(msg) => Err(AppError::AiBackend(msg)),
            Reply::ForPlanType => Ok(response_for(requested_plan_type(&request.system))),
        }
    }
}

// ─── Canned content ──────────────────────────────────────────

/// Plan type named in a seeded template's system prompt; meal otherwise.
fn requested_plan_type(system: &str) -> PlanType {
    [PlanType::CombinedPlan, PlanType::WorkoutPlan]
        .into_iter()
        .find(|t| system.contains(t.as_str()))
        .unwrap_or(PlanType::MealPlan)
}

#[allow(dead_code)]
pub fn meal_response() -> String {
    json!({
        "daily_calories": 2200,
        "macros": {"protein_percentage": 30, "carbs_percentage": 40, "fats_percentage": 30},
        "daily_plans": [{
            "day": 1,
            "meals": [{"meal_number": 1, "name": "Msemen with eggs", "calories": 550,
                       "ingredients": ["msemen", "eggs"]}],
            "total_calories": 2200
        }]
    })
    .to_string()
}

#[allow(dead_code)]
pub fn workout_response() -> String {
    json!({
        "focus": "fat loss",
        "weekly_schedule": [{
            "day": 1,
            "focus": "full body",
            "exercises": [{"name": "Squat", "sets": 4, "reps": "8-10", "rest_seconds": 90}]
        }]
    })
    .to_string()
}

#[allow(dead_code)]
pub fn combined_response() -> String {
    // Meal and workout sections share the top level of one record.
    let mut record: Value = serde_json::from_str(&meal_response()).unwrap();
    let workout: Value = serde_json::from_str(&workout_response()).unwrap();
    let map = record.as_object_mut().unwrap();
    map.extend(workout.as_object().unwrap().clone());
    map.insert("recommendations".to_string(), json!({"sleep": "8 hours"}));
    record.to_string()
}

/// Reply matching the plan type, as a backend would produce it.
#[allow(dead_code)]
pub fn response_for(plan_type: PlanType) -> String {
    match plan_type {
        PlanType::MealPlan => meal_response(),
        PlanType::WorkoutPlan => workout_response(),
        PlanType::CombinedPlan => combined_response(),
    }
}

/// The reference profile: MALE, 30y, 180cm, 85kg, WEIGHT_LOSS.
#[allow(dead_code)]
pub fn reference_fields() -> ProfileFields {
    ProfileFields {
        gender: Gender::Male,
        age: 30,
        height_cm: 180.0,
        current_weight_kg: 85.0,
        target_weight_kg: Some(78.0),
        goal_type: GoalType::WeightLoss,
        training_experience: TrainingExperience::Intermediate,
        training_location: TrainingLocation::Gym,
        days_per_week: 4,
        diet_preference: DietPreference::Normal,
        meals_per_day: 3,
        snacks_per_day: 1,
        location_culture: "MOROCCO".to_string(),
        medical_conditions: None,
        food_allergies: None,
        time_per_workout_min: Some(60),
        equipment_available: Some("dumbbells".to_string()),
        budget_constraint: Some(BudgetConstraint::Medium),
        preferred_workout_time: None,
    }
}

fn template(plan_type: PlanType) -> PromptTemplate {
    let now = Utc::now();
    PromptTemplate {
        id: Uuid::new_v4(),
        name: format!("{}-default", plan_type.as_str().to_lowercase()),
        template_type: plan_type,
        body: json!({
            "system_prompt": format!("You create {} documents. Reply with JSON only.", plan_type),
            "user_context": {
                "gender": "{{gender}}",
                "age": "{{age}}",
                "height": "{{height}}",
                "weight": "{{current_weight}}",
                "goal": "{{goal_type}}",
                "culture": "{{location_culture}}",
                "allergies": "{{food_allergies}}"
            }
        })
        .to_string(),
        version: 1,
        active: true,
        created_at: now,
        updated_at: now,
    }
}

// ─── Test app ────────────────────────────────────────────────

/// Admin user in `Config::test_default()`.
#[allow(dead_code)]
pub const ADMIN_USER: u64 = 1;

#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub db: Arc<MemoryDb>,
    pub openai: Arc<FakeBackend>,
    pub anthropic: Arc<FakeBackend>,
}

/// Create a test app over the in-memory store with fake LLM backends and
/// one seeded template per plan type.
///
/// Both fakes answer with a valid plan of the requested type; tests switch
/// replies as needed.
#[allow(dead_code)]
pub async fn create_test_app() -> TestApp {
    let config = Config::test_default();
    let db = Arc::new(MemoryDb::new());
    for plan_type in [
        PlanType::MealPlan,
        PlanType::WorkoutPlan,
        PlanType::CombinedPlan,
    ] {
        db.upsert_template(&template(plan_type)).await.unwrap();
    }

    let openai = Arc::new(FakeBackend::new(Backend::OpenAi, Reply::ForPlanType));
    let anthropic = Arc::new(FakeBackend::new(Backend::Anthropic, Reply::ForPlanType));

    let store: Arc<dyn Store> = db.clone();
    let gateway = AiGateway::new(
        store.clone(),
        openai.clone(),
        anthropic.clone(),
        ResponseCache::new(config.ai_cache.clone()),
    );
    let state = Arc::new(AppState::new(config, store, gateway));

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
        openai,
        anthropic,
    }
}

/// Create a JWT the auth middleware accepts.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: u64) -> String {
    create_jwt(user_id, &Config::test_default().jwt_signing_key).unwrap()
}

/// Send a JSON request through the router, optionally authenticated.
#[allow(dead_code)]
pub async fn send(
    router: &axum::Router,
    method: Method,
    uri: &str,
    user_id: Option<u64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header(
            header::AUTHORIZATION,
            format!("Bearer {}", create_test_jwt(user_id)),
        );
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}
