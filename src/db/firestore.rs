// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Profiles (user-supplied fitness profiles)
//! - Plans (generated plans, keyed by plan ID)
//! - Prompt templates (versioned LLM prompts)
//! - Progress tracking (daily logs, body measurements, workout history)
//!
//! Timestamps are not used in server-side ordering; result sets are small
//! and sorted after the fetch.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::db::{
    collections, newest_plans_first, newest_profiles_first, oldest_workouts_first, Store,
};
use crate::error::AppError;
use crate::models::template::select_active;
use crate::models::tracking::day_key;
use crate::models::{
    BodyMeasurement, DailyTracking, Plan, PlanType, ProfileTraits, PromptTemplate, UserProfile,
    WorkoutEntry,
};
use crate::services::similarity::SimilarityBands;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. Every operation returns a database error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    async fn get_by_id<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn put<T>(&self, collection: &str, id: &str, object: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(object)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// A user's documents whose `date` falls in `[start, end]`.
    ///
    /// Dates serialize as `YYYY-MM-DD`, so string comparison orders them.
    /// Needs a composite index on (user_id, date).
    async fn dated_between<T>(
        &self,
        collection: &str,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        let (start, end) = (start.to_string(), end.to_string());
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(|q| {
                q.for_all([
                    q.field("user_id").eq(user_id),
                    q.field("date").greater_than_or_equal(start.as_str()),
                    q.field("date").less_than_or_equal(end.as_str()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Document IDs (the `id` field) of everything a user owns in a collection.
    async fn owned_ids(&self, collection: &str, user_id: u64) -> Result<Vec<String>, AppError> {
        #[derive(serde::Deserialize)]
        struct Owned {
            id: String,
        }

        let rows: Vec<Owned> = self
            .get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|r| r.id).collect())
    }

    /// Helper to batch delete documents using transactions.
    async fn batch_delete(&self, doc_ids: &[String], collection: &str) -> Result<(), AppError> {
        let client = self.get_client()?;

        for chunk in doc_ids.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for doc_id in chunk {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

#[async_trait]
impl Store for FirestoreDb {
    // ─── Profile Operations ──────────────────────────────────────

    async fn get_profile(&self, id: Uuid) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PROFILES)
            .obj()
            .one(&id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn profiles_for_user(&self, user_id: u64) -> Result<Vec<UserProfile>, AppError> {
        let mut profiles: Vec<UserProfile> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::PROFILES)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        newest_profiles_first(&mut profiles);
        Ok(profiles)
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PROFILES)
            .document_id(profile.id.to_string())
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Plan Operations ─────────────────────────────────────────

    async fn get_plan(&self, id: Uuid) -> Result<Option<Plan>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PLANS)
            .obj()
            .one(&id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn plans_for_fingerprint(
        &self,
        fingerprint: &str,
        plan_type: PlanType,
    ) -> Result<Vec<Plan>, AppError> {
        let mut plans: Vec<Plan> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::PLANS)
            .filter(|q| {
                q.for_all([
                    q.field("fingerprint").eq(fingerprint),
                    q.field("plan_type").eq(plan_type.as_str()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        newest_plans_first(&mut plans);
        Ok(plans)
    }

    async fn plans_for_user(&self, user_id: u64) -> Result<Vec<Plan>, AppError> {
        let mut plans: Vec<Plan> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::PLANS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        newest_plans_first(&mut plans);
        Ok(plans)
    }

    /// Needs a composite index on
    /// (plan_type, traits.gender, traits.goal_type, traits.age).
    async fn similar_plan_candidates(
        &self,
        traits: &ProfileTraits,
        plan_type: PlanType,
        bands: &SimilarityBands,
    ) -> Result<Vec<Plan>, AppError> {
        let (min_age, max_age) = bands.age_range(traits.age);
        let gender = traits.gender.as_str();
        let goal = traits.goal_type.as_str();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::PLANS)
            .filter(|q| {
                q.for_all([
                    q.field("plan_type").eq(plan_type.as_str()),
                    q.field("traits.gender").eq(gender),
                    q.field("traits.goal_type").eq(goal),
                    q.field("traits.age").greater_than_or_equal(min_age),
                    q.field("traits.age").less_than_or_equal(max_age),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert_plan(&self, plan: &Plan) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PLANS)
            .document_id(plan.id.to_string())
            .object(plan)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_plan(&self, id: Uuid) -> Result<bool, AppError> {
        if self.get_plan(id).await?.is_none() {
            return Ok(false);
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::PLANS)
            .document_id(id.to_string())
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    // ─── Prompt Template Operations ─────────────────────────────

    async fn list_templates(&self) -> Result<Vec<PromptTemplate>, AppError> {
        let mut templates: Vec<PromptTemplate> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::PROMPT_TEMPLATES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        templates.sort_by(|a, b| a.name.cmp(&b.name).then(b.version.cmp(&a.version)));
        Ok(templates)
    }

    async fn get_template(&self, id: Uuid) -> Result<Option<PromptTemplate>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PROMPT_TEMPLATES)
            .obj()
            .one(&id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn active_template(
        &self,
        plan_type: PlanType,
    ) -> Result<Option<PromptTemplate>, AppError> {
        let templates: Vec<PromptTemplate> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::PROMPT_TEMPLATES)
            .filter(|q| {
                q.for_all([
                    q.field("template_type").eq(plan_type.as_str()),
                    q.field("active").eq(true),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(select_active(&templates, plan_type).cloned())
    }

    async fn upsert_template(&self, template: &PromptTemplate) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PROMPT_TEMPLATES)
            .document_id(template.id.to_string())
            .object(template)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Progress Tracking ───────────────────────────────────────

    async fn get_daily_tracking(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<DailyTracking>, AppError> {
        self.get_by_id(collections::DAILY_TRACKING, &day_key(user_id, date))
            .await
    }

    async fn upsert_daily_tracking(&self, entry: &DailyTracking) -> Result<(), AppError> {
        self.put(collections::DAILY_TRACKING, &entry.id, entry).await
    }

    async fn daily_tracking_between(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyTracking>, AppError> {
        let mut entries: Vec<DailyTracking> = self
            .dated_between(collections::DAILY_TRACKING, user_id, start, end)
            .await?;
        entries.sort_by_key(|e| e.fields.date);
        Ok(entries)
    }

    async fn get_body_measurement(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<BodyMeasurement>, AppError> {
        self.get_by_id(collections::BODY_MEASUREMENTS, &day_key(user_id, date))
            .await
    }

    async fn upsert_body_measurement(&self, measurement: &BodyMeasurement) -> Result<(), AppError> {
        self.put(collections::BODY_MEASUREMENTS, &measurement.id, measurement)
            .await
    }

    async fn body_measurements_between(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BodyMeasurement>, AppError> {
        let mut measurements: Vec<BodyMeasurement> = self
            .dated_between(collections::BODY_MEASUREMENTS, user_id, start, end)
            .await?;
        measurements.sort_by_key(|m| m.fields.date);
        Ok(measurements)
    }

    async fn insert_workout_entry(&self, entry: &WorkoutEntry) -> Result<(), AppError> {
        self.put(collections::WORKOUT_HISTORY, &entry.id.to_string(), entry)
            .await
    }

    async fn workout_entries_between(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WorkoutEntry>, AppError> {
        let mut entries: Vec<WorkoutEntry> = self
            .dated_between(collections::WORKOUT_HISTORY, user_id, start, end)
            .await?;
        oldest_workouts_first(&mut entries);
        Ok(entries)
    }

    // ─── User Data Deletion ──────────────────────────────────────

    /// Delete all profiles, plans and tracking records for a user.
    ///
    /// Plans reused by other users through similarity matching go too; they
    /// were generated from this user's data.
    async fn delete_user_data(&self, user_id: u64) -> Result<usize, AppError> {
        let plan_ids: Vec<String> = self
            .plans_for_user(user_id)
            .await?
            .iter()
            .map(|p| p.id.to_string())
            .collect();
        self.batch_delete(&plan_ids, collections::PLANS).await?;
        tracing::debug!(user_id, count = plan_ids.len(), "Deleted plans");

        let profile_ids: Vec<String> = self
            .profiles_for_user(user_id)
            .await?
            .iter()
            .map(|p| p.id.to_string())
            .collect();
        self.batch_delete(&profile_ids, collections::PROFILES)
            .await?;
        tracing::debug!(user_id, count = profile_ids.len(), "Deleted profiles");

        let mut deleted_count = plan_ids.len() + profile_ids.len();
        for collection in [
            collections::DAILY_TRACKING,
            collections::BODY_MEASUREMENTS,
            collections::WORKOUT_HISTORY,
        ] {
            let ids = self.owned_ids(collection, user_id).await?;
            self.batch_delete(&ids, collection).await?;
            tracing::debug!(user_id, collection, count = ids.len(), "Deleted tracking records");
            deleted_count += ids.len();
        }

        tracing::info!(user_id, deleted_count, "User data deletion complete");

        Ok(deleted_count)
    }
}
