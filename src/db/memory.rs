// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store for local development and tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use uuid::Uuid;

use crate::db::{newest_plans_first, newest_profiles_first, oldest_workouts_first, Store};
use crate::error::Result;
use crate::models::template::select_active;
use crate::models::tracking::day_key;
use crate::models::{
    BodyMeasurement, DailyTracking, Plan, PlanType, ProfileTraits, PromptTemplate, UserProfile,
    WorkoutEntry,
};
use crate::services::similarity::SimilarityBands;

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryDb {
    profiles: DashMap<Uuid, UserProfile>,
    plans: DashMap<Uuid, Plan>,
    templates: DashMap<Uuid, PromptTemplate>,
    daily_tracking: DashMap<String, DailyTracking>,
    measurements: DashMap<String, BodyMeasurement>,
    workouts: DashMap<Uuid, WorkoutEntry>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan_count(&self) -> usize {
        self.plans.len()
    }

    fn collect_plans(&self, keep: impl Fn(&Plan) -> bool) -> Vec<Plan> {
        let mut plans: Vec<Plan> = self
            .plans
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        newest_plans_first(&mut plans);
        plans
    }
}

/// Remove every entry owned by `user_id` and count what went.
fn remove_owned<K, V>(map: &DashMap<K, V>, user_id: u64, owner: impl Fn(&V) -> u64) -> usize
where
    K: Eq + std::hash::Hash,
{
    let mut removed = 0;
    map.retain(|_, value| {
        let keep = owner(value) != user_id;
        if !keep {
            removed += 1;
        }
        keep
    });
    removed
}

#[async_trait]
impl Store for MemoryDb {
    async fn get_profile(&self, id: Uuid) -> Result<Option<UserProfile>> {
        Ok(self.profiles.get(&id).map(|p| p.value().clone()))
    }

    async fn profiles_for_user(&self, user_id: u64) -> Result<Vec<UserProfile>> {
        let mut profiles: Vec<UserProfile> = self
            .profiles
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        newest_profiles_first(&mut profiles);
        Ok(profiles)
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        self.profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn get_plan(&self, id: Uuid) -> Result<Option<Plan>> {
        Ok(self.plans.get(&id).map(|p| p.value().clone()))
    }

    async fn plans_for_fingerprint(
        &self,
        fingerprint: &str,
        plan_type: PlanType,
    ) -> Result<Vec<Plan>> {
        Ok(self.collect_plans(|p| p.fingerprint == fingerprint && p.plan_type == plan_type))
    }

    async fn plans_for_user(&self, user_id: u64) -> Result<Vec<Plan>> {
        Ok(self.collect_plans(|p| p.user_id == user_id))
    }

    async fn similar_plan_candidates(
        &self,
        traits: &ProfileTraits,
        plan_type: PlanType,
        bands: &SimilarityBands,
    ) -> Result<Vec<Plan>> {
        let (min_age, max_age) = bands.age_range(traits.age);
        Ok(self.collect_plans(|p| {
            p.plan_type == plan_type
                && p.traits.gender == traits.gender
                && p.traits.goal_type == traits.goal_type
                && (min_age..=max_age).contains(&p.traits.age)
        }))
    }

    async fn insert_plan(&self, plan: &Plan) -> Result<()> {
        self.plans.insert(plan.id, plan.clone());
        Ok(())
    }

    async fn delete_plan(&self, id: Uuid) -> Result<bool> {
        Ok(self.plans.remove(&id).is_some())
    }

    async fn list_templates(&self) -> Result<Vec<PromptTemplate>> {
        let mut templates: Vec<PromptTemplate> = self
            .templates
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name).then(b.version.cmp(&a.version)));
        Ok(templates)
    }

    async fn get_template(&self, id: Uuid) -> Result<Option<PromptTemplate>> {
        Ok(self.templates.get(&id).map(|t| t.value().clone()))
    }

    async fn active_template(&self, plan_type: PlanType) -> Result<Option<PromptTemplate>> {
        let templates: Vec<PromptTemplate> = self
            .templates
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        Ok(select_active(&templates, plan_type).cloned())
    }

    async fn upsert_template(&self, template: &PromptTemplate) -> Result<()> {
        self.templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn get_daily_tracking(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<DailyTracking>> {
        Ok(self
            .daily_tracking
            .get(&day_key(user_id, date))
            .map(|e| e.value().clone()))
    }

    async fn upsert_daily_tracking(&self, entry: &DailyTracking) -> Result<()> {
        self.daily_tracking.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn daily_tracking_between(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyTracking>> {
        let mut entries: Vec<DailyTracking> = self
            .daily_tracking
            .iter()
            .filter(|e| e.user_id == user_id && (start..=end).contains(&e.fields.date))
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by_key(|e| e.fields.date);
        Ok(entries)
    }

    async fn get_body_measurement(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<BodyMeasurement>> {
        Ok(self
            .measurements
            .get(&day_key(user_id, date))
            .map(|m| m.value().clone()))
    }

    async fn upsert_body_measurement(&self, measurement: &BodyMeasurement) -> Result<()> {
        self.measurements
            .insert(measurement.id.clone(), measurement.clone());
        Ok(())
    }

    async fn body_measurements_between(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BodyMeasurement>> {
        let mut measurements: Vec<BodyMeasurement> = self
            .measurements
            .iter()
            .filter(|m| m.user_id == user_id && (start..=end).contains(&m.fields.date))
            .map(|m| m.value().clone())
            .collect();
        measurements.sort_by_key(|m| m.fields.date);
        Ok(measurements)
    }

    async fn insert_workout_entry(&self, entry: &WorkoutEntry) -> Result<()> {
        self.workouts.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn workout_entries_between(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WorkoutEntry>> {
        let mut entries: Vec<WorkoutEntry> = self
            .workouts
            .iter()
            .filter(|w| w.user_id == user_id && (start..=end).contains(&w.date))
            .map(|w| w.value().clone())
            .collect();
        oldest_workouts_first(&mut entries);
        Ok(entries)
    }

    async fn delete_user_data(&self, user_id: u64) -> Result<usize> {
        let deleted_count = remove_owned(&self.plans, user_id, |p| p.user_id)
            + remove_owned(&self.profiles, user_id, |p| p.user_id)
            + remove_owned(&self.daily_tracking, user_id, |e| e.user_id)
            + remove_owned(&self.measurements, user_id, |m| m.user_id)
            + remove_owned(&self.workouts, user_id, |w| w.user_id);

        tracing::info!(user_id, deleted_count, "User data deletion complete");
        Ok(deleted_count)
    }
}
