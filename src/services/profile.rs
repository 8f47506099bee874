// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile management.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{ProfileFields, ProfileUpdate, UserProfile};

pub struct ProfileService {
    db: Arc<dyn Store>,
}

impl ProfileService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    pub async fn create(&self, user_id: u64, fields: ProfileFields) -> Result<UserProfile> {
        fields.validate().map_err(AppError::BadRequest)?;

        let profile = UserProfile::new(user_id, fields, Utc::now());
        self.db.upsert_profile(&profile).await?;

        tracing::info!(user_id, profile_id = %profile.id, "Profile created");
        Ok(profile)
    }

    /// The user's most recently updated profile.
    pub async fn current(&self, user_id: u64) -> Result<UserProfile> {
        self.db
            .profiles_for_user(user_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::ProfileNotFound(format!("no profile for user {}", user_id)))
    }

    /// A profile by ID. Profiles of other users are reported as not found.
    pub async fn get(&self, user_id: u64, profile_id: Uuid) -> Result<UserProfile> {
        match self.db.get_profile(profile_id).await? {
            Some(profile) if profile.user_id == user_id => Ok(profile),
            _ => Err(AppError::ProfileNotFound(profile_id.to_string())),
        }
    }

    pub async fn update_current(&self, user_id: u64, update: ProfileUpdate) -> Result<UserProfile> {
        let mut profile = self.current(user_id).await?;
        let previous = profile.fingerprint.clone();

        profile.apply_update(update, Utc::now());
        profile.fields.validate().map_err(AppError::BadRequest)?;
        self.db.upsert_profile(&profile).await?;

        if profile.fingerprint != previous {
            tracing::info!(
                user_id,
                profile_id = %profile.id,
                "Profile fingerprint changed; cached plans no longer apply"
            );
        }
        Ok(profile)
    }

    /// Delete the user's profiles and plans.
    pub async fn delete_account(&self, user_id: u64) -> Result<usize> {
        let deleted = self.db.delete_user_data(user_id).await?;
        tracing::info!(user_id, deleted, "Account data deleted");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::models::profile::test_support::sample_fields;

    fn service() -> ProfileService {
        ProfileService::new(Arc::new(MemoryDb::new()))
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_fields() {
        let mut fields = sample_fields();
        fields.age = 0;

        let err = service().create(1, fields).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_other_users_profiles_are_hidden() {
        let service = service();
        let profile = service.create(1, sample_fields()).await.unwrap();

        assert_eq!(service.get(1, profile.id).await.unwrap().id, profile.id);
        assert!(matches!(
            service.get(2, profile.id).await.unwrap_err(),
            AppError::ProfileNotFound(_)
        ));
        assert!(matches!(
            service.current(2).await.unwrap_err(),
            AppError::ProfileNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_update_recomputes_fingerprint() {
        let service = service();
        let created = service.create(1, sample_fields()).await.unwrap();

        let unchanged = service
            .update_current(
                1,
                ProfileUpdate {
                    location_culture: Some("FRANCE".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(unchanged.fingerprint, created.fingerprint);

        let changed = service
            .update_current(
                1,
                ProfileUpdate {
                    current_weight_kg: Some(82.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_ne!(changed.fingerprint, created.fingerprint);
        assert_eq!(changed.id, created.id);
    }
}
