// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Prompt template administration.
//!
//! Templates are never deleted. A new version is added and older ones are
//! deactivated.

use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{PlanType, PromptTemplate};
use crate::services::prompt;

/// Body of a template creation request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    pub template_type: PlanType,
    pub body: String,
    /// Defaults to one past the highest existing version for `name`.
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

pub struct TemplateService {
    db: Arc<dyn Store>,
}

impl TemplateService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<PromptTemplate>> {
        self.db.list_templates().await
    }

    pub async fn create(&self, new: NewTemplate) -> Result<PromptTemplate> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("template name is required".to_string()));
        }
        prompt::validate_body(&new.body).map_err(|e| AppError::BadRequest(e.to_string()))?;

        let existing: Vec<PromptTemplate> = self
            .db
            .list_templates()
            .await?
            .into_iter()
            .filter(|t| t.name == name)
            .collect();

        if let Some(other) = existing.iter().find(|t| t.template_type != new.template_type) {
            return Err(AppError::BadRequest(format!(
                "template {} already exists for {}",
                name, other.template_type
            )));
        }

        let next_version = existing.iter().map(|t| t.version).max().unwrap_or(0) + 1;
        let version = new.version.unwrap_or(next_version);
        if existing.iter().any(|t| t.version == version) {
            return Err(AppError::BadRequest(format!(
                "template {} version {} already exists",
                name, version
            )));
        }

        let now = Utc::now();
        let template = PromptTemplate {
            id: Uuid::new_v4(),
            name,
            template_type: new.template_type,
            body: new.body,
            version,
            active: new.active,
            created_at: now,
            updated_at: now,
        };
        self.db.upsert_template(&template).await?;

        tracing::info!(
            template_id = %template.id,
            name = %template.name,
            version = template.version,
            template_type = %template.template_type,
            "Prompt template created"
        );
        Ok(template)
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<PromptTemplate> {
        let mut template = self
            .db
            .get_template(id)
            .await?
            .ok_or_else(|| AppError::TemplateNotFound(id.to_string()))?;

        if template.active {
            template.active = false;
            template.updated_at = Utc::now();
            self.db.upsert_template(&template).await?;
            tracing::info!(template_id = %id, name = %template.name, "Prompt template deactivated");
        }
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;

    const BODY: &str = r#"{"system_prompt": "s", "user_context": {"age": "{{age}}"}}"#;

    fn new_template(name: &str, version: Option<u32>) -> NewTemplate {
        NewTemplate {
            name: name.to_string(),
            template_type: PlanType::MealPlan,
            body: BODY.to_string(),
            version,
            active: true,
        }
    }

    #[tokio::test]
    async fn test_versions_increment_and_newest_wins() {
        let db = Arc::new(MemoryDb::new());
        let service = TemplateService::new(db.clone());

        let v1 = service.create(new_template("meal", None)).await.unwrap();
        let v2 = service.create(new_template("meal", None)).await.unwrap();
        assert_eq!((v1.version, v2.version), (1, 2));

        let active = db.active_template(PlanType::MealPlan).await.unwrap().unwrap();
        assert_eq!(active.id, v2.id);

        service.deactivate(v2.id).await.unwrap();
        let active = db.active_template(PlanType::MealPlan).await.unwrap().unwrap();
        assert_eq!(active.id, v1.id);
    }

    #[tokio::test]
    async fn test_rejects_duplicates_and_bad_bodies() {
        let service = TemplateService::new(Arc::new(MemoryDb::new()));
        service.create(new_template("meal", Some(3))).await.unwrap();

        let err = service.create(new_template("meal", Some(3))).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let mut bad = new_template("other", None);
        bad.body = "not json".to_string();
        let err = service.create(bad).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_deactivate_unknown_template_is_not_found() {
        let service = TemplateService::new(Arc::new(MemoryDb::new()));
        let err = service.deactivate(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::TemplateNotFound(_)));
    }
}
