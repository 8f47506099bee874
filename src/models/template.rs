// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Prompt template model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::PlanType;

/// Versioned prompt template stored in the `prompt_templates` collection.
///
/// The body is a JSON document with a `system_prompt` string and a
/// `user_context` object, containing `{{name}}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: Uuid,
    /// Unique per (name, version)
    pub name: String,
    pub template_type: PlanType,
    pub body: String,
    pub version: u32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Pick the template a generation request should use: the highest version
/// among active templates of the given type.
pub fn select_active<'a, I>(templates: I, template_type: PlanType) -> Option<&'a PromptTemplate>
where
    I: IntoIterator<Item = &'a PromptTemplate>,
{
    templates
        .into_iter()
        .filter(|t| t.active && t.template_type == template_type)
        .max_by_key(|t| t.version)
}
