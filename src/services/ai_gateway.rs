// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AI generation gateway.
//!
//! Renders the active prompt template for a plan type, calls the preferred
//! LLM backend and falls back to the other one exactly once. A response only
//! counts as a success once it parses into content of the requested plan
//! type; successes are kept in a bounded [`ResponseCache`].

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{PlanContent, PlanType};
use crate::services::anthropic::AnthropicClient;
use crate::services::llm::{parse_structured_response, Backend, ChatBackend, CompletionRequest};
use crate::services::openai::OpenAiClient;
use crate::services::prompt::{self, PromptParams};
use crate::services::response_cache::ResponseCache;

/// One generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub plan_type: PlanType,
    pub params: PromptParams,
    pub max_tokens: u32,
    pub temperature: f32,
    /// First backend to try; defaults to OpenAI.
    pub preferred: Option<Backend>,
    /// Skip the response cache lookup (the result is still cached).
    pub bypass_cache: bool,
}

/// Parsed output of a successful generation.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub content: PlanContent,
    /// Backend that actually served the request.
    pub backend: Backend,
    pub model: String,
    pub elapsed_ms: u64,
    pub cache_key: String,
    pub from_cache: bool,
}

impl GenerationOutput {
    /// Label recorded on plans, e.g. `openai:gpt-4o-mini`.
    pub fn model_label(&self) -> String {
        format!("{}:{}", self.backend, self.model)
    }
}

#[derive(Serialize)]
struct CacheKeyInput<'a> {
    template_type: PlanType,
    parameters: &'a PromptParams,
    max_tokens: u32,
    temperature: f32,
}

/// Reproducibility key for a request: hex SHA-256 of its canonical JSON.
///
/// Parameters are a `BTreeMap`, so key order is stable.
pub fn cache_key(request: &GenerationRequest) -> String {
    let input = CacheKeyInput {
        template_type: request.plan_type,
        parameters: &request.params,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
    };
    let canonical = serde_json::to_vec(&input).unwrap_or_default();
    hex::encode(Sha256::digest(&canonical))
}

pub struct AiGateway {
    db: Arc<dyn Store>,
    openai: Arc<dyn ChatBackend>,
    anthropic: Arc<dyn ChatBackend>,
    cache: ResponseCache,
}

impl AiGateway {
    pub fn new(
        db: Arc<dyn Store>,
        openai: Arc<dyn ChatBackend>,
        anthropic: Arc<dyn ChatBackend>,
        cache: ResponseCache,
    ) -> Self {
        Self {
            db,
            openai,
            anthropic,
            cache,
        }
    }

    /// Build a gateway with real HTTP clients.
    pub fn from_config(config: &Config, db: Arc<dyn Store>) -> Result<Self> {
        let openai = OpenAiClient::new(&config.openai, config.ai_timeout)?;
        let anthropic = AnthropicClient::new(&config.anthropic, config.ai_timeout)?;
        Ok(Self::new(
            db,
            Arc::new(openai),
            Arc::new(anthropic),
            ResponseCache::new(config.ai_cache.clone()),
        ))
    }

    fn client(&self, backend: Backend) -> &Arc<dyn ChatBackend> {
        match backend {
            Backend::OpenAi => &self.openai,
            Backend::Anthropic => &self.anthropic,
        }
    }

    /// Drop all cached responses. Called when templates change.
    pub fn invalidate_cache(&self) {
        self.cache.clear();
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutput> {
        let key = cache_key(request);

        if !request.bypass_cache {
            if let Some(hit) = self.cache.get(&key) {
                tracing::debug!(plan_type = %request.plan_type, cache_key = %key, "AI response cache hit");
                return Ok(hit);
            }
        }

        let template = self
            .db
            .active_template(request.plan_type)
            .await?
            .ok_or_else(|| AppError::NoTemplateFound(request.plan_type.to_string()))?;

        let rendered = prompt::render(&template.body, &request.params)?;
        let completion = CompletionRequest {
            system: rendered.system,
            user: rendered.user,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let primary = request.preferred.unwrap_or_default();
        let output = match self.attempt(primary, request.plan_type, &completion, &key).await {
            Ok(output) => output,
            Err(first) if first.is_backend_failure() => {
                let fallback = primary.other();
                tracing::warn!(
                    primary = %primary,
                    fallback = %fallback,
                    error = %first,
                    "AI backend failed, trying fallback"
                );

                self.attempt(fallback, request.plan_type, &completion, &key)
                    .await
                    .map_err(|second| {
                        tracing::error!(
                            primary_error = %first,
                            fallback_error = %second,
                            "All AI backends failed"
                        );
                        AppError::AiGenerationFailed(format!(
                            "{}: {}; {}: {}",
                            primary, first, fallback, second
                        ))
                    })?
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            plan_type = %request.plan_type,
            template_version = template.version,
            backend = %output.backend,
            elapsed_ms = output.elapsed_ms,
            "AI generation complete"
        );

        self.cache.insert(key, output.clone());
        Ok(output)
    }

    async fn attempt(
        &self,
        backend: Backend,
        plan_type: PlanType,
        completion: &CompletionRequest,
        key: &str,
    ) -> Result<GenerationOutput> {
        let client = self.client(backend);
        let start = Instant::now();

        let text = client.complete(completion).await?;
        let record = parse_structured_response(&text)?;
        let content = PlanContent::from_record(plan_type, record).map_err(|e| {
            tracing::warn!(backend = %backend, plan_type = %plan_type, error = %e, "AI response does not match plan type");
            AppError::MalformedAiResponse(e)
        })?;

        Ok(GenerationOutput {
            content,
            backend,
            model: client.model().to_string(),
            elapsed_ms: start.elapsed().as_millis() as u64,
            cache_key: key.to_string(),
            from_cache: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(params: &[(&str, &str)]) -> GenerationRequest {
        GenerationRequest {
            plan_type: PlanType::MealPlan,
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), Some(v.to_string())))
                .collect(),
            max_tokens: 4000,
            temperature: 0.7,
            preferred: None,
            bypass_cache: false,
        }
    }

    #[test]
    fn test_cache_key_is_order_independent() {
        let a = request(&[("age", "30"), ("gender", "MALE")]);
        let b = request(&[("gender", "MALE"), ("age", "30")]);
        assert_eq!(cache_key(&a), cache_key(&b));
        assert_eq!(cache_key(&a).len(), 64);
    }

    #[test]
    fn test_cache_key_covers_every_input() {
        let base = request(&[("age", "30")]);
        let key = cache_key(&base);

        let mut other = base.clone();
        other.plan_type = PlanType::WorkoutPlan;
        assert_ne!(cache_key(&other), key);

        let mut other = base.clone();
        other.max_tokens = 2000;
        assert_ne!(cache_key(&other), key);

        let mut other = base.clone();
        other.temperature = 0.2;
        assert_ne!(cache_key(&other), key);

        let other = request(&[("age", "31")]);
        assert_ne!(cache_key(&other), key);
    }

    #[test]
    fn test_preference_does_not_change_key() {
        let base = request(&[("age", "30")]);
        let mut other = base.clone();
        other.preferred = Some(Backend::Anthropic);
        other.bypass_cache = true;
        assert_eq!(cache_key(&base), cache_key(&other));
    }
}
