// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod ai_gateway;
pub mod anthropic;
pub mod fingerprint;
pub mod llm;
pub mod openai;
pub mod plan;
pub mod profile;
pub mod prompt;
pub mod response_cache;
pub mod similarity;
pub mod template;
pub mod tracking;

pub use ai_gateway::{AiGateway, GenerationOutput, GenerationRequest};
pub use anthropic::AnthropicClient;
pub use llm::{Backend, ChatBackend, CompletionRequest};
pub use openai::OpenAiClient;
pub use plan::{GenerateRequest, GenerationResult, PlanService, PlanSummary};
pub use profile::ProfileService;
pub use response_cache::ResponseCache;
pub use similarity::SimilarityBands;
pub use template::{NewTemplate, TemplateService};
pub use tracking::TrackingService;
