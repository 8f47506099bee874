// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! FitPlan Pro: personalized meal and workout plans
//!
//! This crate provides the backend API that generates plans with an LLM,
//! reuses stored plans for identical or similar profiles, keeps the prompt
//! templates the generation runs on, and records the user's progress.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Store;
use services::{AiGateway, PlanService, ProfileService, TemplateService, TrackingService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Store>,
    pub profile_service: ProfileService,
    pub plan_service: PlanService,
    pub template_service: TemplateService,
    pub tracking_service: TrackingService,
}

impl AppState {
    /// Wire the services over one store and gateway.
    pub fn new(config: Config, db: Arc<dyn Store>, gateway: AiGateway) -> Self {
        Self {
            profile_service: ProfileService::new(db.clone()),
            plan_service: PlanService::new(db.clone(), gateway),
            template_service: TemplateService::new(db.clone()),
            tracking_service: TrackingService::new(db.clone()),
            config,
            db,
        }
    }
}
