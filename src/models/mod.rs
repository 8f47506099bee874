// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod plan;
pub mod profile;
pub mod template;
pub mod tracking;

pub use plan::{Plan, PlanContent, PlanType};
pub use profile::{Gender, GoalType, ProfileFields, ProfileTraits, ProfileUpdate, UserProfile};
pub use template::PromptTemplate;
pub use tracking::{BodyMeasurement, DailyTracking, TrackingSummary, WorkoutEntry};
