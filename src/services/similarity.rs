// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Similar-profile plan matching.
//!
//! A stored plan can be reused for a profile when the plan was generated for
//! the same gender, goal and plan type, and for numerically close age,
//! weight and height.

use chrono::{DateTime, Utc};

use crate::models::{Plan, PlanType, ProfileTraits};

/// Reused plans never claim to be an exact generation.
const MAX_REUSE_SCORE: f32 = 0.99;

/// Inclusive tolerance bands around the target profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityBands {
    pub age_years: u32,
    pub weight_kg: f32,
    pub height_cm: f32,
}

impl Default for SimilarityBands {
    fn default() -> Self {
        Self {
            age_years: 3,
            weight_kg: 8.0,
            height_cm: 8.0,
        }
    }
}

impl SimilarityBands {
    /// Age window `[min, max]` for coarse storage queries.
    pub fn age_range(&self, age: u32) -> (u32, u32) {
        (age.saturating_sub(self.age_years), age + self.age_years)
    }

    /// Whether a plan generated for `candidate` may be served for `target`.
    pub fn matches(&self, target: &ProfileTraits, candidate: &ProfileTraits) -> bool {
        target.gender == candidate.gender
            && target.goal_type == candidate.goal_type
            && target.age.abs_diff(candidate.age) <= self.age_years
            && (target.weight_kg - candidate.weight_kg).abs() <= self.weight_kg
            && (target.height_cm - candidate.height_cm).abs() <= self.height_cm
    }

    /// Closeness of a matching candidate in `[0.5, 0.99]`.
    ///
    /// Each band contributes its distance normalized by the band width.
    pub fn score(&self, target: &ProfileTraits, candidate: &ProfileTraits) -> f32 {
        let age = target.age.abs_diff(candidate.age) as f32 / self.age_years.max(1) as f32;
        let weight = (target.weight_kg - candidate.weight_kg).abs() / self.weight_kg;
        let height = (target.height_cm - candidate.height_cm).abs() / self.height_cm;
        let mean_distance = ((age + weight + height) / 3.0).clamp(0.0, 1.0);

        (1.0 - 0.5 * mean_distance).min(MAX_REUSE_SCORE)
    }
}

/// A reusable plan together with its match score.
#[derive(Debug, Clone)]
pub struct SimilarPlan {
    pub plan: Plan,
    pub score: f32,
}

/// Filter and rank candidate plans for a target profile.
///
/// Best first: highest score, then most recently generated. Expired plans
/// and plans of another type are dropped.
pub fn rank_candidates(
    target: &ProfileTraits,
    plan_type: PlanType,
    candidates: Vec<Plan>,
    bands: &SimilarityBands,
    now: DateTime<Utc>,
) -> Vec<SimilarPlan> {
    let mut ranked: Vec<SimilarPlan> = candidates
        .into_iter()
        .filter(|p| p.plan_type == plan_type && !p.is_expired(now))
        .filter(|p| bands.matches(target, &p.traits))
        .map(|plan| SimilarPlan {
            score: bands.score(target, &plan.traits),
            plan,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.plan.generated_at.cmp(&a.plan.generated_at))
    });
    ranked
}
