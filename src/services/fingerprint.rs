// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile fingerprinting.
//!
//! A fingerprint is a short content hash over the fields that shape a plan.
//! It keys the exact-match plan cache. Collisions only mean two profiles share
//! a plan, so a truncated digest is sufficient.

use sha2::{Digest, Sha256};

use crate::models::ProfileTraits;

/// Hex characters kept from the digest.
const FINGERPRINT_LEN: usize = 16;

/// Compute the fingerprint for a user's profile traits.
///
/// Height and weight are rounded to one decimal so that float noise from
/// clients does not split the cache.
pub fn compute(user_id: u64, traits: &ProfileTraits) -> String {
    let input = format!(
        "{}:{}:{}:{:.1}:{:.1}:{}",
        user_id,
        traits.gender.as_str(),
        traits.age,
        traits.height_cm,
        traits.weight_kg,
        traits.goal_type.as_str(),
    );

    let digest = Sha256::digest(input.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(FINGERPRINT_LEN);
    encoded
}
