// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bounded in-process cache of parsed AI responses.

use dashmap::DashMap;
use std::time::Instant;

use crate::config::AiCacheConfig;
use crate::services::ai_gateway::GenerationOutput;

/// Responses keyed by request cache key, with TTL and a size cap.
pub struct ResponseCache {
    entries: DashMap<String, (GenerationOutput, Instant)>,
    config: AiCacheConfig,
}

impl ResponseCache {
    pub fn new(config: AiCacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    /// Fresh cached output for `key`, marked `from_cache`.
    pub fn get(&self, key: &str) -> Option<GenerationOutput> {
        if !self.config.enabled {
            return None;
        }

        let hit = {
            let entry = self.entries.get(key)?;
            let (output, inserted_at) = entry.value();
            if inserted_at.elapsed() < self.config.ttl {
                Some(output.clone())
            } else {
                None
            }
        };

        match hit {
            Some(mut output) => {
                output.from_cache = true;
                Some(output)
            }
            None => {
                self.entries.remove(key);
                None
            }
        }
    }

    pub fn insert(&self, key: String, output: GenerationOutput) {
        if !self.config.enabled || self.config.max_entries == 0 {
            return;
        }

        if !self.entries.contains_key(&key) && self.entries.len() >= self.config.max_entries {
            self.evict();
        }
        self.entries.insert(key, (output, Instant::now()));
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop expired entries, then the oldest one if still full.
    fn evict(&self) {
        let ttl = self.config.ttl;
        self.entries
            .retain(|_, (_, inserted_at)| inserted_at.elapsed() < ttl);

        if self.entries.len() < self.config.max_entries {
            return;
        }

        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().1)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}
