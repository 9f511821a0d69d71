//! Relationship judgment sources
//!
//! The reasoning collaborator sits behind [`JudgmentSource`]. Whether it
//! answers from a cache or a fresh model call is invisible to the engine.

use crate::market::{Market, RelationshipJudgment};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trait for relationship judgment providers
#[async_trait]
pub trait JudgmentSource: Send + Sync {
    /// Judgment for a market pair, `None` if the pair was never judged
    async fn judgment(
        &self,
        market1: &Market,
        market2: &Market,
    ) -> anyhow::Result<Option<RelationshipJudgment>>;
}

/// A judged pair as stored by the reasoning collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgedPair {
    pub market1: String,
    pub market2: String,
    #[serde(flatten)]
    pub judgment: RelationshipJudgment,
}

/// In-memory judgments keyed by market id pair
///
/// Correlation is symmetric, so a pair judged as (a, b) also answers (b, a).
#[derive(Debug, Clone, Default)]
pub struct StaticJudgments {
    judgments: HashMap<(String, String), RelationshipJudgment>,
}

impl StaticJudgments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a judgment, replacing any earlier one for the same pair
    pub fn insert(
        &mut self,
        market1: impl Into<String>,
        market2: impl Into<String>,
        judgment: RelationshipJudgment,
    ) {
        self.judgments
            .insert(key(&market1.into(), &market2.into()), judgment);
    }

    pub fn get(&self, market1: &str, market2: &str) -> Option<&RelationshipJudgment> {
        self.judgments.get(&key(market1, market2))
    }

    pub fn len(&self) -> usize {
        self.judgments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.judgments.is_empty()
    }
}

impl FromIterator<JudgedPair> for StaticJudgments {
    fn from_iter<I: IntoIterator<Item = JudgedPair>>(iter: I) -> Self {
        let mut judgments = Self::new();
        for pair in iter {
            judgments.insert(pair.market1, pair.market2, pair.judgment);
        }
        judgments
    }
}

fn key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

#[async_trait]
impl JudgmentSource for StaticJudgments {
    async fn judgment(
        &self,
        market1: &Market,
        market2: &Market,
    ) -> anyhow::Result<Option<RelationshipJudgment>> {
        Ok(self.get(&market1.id, &market2.id).cloned())
    }
}
