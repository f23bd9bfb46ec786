//! Derivation Matcher - decides which tier a rule satisfies for a request
//!
//! Tiers are fixed and ordered:
//! - Perfect: the context's key set equals the rule's required keys
//! - Partial: the rule's required keys are a subset of the context's keys
//! - Identity: the rule has no requirement at all
//!
//! There is no scoring: a perfect match always beats a partial one, however
//! many keys the partial rule covers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::Context;

use super::Derivation;

/// Match tier, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Perfect,
    Partial,
    Identity,
}

impl MatchTier {
    /// Tiers in the order they are tried
    pub const ORDER: [MatchTier; 3] = [MatchTier::Perfect, MatchTier::Partial, MatchTier::Identity];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Perfect => "perfect",
            MatchTier::Partial => "partial",
            MatchTier::Identity => "identity",
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tier tests for derivations
#[derive(Debug, Default, Clone, Copy)]
pub struct DerivationMatcher;

impl DerivationMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Does `derivation` satisfy `tier` for this request?
    pub fn satisfies(
        &self,
        derivation: &Derivation,
        tier: MatchTier,
        category: &str,
        context: &Context,
    ) -> bool {
        if derivation.category() != category {
            return false;
        }

        match (tier, derivation.required_keys()) {
            (MatchTier::Perfect, Some(required)) => {
                context.len() == required.len() && required.iter().all(|k| context.contains_key(k))
            }
            (MatchTier::Partial, Some(required)) => required.iter().all(|k| context.contains_key(k)),
            (MatchTier::Identity, None) => true,
            _ => false,
        }
    }

    /// Best tier this derivation satisfies, if any
    pub fn best_tier(&self, derivation: &Derivation, category: &str, context: &Context) -> Option<MatchTier> {
        MatchTier::ORDER
            .into_iter()
            .find(|tier| self.satisfies(derivation, *tier, category, context))
    }
}
