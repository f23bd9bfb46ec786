//! Derivation Registry implementation

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::Context;

use super::{Derivation, DerivationMatcher, MatchTier};

/// The winning rule for a request
#[derive(Debug, Clone)]
pub struct Selection {
    /// Tier the rule won at
    pub tier: MatchTier,
    /// Position in registration order
    pub index: usize,
    pub derivation: Arc<Derivation>,
}

/// Append-only store of derivations in registration order
#[derive(Debug, Default)]
pub struct DerivationRegistry {
    /// All derivations, in registration order
    derivations: Vec<Arc<Derivation>>,

    /// Index by category; each list stays in registration order
    by_category: HashMap<String, Vec<usize>>,

    matcher: DerivationMatcher,
}

impl DerivationRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a derivation, returning its registration index
    pub fn register(&mut self, derivation: Derivation) -> usize {
        let idx = self.derivations.len();

        self.by_category
            .entry(derivation.category().to_string())
            .or_default()
            .push(idx);

        tracing::trace!(index = idx, derivation = %derivation, "registered derivation");
        self.derivations.push(Arc::new(derivation));
        idx
    }

    /// Pick the best derivation for `category` under `context`.
    ///
    /// Tiers are tried perfect → partial → identity; within a tier the
    /// earliest registered rule wins.
    pub fn select(&self, category: &str, context: &Context) -> Option<Selection> {
        let candidates = self.by_category.get(category)?;

        for tier in MatchTier::ORDER {
            for &idx in candidates {
                let derivation = &self.derivations[idx];
                if self.matcher.satisfies(derivation, tier, category, context) {
                    return Some(Selection {
                        tier,
                        index: idx,
                        derivation: Arc::clone(derivation),
                    });
                }
            }
        }

        None
    }

    /// Derivations registered for a category, in registration order
    pub fn for_category(&self, category: &str) -> Vec<&Derivation> {
        self.by_category
            .get(category)
            .map(|indices| indices.iter().map(|idx| self.derivations[*idx].as_ref()).collect())
            .unwrap_or_default()
    }

    /// Get all derivations
    pub fn all(&self) -> &[Arc<Derivation>] {
        &self.derivations
    }

    /// Number of registered derivations
    pub fn len(&self) -> usize {
        self.derivations.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.derivations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivation::ContextFn;

    fn winner(registry: &DerivationRegistry, category: &str, ctx: &Context) -> Vec<String> {
        let selection = registry.select(category, ctx).unwrap();
        selection.derivation.invoke(ctx, None).unwrap()
    }

    fn fixed(category: &str, keys: &[&str], items: &[&str]) -> Derivation {
        let items: Vec<String> = items.iter().map(|s| s.to_string()).collect();
        Derivation::new(
            category,
            keys.iter().copied(),
            ContextFn(move |_: &Context| Ok(items.clone())),
        )
    }

    #[test]
    fn test_perfect_beats_partial() {
        let mut registry = DerivationRegistry::new();
        registry.register(fixed("Game", &["a"], &["r1"]));
        registry.register(fixed("Game", &["a", "b"], &["r2"]));

        let ctx = Context::from([("a", "1"), ("b", "2")]);
        let selection = registry.select("Game", &ctx).unwrap();

        assert_eq!(selection.tier, MatchTier::Perfect);
        assert_eq!(selection.index, 1);
        assert_eq!(winner(&registry, "Game", &ctx), vec!["r2"]);
    }

    #[test]
    fn test_partial_beats_identity_regardless_of_order() {
        let mut registry = DerivationRegistry::new();
        registry.register(fixed("Game", &[], &["any"]));
        registry.register(fixed("Game", &["team"], &["by-team"]));

        let ctx = Context::from([("team", "lakers"), ("season", "2019")]);
        let selection = registry.select("Game", &ctx).unwrap();
        assert_eq!(selection.tier, MatchTier::Partial);
        assert_eq!(winner(&registry, "Game", &ctx), vec!["by-team"]);
    }

    #[test]
    fn test_first_registered_wins_within_tier() {
        let mut registry = DerivationRegistry::new();
        registry.register(fixed("Game", &["team"], &["first"]));
        registry.register(fixed("Game", &["season"], &["second"]));
        registry.register(fixed("Game", &["team", "season", "venue"], &["unreachable"]));

        let ctx = Context::from([("team", "lakers"), ("season", "2019"), ("round", "1")]);
        assert_eq!(winner(&registry, "Game", &ctx), vec!["first"]);
    }

    #[test]
    fn test_identity_rule_matches_any_context() {
        let mut registry = DerivationRegistry::new();
        registry.register(fixed("File", &[], &["readme"]));

        assert_eq!(winner(&registry, "File", &Context::new()), vec!["readme"]);
        let ctx = Context::from([("folder", "docs")]);
        assert_eq!(registry.select("File", &ctx).unwrap().tier, MatchTier::Identity);
    }

    #[test]
    fn test_no_matching_rule() {
        let mut registry = DerivationRegistry::new();
        registry.register(fixed("Folder", &["filesystem"], &[]));

        assert!(registry.select("Folder", &Context::new()).is_none());
        assert!(registry.select("Team", &Context::new()).is_none());
    }

    #[test]
    fn test_for_category_keeps_registration_order() {
        let mut registry = DerivationRegistry::new();
        registry.register(fixed("Team", &[], &[]));
        registry.register(fixed("Game", &["team"], &[]));
        registry.register(fixed("Team", &["game"], &[]));

        let rules: Vec<String> = registry.for_category("Team").iter().map(|d| d.to_string()).collect();
        assert_eq!(rules, vec!["Team->*", "Team->game"]);
        assert_eq!(registry.len(), 3);
        assert!(registry.for_category("Player").is_empty());
    }
}
