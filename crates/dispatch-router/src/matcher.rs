//! The keyword matcher.
//!
//! Always available, fully deterministic. Each agent declares a keyword
//! fingerprint; the matcher scores an agent by the share of recognised
//! keywords in the request that belong to that agent:
//!
//! ```text
//! score(agent) = |request ∩ agent.keywords| / |request ∩ all keywords|
//! ```
//!
//! Scores are therefore in `[0, 1]` by construction. Ties break toward
//! the lexicographically smaller agent id so the outcome is stable across
//! runs and registries with equal fingerprints.

use std::collections::HashSet;

use dispatch_agents::AgentRegistry;

/// A matcher verdict: the best agent, if any, and its score.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentMatch {
    /// Best-scoring agent id; `None` when no keyword was recognised.
    pub agent: Option<String>,
    /// Score in `[0, 1]`; `0.0` when no keyword was recognised.
    pub confidence: f64,
}

impl AgentMatch {
    /// The empty verdict.
    #[must_use]
    pub fn none() -> Self {
        Self {
            agent: None,
            confidence: 0.0,
        }
    }
}

/// Keyword-fingerprint matcher over a registry.
#[derive(Debug, Clone, Copy)]
pub struct KeywordMatcher<'a> {
    registry: &'a AgentRegistry,
}

impl<'a> KeywordMatcher<'a> {
    /// Default confidence threshold for direct routing.
    pub const DEFAULT_THRESHOLD: f64 = 0.8;

    /// A matcher over `registry`.
    #[must_use]
    pub fn new(registry: &'a AgentRegistry) -> Self {
        Self { registry }
    }

    /// Score the request against every agent; best match wins, ties break
    /// by agent id.
    #[must_use]
    pub fn match_request(&self, request: &str) -> AgentMatch {
        let lower = request.to_lowercase();
        let tokens: HashSet<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        // The denominator: every registry keyword the request mentions.
        let mut recognised: HashSet<String> = HashSet::new();
        for agent in self.registry.list() {
            for keyword in agent.keywords_lower() {
                if keyword_present(&lower, &tokens, &keyword) {
                    recognised.insert(keyword);
                }
            }
        }
        if recognised.is_empty() {
            return AgentMatch::none();
        }

        let mut best = AgentMatch::none();
        // Registry iteration is id-ordered, and only a strictly better
        // score replaces the incumbent, which is the lexicographic tiebreak.
        for agent in self.registry.list() {
            let matched = agent
                .keywords_lower()
                .into_iter()
                .filter(|k| recognised.contains(k))
                .collect::<HashSet<_>>()
                .len();
            if matched == 0 {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let score = matched as f64 / recognised.len() as f64;
            if score > best.confidence {
                best = AgentMatch {
                    agent: Some(agent.id.clone()),
                    confidence: score,
                };
            }
        }
        best
    }
}

/// Single-word keywords match as request tokens; phrases match as
/// substrings of the lowercased text.
fn keyword_present(lower: &str, tokens: &HashSet<&str>, keyword: &str) -> bool {
    if keyword.contains(' ') {
        lower.contains(keyword)
    } else {
        tokens.contains(keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_agents::{AgentDefinition, ModelTier};

    fn agent(id: &str, tier: ModelTier, keywords: &[&str]) -> AgentDefinition {
        AgentDefinition {
            id: id.to_string(),
            model_tier: tier,
            description: String::new(),
            keywords: keywords.iter().map(ToString::to_string).collect(),
        }
    }

    fn registry() -> AgentRegistry {
        AgentRegistry::from_agents([
            agent(
                "haiku-general",
                ModelTier::Haiku,
                &["typo", "fix", "whitespace", "readme"],
            ),
            agent(
                "sonnet-general",
                ModelTier::Sonnet,
                &["refactor", "test", "debug", "fix"],
            ),
        ])
    }

    #[test]
    fn test_full_overlap_scores_one() {
        let registry = registry();
        let matcher = KeywordMatcher::new(&registry);
        let m = matcher.match_request("Fix typo in README.md: change 'teh' to 'the'");
        assert_eq!(m.agent.as_deref(), Some("haiku-general"));
        assert!(m.confidence >= KeywordMatcher::DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_no_keywords_no_match() {
        let registry = registry();
        let matcher = KeywordMatcher::new(&registry);
        let m = matcher.match_request("reticulate the splines");
        assert_eq!(m, AgentMatch::none());
    }

    #[test]
    fn test_split_vocabulary_lowers_confidence() {
        let registry = registry();
        let matcher = KeywordMatcher::new(&registry);
        // "fix" is shared, "debug" belongs to sonnet-general only.
        let m = matcher.match_request("fix and debug this");
        assert_eq!(m.agent.as_deref(), Some("sonnet-general"));
        assert!((m.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tie_breaks_lexicographically() {
        let reg = AgentRegistry::from_agents([
            agent("beta", ModelTier::Sonnet, &["fix"]),
            agent("alpha", ModelTier::Haiku, &["fix"]),
        ]);
        let matcher = KeywordMatcher::new(&reg);
        let m = matcher.match_request("fix it");
        assert_eq!(m.agent.as_deref(), Some("alpha"));
    }

    #[test]
    fn test_partial_overlap() {
        let registry = registry();
        let matcher = KeywordMatcher::new(&registry);
        // Recognised: typo (haiku), debug (sonnet) — each agent gets 1/2.
        let m = matcher.match_request("typo debug");
        assert_eq!(m.agent.as_deref(), Some("haiku-general"));
        assert!((m.confidence - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_registry() {
        let reg = AgentRegistry::default();
        let matcher = KeywordMatcher::new(&reg);
        assert_eq!(matcher.match_request("fix typo"), AgentMatch::none());
    }
}
