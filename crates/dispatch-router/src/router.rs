//! The routing pipeline.

use std::path::PathBuf;

use dispatch_agents::AgentRegistry;
use dispatch_core::{ForceMode, RouterConfig, request_hash};
use tracing::{debug, warn};

use crate::cache::RouteCache;
use crate::decision::RoutingDecision;
use crate::error::{RouterError, RouterResult};
use crate::matcher::{AgentMatch, KeywordMatcher};
use crate::semantic::SemanticMatcher;
use crate::triggers;

/// Maximum accepted request length in bytes, after stripping.
pub const MAX_REQUEST_LEN: usize = 10_000;

/// Confidence recorded for the explicit-path threshold bypass.
const EXPLICIT_PATH_CONFIDENCE: f64 = 0.75;

/// The routing decision engine.
///
/// Pure with respect to its inputs: the same request against the same
/// registry and configuration yields the same decision. The optional
/// semantic matcher is the one admitted source of non-determinism, and
/// any failure in it falls back to the keyword matcher with the cause
/// recorded in the decision reason.
#[derive(Debug)]
pub struct Router {
    registry: AgentRegistry,
    config: RouterConfig,
    semantic: Option<SemanticMatcher>,
    cache: Option<RouteCache>,
}

impl Router {
    /// A router over `registry` with `config`, keyword matcher only.
    #[must_use]
    pub fn new(registry: AgentRegistry, config: RouterConfig) -> Self {
        Self {
            registry,
            config,
            semantic: None,
            cache: None,
        }
    }

    /// Resolve the semantic stage from `force_mode` and the environment:
    /// `single_stage` never runs it, `multi_stage` and the
    /// `ROUTER_USE_LLM` command line enable it.
    #[must_use]
    pub fn with_semantic_from_env(mut self) -> Self {
        self.semantic = match self.config.force_mode {
            Some(ForceMode::SingleStage) => None,
            Some(ForceMode::MultiStage) | None => SemanticMatcher::from_env(),
        };
        if self.config.force_mode == Some(ForceMode::MultiStage) && self.semantic.is_none() {
            warn!("force_mode is multi_stage but no semantic matcher is configured; using keyword matcher");
        }
        self
    }

    /// Use an explicit semantic matcher (useful for testing).
    #[must_use]
    pub fn with_semantic(mut self, matcher: SemanticMatcher) -> Self {
        self.semantic = Some(matcher);
        self
    }

    /// Attach a route cache.
    #[must_use]
    pub fn with_cache(mut self, cache: RouteCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The registry this router consults.
    #[must_use]
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Route a request, never failing: validation errors become
    /// escalations with a diagnostic reason. This is the hook-facing
    /// entry point.
    #[must_use]
    pub fn route(&self, request: &str) -> RoutingDecision {
        match self.route_checked(request) {
            Ok(decision) => decision,
            Err(RouterError::InputInvalid { reason }) => {
                RoutingDecision::escalate(
                    format!("Invalid input: {reason}"),
                    request_hash(request.trim()),
                )
            },
        }
    }

    /// Route a request, propagating input validation failures. This is
    /// the CLI-facing entry point (exit code 2).
    ///
    /// # Errors
    ///
    /// [`RouterError::InputInvalid`] for an empty or oversized request.
    pub fn route_checked(&self, request: &str) -> RouterResult<RoutingDecision> {
        // 1. Validate.
        let request = request.trim();
        if request.is_empty() {
            return Err(RouterError::InputInvalid {
                reason: "request is empty".to_string(),
            });
        }
        if request.len() > MAX_REQUEST_LEN {
            return Err(RouterError::InputInvalid {
                reason: format!(
                    "request is {} bytes, exceeding the {MAX_REQUEST_LEN} byte limit",
                    request.len()
                ),
            });
        }
        let hash = request_hash(request);

        // 2. Mechanical escalation checklist (triggers a-f, h).
        if let Some(reason) = triggers::checklist(request) {
            return Ok(RoutingDecision::escalate(reason, hash));
        }

        // 3. Cache, keyed on the request plus the mtimes of the files it
        //    names. Only meaningful ahead of the semantic stage, but a
        //    keyword hit is not wrong, just cheap.
        let dependencies = self.request_dependencies(request);
        if let Some(cache) = &self.cache {
            if let Some(entry) = cache.lookup(request, &dependencies) {
                if let Ok(decision) = serde_json::from_value::<RoutingDecision>(entry.result) {
                    debug!(hits = entry.hit_count, "serving cached routing decision");
                    return Ok(decision);
                }
            }
        }

        // 4. Agent matcher, semantic first when configured.
        let (matched, threshold, fallback_note) = self.consult_matcher(request);

        let decision = self.decide(request, matched, threshold, fallback_note, &hash);

        if let Some(cache) = &self.cache {
            cache.store(
                request,
                &dependencies,
                decision.agent.clone(),
                serde_json::to_value(&decision).unwrap_or_default(),
            );
        }
        Ok(decision)
    }

    /// Run the configured matcher, falling back from semantic to keyword
    /// on any failure. Returns the match, the applicable threshold, and a
    /// note describing the fallback cause, if one happened.
    fn consult_matcher(&self, request: &str) -> (AgentMatch, f64, Option<String>) {
        let keyword = KeywordMatcher::new(&self.registry);
        let Some(semantic) = &self.semantic else {
            let threshold = self
                .config
                .confidence_threshold
                .unwrap_or(KeywordMatcher::DEFAULT_THRESHOLD);
            return (keyword.match_request(request), threshold, None);
        };

        let semantic_threshold = self
            .config
            .confidence_threshold
            .unwrap_or(SemanticMatcher::DEFAULT_THRESHOLD);
        match semantic.match_request(request) {
            Ok(response) => {
                if let Some(agent) = &response.agent {
                    if !self.registry.contains(agent) {
                        let note = format!("semantic matcher returned unknown agent '{agent}'");
                        warn!("{note}; falling back to keyword matcher");
                        return self.keyword_fallback(request, note);
                    }
                }
                debug!(reason = %response.reason, "semantic matcher answered");
                (
                    AgentMatch {
                        agent: response.agent,
                        confidence: response.confidence,
                    },
                    semantic_threshold,
                    None,
                )
            },
            Err(failure) => {
                let note = failure.to_string();
                warn!("{note}; falling back to keyword matcher");
                self.keyword_fallback(request, note)
            },
        }
    }

    fn keyword_fallback(
        &self,
        request: &str,
        note: String,
    ) -> (AgentMatch, f64, Option<String>) {
        let keyword = KeywordMatcher::new(&self.registry);
        let threshold = self
            .config
            .confidence_threshold
            .unwrap_or(KeywordMatcher::DEFAULT_THRESHOLD);
        (keyword.match_request(request), threshold, Some(note))
    }

    /// Stages 4-5: threshold check, explicit-path exception, trigger g.
    fn decide(
        &self,
        request: &str,
        matched: AgentMatch,
        threshold: f64,
        fallback_note: Option<String>,
        hash: &str,
    ) -> RoutingDecision {
        if let Some(agent) = &matched.agent {
            if matched.confidence >= threshold {
                let reason = match &fallback_note {
                    Some(note) => format!("High-confidence agent match (keyword fallback: {note})"),
                    None => "High-confidence agent match".to_string(),
                };
                return RoutingDecision::direct(agent.clone(), reason, matched.confidence, hash);
            }
        }

        // Exception: an explicitly named file with a syntactically simple
        // operation goes straight to the mechanical tier.
        if triggers::explicit_path_token(request).is_some()
            && triggers::is_syntactically_simple(request)
        {
            if let Some(mechanical) = self.registry.mechanical_agent() {
                return RoutingDecision::direct(
                    mechanical.id.clone(),
                    "Explicit path with simple operation",
                    EXPLICIT_PATH_CONFIDENCE,
                    hash,
                );
            }
        }

        // Trigger g: no match, or not confident enough.
        let reason = match fallback_note {
            Some(note) => format!(
                "Low confidence match ({:.2}) (keyword fallback: {note})",
                matched.confidence
            ),
            None => format!("Low confidence match ({:.2})", matched.confidence),
        };
        RoutingDecision::escalate(reason, hash)
    }

    /// The files a request names, as cache dependencies.
    fn request_dependencies(&self, request: &str) -> Vec<PathBuf> {
        triggers::explicit_path_token(request)
            .into_iter()
            .map(PathBuf::from)
            .collect()
    }
}
