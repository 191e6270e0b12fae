//! Deference suggestions: advice that another agent suits a request better.

use tracing::debug;
use voxroute_models::{AgentId, DeferenceSuggestion};

use crate::error::Result;
use crate::normalizer::normalize;
use crate::patterns::KeywordPattern;

const BASE_CONFIDENCE: f32 = 0.6;
const CONFIDENCE_STEP: f32 = 0.1;
const MAX_CONFIDENCE: f32 = 0.9;

/// Default domain keywords per local agent.
pub const DEFAULT_DOMAINS: &[(&str, &[&str])] = &[
    ("alden", &["schedule", "today", "calendar", "reminder"]),
    ("alice", &["session review", "analytics"]),
    ("mimic", &["rewrite", "paragraph"]),
    ("sentry", &["security", "kill switch"]),
];

#[derive(Debug, Clone)]
struct Domain {
    agent: AgentId,
    keywords: Vec<KeywordPattern>,
}

/// Scans transcripts for domain keywords owned by another agent.
///
/// Suggestions never change the routing decision; the caller must accept
/// one explicitly.
#[derive(Debug, Clone, Default)]
pub struct DeferenceAdvisor {
    domains: Vec<Domain>,
}

impl DeferenceAdvisor {
    /// Creates an advisor with no domains.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an advisor with the default domain table.
    pub fn with_defaults() -> Result<Self> {
        DEFAULT_DOMAINS
            .iter()
            .try_fold(Self::new(), |advisor, (agent, keywords)| {
                advisor.with_domain(*agent, keywords.iter())
            })
    }

    /// Adds a domain. Declaration order breaks ties between agents.
    pub fn with_domain<I, S>(mut self, agent: impl Into<AgentId>, keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.domains.push(Domain {
            agent: agent.into(),
            keywords: KeywordPattern::compile_all(keywords)?,
        });
        Ok(self)
    }

    /// Suggests a different agent for `transcript`, if its keywords point
    /// away from `resolved`.
    pub fn suggest(&self, transcript: &str, resolved: &AgentId) -> Option<DeferenceSuggestion> {
        let normalized = normalize(transcript);
        if normalized.is_empty() {
            return None;
        }

        let mut best: Option<(&Domain, usize)> = None;
        for domain in &self.domains {
            let hits = domain
                .keywords
                .iter()
                .filter(|k| k.matches(normalized.as_str()))
                .count();
            // Strictly greater keeps the earlier domain on ties
            if hits > 0 && best.map_or(true, |(_, top)| hits > top) {
                best = Some((domain, hits));
            }
        }

        let (domain, hits) = best?;
        if &domain.agent == resolved {
            return None;
        }

        let confidence =
            (BASE_CONFIDENCE + CONFIDENCE_STEP * (hits - 1) as f32).min(MAX_CONFIDENCE);
        debug!(agent = %domain.agent, hits, confidence, "deference suggested");

        Some(DeferenceSuggestion {
            suggested_agent: domain.agent.clone(),
            reason: format!("That's a better question for {}.", domain.agent.display_name()),
            confidence,
        })
    }
}
