//! Content Publishing
//!
//! Actions such as writing a blog post or filming a video ask for a content
//! artifact. The engine only needs a path back; publication itself lives
//! outside the simulation.

use std::collections::BTreeMap;

/// Accepts generated text keyed by agent and content type.
pub trait ContentPublisher {
    /// Returns the path or URL the artifact will be reachable at.
    fn publish(&mut self, agent_id: &str, content_type: &str, body: &str) -> String;
}

/// Hands out stable placeholder paths without writing anything.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderPublisher {
    counts: BTreeMap<(String, String), u64>,
}

impl PlaceholderPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of artifacts published for an agent across all types
    pub fn published_by(&self, agent_id: &str) -> u64 {
        self.counts
            .iter()
            .filter(|((agent, _), _)| agent == agent_id)
            .map(|(_, n)| *n)
            .sum()
    }
}

impl ContentPublisher for PlaceholderPublisher {
    fn publish(&mut self, agent_id: &str, content_type: &str, body: &str) -> String {
        let count = self
            .counts
            .entry((agent_id.to_string(), content_type.to_string()))
            .or_insert(0);
        *count += 1;
        tracing::debug!(
            "Content queued for {} ({}, {} bytes)",
            agent_id,
            content_type,
            body.len()
        );
        format!("content/{}/{}_{:04}.md", agent_id, content_type, count)
    }
}

/// Content type implied by an action string.
pub fn content_type_for(action: &str) -> &'static str {
    let lowered = action.to_lowercase();
    if lowered.contains("blog") {
        "blog"
    } else if lowered.contains("film") || lowered.contains("vlog") || lowered.contains("video") {
        "video"
    } else {
        "post"
    }
}
