//! Bounded breadcrumb trail of routing steps.

use std::collections::VecDeque;

use voxroute_models::{AgentId, BreadcrumbEntry, BreadcrumbStep};

/// Default number of breadcrumbs kept.
pub const DEFAULT_BREADCRUMB_CAP: usize = 50;

/// Ordered trail of the steps commands went through, oldest evicted first.
///
/// Purely observational: nothing reads the trail to make routing decisions.
#[derive(Debug, Clone)]
pub struct BreadcrumbTrail {
    entries: VecDeque<BreadcrumbEntry>,
    capacity: usize,
}

impl BreadcrumbTrail {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a step, evicting the oldest entry when full.
    pub fn push(&mut self, step: BreadcrumbStep, agent: Option<&AgentId>, confidence: f32) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries
            .push_back(BreadcrumbEntry::new(step, agent.cloned(), confidence));
    }

    pub fn entries(&self) -> impl Iterator<Item = &BreadcrumbEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&BreadcrumbEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// One-line rendering, e.g. `received → resolved(alden) → dispatched(alden)`.
    pub fn summary(&self) -> String {
        self.entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" → ")
    }
}

impl Default for BreadcrumbTrail {
    fn default() -> Self {
        Self::new(DEFAULT_BREADCRUMB_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_summary() {
        let mut trail = BreadcrumbTrail::default();
        let alden = AgentId::new("alden");
        trail.push(BreadcrumbStep::Received, None, 0.9);
        trail.push(BreadcrumbStep::Resolved, Some(&alden), 0.9);
        trail.push(BreadcrumbStep::Dispatched, Some(&alden), 0.9);

        assert_eq!(trail.len(), 3);
        assert_eq!(trail.latest().map(|e| e.step), Some(BreadcrumbStep::Dispatched));
        assert_eq!(trail.summary(), "received → resolved(alden) → dispatched(alden)");
    }

    #[test]
    fn test_fifo_eviction() {
        let mut trail = BreadcrumbTrail::new(2);
        trail.push(BreadcrumbStep::Received, None, 0.5);
        trail.push(BreadcrumbStep::Resolved, None, 0.5);
        trail.push(BreadcrumbStep::Blocked, None, 0.5);

        let steps: Vec<_> = trail.entries().map(|e| e.step).collect();
        assert_eq!(steps, vec![BreadcrumbStep::Resolved, BreadcrumbStep::Blocked]);
    }

    #[test]
    fn test_clear() {
        let mut trail = BreadcrumbTrail::new(5);
        trail.push(BreadcrumbStep::Received, None, 0.5);
        trail.clear();
        assert!(trail.is_empty());
        assert!(trail.latest().is_none());
        assert_eq!(trail.summary(), "");
    }
}
