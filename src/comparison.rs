//! Comparison of two timelines step by step

use serde::{Deserialize, Serialize};

use crate::hasher::StateHasher;
use crate::state::StateSection;
use crate::timeline::Timeline;
use crate::types::StateHash;

/// Hashes of one report step in both timelines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDifference {
    pub report_step: usize,
    /// `None` when the timeline has no such step
    pub baseline_hash: Option<StateHash>,
    pub comparison_hash: Option<StateHash>,
    /// Sections that differ, empty when either step is missing
    pub changed: Vec<StateSection>,
}

impl StepDifference {
    pub fn hashes_match(&self) -> bool {
        self.baseline_hash.is_some() && self.baseline_hash == self.comparison_hash
    }
}

/// Result of comparing two timelines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineComparison {
    pub step_count_matches: bool,
    pub chain_matches: bool,
    pub steps: Vec<StepDifference>,
}

impl TimelineComparison {
    pub fn are_identical(&self) -> bool {
        self.step_count_matches && self.chain_matches && self.steps.iter().all(StepDifference::hashes_match)
    }

    /// First report step whose states differ
    pub fn first_divergence(&self) -> Option<&StepDifference> {
        self.steps.iter().find(|d| !d.hashes_match())
    }

    pub fn divergent_step_count(&self) -> usize {
        self.steps.iter().filter(|d| !d.hashes_match()).count()
    }

    pub fn summary(&self) -> String {
        if self.are_identical() {
            return "Timelines are identical".to_string();
        }
        let mut parts = Vec::new();
        if !self.step_count_matches {
            parts.push("step counts differ".to_string());
        }
        if let Some(first) = self.first_divergence() {
            parts.push(format!(
                "{} steps diverged, first at report step {}",
                self.divergent_step_count(),
                first.report_step
            ));
        }
        format!("Timelines differ: {}", parts.join(", "))
    }
}

/// Compare two timelines, for example the same deck built twice
#[derive(Debug, Clone, Default)]
pub struct TimelineComparator {
    hasher: StateHasher,
}

impl TimelineComparator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compare(&self, baseline: &Timeline, comparison: &Timeline) -> TimelineComparison {
        let steps = (0..baseline.len().max(comparison.len()))
            .map(|step| {
                let b = baseline.at(step).ok();
                let c = comparison.at(step).ok();
                StepDifference {
                    report_step: step,
                    baseline_hash: b.map(|s| self.hasher.hash(s)),
                    comparison_hash: c.map(|s| self.hasher.hash(s)),
                    changed: match (b, c) {
                        (Some(b), Some(c)) => c.changed_sections(b),
                        _ => Vec::new(),
                    },
                }
            })
            .collect();

        TimelineComparison {
            step_count_matches: baseline.len() == comparison.len(),
            chain_matches: baseline.hash_chain() == comparison.hash_chain(),
            steps,
        }
    }
}
