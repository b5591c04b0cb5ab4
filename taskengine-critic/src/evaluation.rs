//! The Critic's judgement of progress after one step.

use serde::Deserialize;

/// The Critic's judgement after one step executes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticEvaluation {
    /// Whether execution appears to be converging on the goal.
    pub on_track: bool,
    /// Problems the critic observed, free text.
    #[serde(default)]
    pub issues: Vec<String>,
    /// Suggested remedies, free text.
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// The critic's confidence in this judgement, `0.0..=1.0`.
    pub confidence: f64,
}

impl CriticEvaluation {
    /// The deliberately conservative fallback used when the Critic itself
    /// fails (LLM error or unparseable response): optimistic so an
    /// unreliable critic cannot destabilize otherwise healthy execution.
    pub fn optimistic_fallback() -> Self {
        Self {
            on_track: true,
            issues: Vec::new(),
            suggestions: Vec::new(),
            confidence: 0.5,
        }
    }

    /// Whether this judgement, given `threshold`, warrants generating a
    /// corrective sequence of steps.
    pub fn warrants_correction(&self, threshold: f64) -> bool {
        !self.on_track && self.confidence >= threshold
    }
}
