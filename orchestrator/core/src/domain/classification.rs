// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Classification
//!
//! Result types for the follow-up classifier.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Confidence implied by a file-vote count.
    pub fn from_votes(count: usize) -> Self {
        match count {
            n if n >= 3 => Self::High,
            2 => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// Suggested follow-up agent for a change set or error log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub agent: String,
    pub confidence: Confidence,
    pub reason: String,
}

/// Per-call vote counter, keyed by agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationVote {
    pub agent: &'static str,
    pub count: usize,
    /// First reason seen for this agent
    pub reason: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_thresholds() {
        assert_eq!(Confidence::from_votes(1), Confidence::Low);
        assert_eq!(Confidence::from_votes(2), Confidence::Medium);
        assert_eq!(Confidence::from_votes(3), Confidence::High);
        assert_eq!(Confidence::from_votes(10), Confidence::High);
    }

    #[test]
    fn test_serializes_lowercase() {
        let classification = Classification {
            agent: "test-fixer".to_string(),
            confidence: Confidence::Medium,
            reason: "test files changed".to_string(),
        };
        let json = serde_json::to_value(&classification).unwrap();
        assert_eq!(json["confidence"], "medium");
    }
}
