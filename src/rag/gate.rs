//! Decides whether retrieved text is worth putting in front of the model.

use crate::types::QueryResult;
use serde::Serialize;

/// Default threshold: context must be longer than this many characters.
pub const DEFAULT_MIN_CONTEXT_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoContextReason {
    /// The index returned nothing.
    NoResults,
    /// The joined text was at or under the threshold once trimmed.
    TooShort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextDecision {
    /// Joined hit text, untrimmed, plus the files it came from.
    Usable {
        context: String,
        sources: Vec<String>,
    },
    NoContext {
        reason: NoContextReason,
    },
}

impl ContextDecision {
    pub fn is_usable(&self) -> bool {
        matches!(self, ContextDecision::Usable { .. })
    }

    pub fn sources(&self) -> &[String] {
        match self {
            ContextDecision::Usable { sources, .. } => sources,
            ContextDecision::NoContext { .. } => &[],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ContextGate {
    min_chars: usize,
}

impl Default for ContextGate {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONTEXT_CHARS)
    }
}

impl ContextGate {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }

    pub fn min_chars(&self) -> usize {
        self.min_chars
    }

    /// Join the hits with newlines and accept the result only if its
    /// trimmed character count exceeds the threshold.
    pub fn evaluate(&self, result: &QueryResult) -> ContextDecision {
        if result.is_empty() {
            return ContextDecision::NoContext {
                reason: NoContextReason::NoResults,
            };
        }

        let context = result.joined_text();
        if context.trim().chars().count() > self.min_chars {
            ContextDecision::Usable {
                context,
                sources: result.sources(),
            }
        } else {
            ContextDecision::NoContext {
                reason: NoContextReason::TooShort,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IndexHit;

    fn result(texts: &[&str]) -> QueryResult {
        QueryResult::new(
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| IndexHit {
                    id: i.to_string(),
                    text: t.to_string(),
                    source: format!("{}.txt", i),
                    score: 1.0 - i as f32 * 0.1,
                })
                .collect(),
        )
    }

    #[test]
    fn test_empty_result_is_no_results() {
        let gate = ContextGate::default();
        assert_eq!(
            gate.evaluate(&QueryResult::default()),
            ContextDecision::NoContext {
                reason: NoContextReason::NoResults
            }
        );
    }

    #[test]
    fn test_exactly_threshold_is_too_short() {
        let gate = ContextGate::default();
        let fifty = "x".repeat(50);
        assert_eq!(
            gate.evaluate(&result(&[&fifty])),
            ContextDecision::NoContext {
                reason: NoContextReason::TooShort
            }
        );
    }

    #[test]
    fn test_one_over_threshold_is_usable() {
        let gate = ContextGate::default();
        let text = "x".repeat(51);
        assert!(gate.evaluate(&result(&[&text])).is_usable());
    }

    #[test]
    fn test_whitespace_does_not_count() {
        let gate = ContextGate::default();
        let padded = format!("   {}\n\n   ", "y".repeat(50));
        assert!(!gate.evaluate(&result(&[&padded])).is_usable());
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let gate = ContextGate::new(5);
        // six characters, twelve bytes
        assert!(gate.evaluate(&result(&["éééééé"])).is_usable());
        assert!(!gate.evaluate(&result(&["ééééé"])).is_usable());
    }

    #[test]
    fn test_context_keeps_ranking_order_and_padding() {
        let gate = ContextGate::new(0);
        match gate.evaluate(&result(&[" first ", "second"])) {
            ContextDecision::Usable { context, sources } => {
                assert_eq!(context, " first \nsecond");
                assert_eq!(sources, vec!["0.txt", "1.txt"]);
            }
            other => panic!("expected usable context, got {:?}", other),
        }
    }

    #[test]
    fn test_joined_hits_can_cross_threshold_together() {
        let gate = ContextGate::default();
        let a = "a".repeat(25);
        let b = "b".repeat(25);
        // 25 + newline + 25 = 51
        assert!(gate.evaluate(&result(&[&a, &b])).is_usable());
    }
}
