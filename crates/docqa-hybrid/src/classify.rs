//! Query intent classification.
//!
//! An external generator is asked for the label first; anything other than
//! one exact label, or a failed call, falls back to keyword matching.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use docqa_core::error::Error;
use docqa_core::traits::LabelGenerator;

pub const CLASSIFIER_PROMPT: &str =
    "Classify the question into one of: conceptual, factual, exploratory. Return only the label.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryIntent {
    Conceptual,
    Factual,
    Exploratory,
}

impl QueryIntent {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryIntent::Conceptual => "conceptual",
            QueryIntent::Factual => "factual",
            QueryIntent::Exploratory => "exploratory",
        }
    }
}

impl fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryIntent {
    type Err = Error;

    /// Exact lowercase label only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conceptual" => Ok(QueryIntent::Conceptual),
            "factual" => Ok(QueryIntent::Factual),
            "exploratory" => Ok(QueryIntent::Exploratory),
            other => Err(Error::InvalidInput(format!("not an intent label: {other:?}"))),
        }
    }
}

/// Checked in order; the first label with a matching keyword wins.
pub const KEYWORD_HINTS: [(QueryIntent, &[&str]); 3] = [
    (QueryIntent::Conceptual, &["why", "explain", "intuition", "concept", "meaning"]),
    (QueryIntent::Factual, &["what", "when", "define", "list", "formula", "equation"]),
    (QueryIntent::Exploratory, &["compare", "tradeoff", "pros", "cons", "design", "approach"]),
];

/// Substring keyword match on the lowercased query, `Conceptual` if nothing hits.
pub fn heuristic_classify(query: &str) -> QueryIntent {
    let q = query.to_lowercase();
    KEYWORD_HINTS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| q.contains(k)))
        .map_or(QueryIntent::Conceptual, |(intent, _)| *intent)
}

pub struct QueryClassifier {
    generator: Option<Box<dyn LabelGenerator>>,
}

impl QueryClassifier {
    pub fn new(generator: Box<dyn LabelGenerator>) -> Self {
        Self { generator: Some(generator) }
    }

    /// Keyword matching only.
    pub fn heuristic() -> Self {
        Self { generator: None }
    }

    pub fn classify(&self, query: &str) -> QueryIntent {
        let Some(generator) = &self.generator else {
            return heuristic_classify(query);
        };
        match generator.complete(CLASSIFIER_PROMPT, query) {
            Ok(raw) => match raw.trim().to_lowercase().parse::<QueryIntent>() {
                Ok(intent) => {
                    debug!(%intent, "generator classified query");
                    intent
                }
                Err(_) => {
                    warn!(output = %raw.trim(), "generator gave no exact label; using keyword heuristic");
                    heuristic_classify(query)
                }
            },
            Err(e) => {
                warn!(error = %e, "classification call failed; using keyword heuristic");
                heuristic_classify(query)
            }
        }
    }
}
