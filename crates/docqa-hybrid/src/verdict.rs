//! Parsing of the answer-quality judge's reply.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Supported {
    Yes,
    No,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityVerdict {
    pub supported: Supported,
    pub score: f64,
    pub issues: String,
}

impl QualityVerdict {
    pub fn unparsable() -> Self {
        Self { supported: Supported::Unknown, score: 0.0, issues: "Could not parse quality output.".into() }
    }

    /// Never fails: anything that is not a JSON object becomes an
    /// `Unknown` verdict.
    pub fn from_judge_output(raw: &str) -> Self {
        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw.trim()) else {
            return Self::unparsable();
        };
        let supported = match map.get("supported") {
            Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "yes" | "true" => Supported::Yes,
                "no" | "false" => Supported::No,
                _ => Supported::Unknown,
            },
            Some(Value::Bool(true)) => Supported::Yes,
            Some(Value::Bool(false)) => Supported::No,
            _ => Supported::Unknown,
        };
        let score = match map.get("score") {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        };
        let issues = match map.get("issues") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Self { supported, score: score.clamp(0.0, 1.0), issues }
    }
}
