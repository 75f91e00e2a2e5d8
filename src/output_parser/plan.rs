//! Plan extraction from raw provider text.
//!
//! [`extract_plan`] never fails. It tries, in order:
//!
//! 1. fence stripping + cleanup + strict parse ([`ExtractStage::Direct`]),
//! 2. the first-`{`-to-last-`}` span of the raw text ([`ExtractStage::BraceSpan`]),
//! 3. a split on the literal `DIET` / `TIPS` markers ([`ExtractStage::KeywordSplit`]).
//!
//! The first stage that yields a JSON object carrying at least one plan key
//! wins. Missing or blank fields are filled with fixed placeholders.

use super::extract::{brace_span, strip_fences};
use super::flatten::{flatten_diet, flatten_tips, flatten_workout, value_text};
use super::repair::clean_json;
use crate::types::PlanResult;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub const WORKOUT_PLACEHOLDER: &str = "Workout plan unavailable. Please try generating again.";
pub const DIET_PLACEHOLDER: &str = "See workout section";
pub const TIPS_PLACEHOLDER: &str = "Stay consistent and hydrated!";
pub const MOTIVATION_PLACEHOLDER: &str = "Your only limit is you!";

const PLAN_KEYS: [&str; 4] = ["workout", "diet", "tips", "motivation"];

/// Which extraction step produced the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractStage {
    Direct,
    BraceSpan,
    KeywordSplit,
}

/// A plan plus the stage that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub plan: PlanResult,
    pub stage: ExtractStage,
}

/// Extract a four-field plan from arbitrary provider text.
///
/// # Examples
///
/// ```
/// use fitplan::output_parser::{extract_plan, ExtractStage};
///
/// let raw = "```json\n{\"workout\":\"a\",\"diet\":\"b\",\"tips\":\"c\",\"motivation\":\"d\",}\n```";
/// let extraction = extract_plan(raw);
/// assert_eq!(extraction.stage, ExtractStage::Direct);
/// assert_eq!(extraction.plan.workout, "a");
/// assert_eq!(extraction.plan.motivation, "d");
/// ```
pub fn extract_plan(raw: &str) -> Extraction {
    if let Some(plan) = parse_plan_object(strip_fences(raw)) {
        return Extraction {
            plan,
            stage: ExtractStage::Direct,
        };
    }

    if let Some(plan) = brace_span(raw).and_then(parse_plan_object) {
        warn!("plan JSON needed brace extraction");
        return Extraction {
            plan,
            stage: ExtractStage::BraceSpan,
        };
    }

    warn!("no plan JSON found, splitting on section keywords");
    debug!(raw = %snippet(raw), "unparsed provider content");
    Extraction {
        plan: keyword_split(raw),
        stage: ExtractStage::KeywordSplit,
    }
}

/// Clean, parse and accept `text` if it is an object with a plan key.
fn parse_plan_object(text: &str) -> Option<PlanResult> {
    let value: Value = serde_json::from_str(&clean_json(text)).ok()?;
    let map = value.as_object()?;
    if !PLAN_KEYS.iter().any(|k| map.contains_key(*k)) {
        return None;
    }
    Some(plan_from_object(map))
}

fn plan_from_object(map: &Map<String, Value>) -> PlanResult {
    let field = |key: &str, object_text: fn(&Map<String, Value>) -> String, placeholder: &str| {
        map.get(key)
            .and_then(|v| value_text(v, object_text))
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| placeholder.to_string())
    };

    PlanResult {
        workout: field("workout", flatten_workout, WORKOUT_PLACEHOLDER),
        diet: field("diet", flatten_diet, DIET_PLACEHOLDER),
        tips: field("tips", flatten_tips, TIPS_PLACEHOLDER),
        motivation: field("motivation", flatten_tips, MOTIVATION_PLACEHOLDER),
    }
}

/// Split loosely structured text on the `DIET` and `TIPS` markers.
///
/// Workout is everything before the first `DIET`. Diet is the piece between
/// the first and second `DIET`, cut at its first `TIPS`. Tips is the piece
/// between the first and second `TIPS`.
pub fn keyword_split(raw: &str) -> PlanResult {
    let non_blank = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());

    let mut diet_pieces = raw.split("DIET");
    let workout = diet_pieces
        .next()
        .and_then(non_blank)
        .or_else(|| non_blank(raw))
        .unwrap_or_else(|| WORKOUT_PLACEHOLDER.to_string());
    let diet = diet_pieces
        .next()
        .and_then(|piece| piece.split("TIPS").next())
        .and_then(non_blank)
        .unwrap_or_else(|| DIET_PLACEHOLDER.to_string());
    let tips = raw
        .split("TIPS")
        .nth(1)
        .and_then(non_blank)
        .unwrap_or_else(|| TIPS_PLACEHOLDER.to_string());

    PlanResult {
        workout,
        diet,
        tips,
        motivation: MOTIVATION_PLACEHOLDER.to_string(),
    }
}

fn snippet(raw: &str) -> &str {
    match raw.char_indices().nth(500) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}
