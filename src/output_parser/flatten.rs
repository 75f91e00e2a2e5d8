//! Flattening of structured plan fields into display text.
//!
//! Some models answer with nested objects instead of the requested strings
//! (a `schedule` array for the workout, a `meals` array for the diet, a map
//! of tip categories). These are rendered into the same line-oriented text a
//! string answer would contain, so the section builder sees one format.
//! Keys not listed here are dropped.

use serde_json::{Map, Value};

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Render any JSON value as plan text.
///
/// Strings pass through, arrays become bullet lines, other scalars use their
/// JSON form. `null` yields `None`. Objects go through `object_text`.
pub(crate) fn value_text(value: &Value, object_text: fn(&Map<String, Value>) -> String) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(bullets(items)),
        Value::Object(map) => Some(object_text(map)),
        other => Some(other.to_string()),
    }
}

/// Flatten a workout object: description, then one block per schedule day.
///
/// Objects with neither `description` nor `schedule` fall back to
/// [`flatten_generic`].
pub fn flatten_workout(map: &Map<String, Value>) -> String {
    if !map.contains_key("description") && !map.contains_key("schedule") {
        return flatten_generic(map);
    }

    let mut out = String::new();
    if let Some(desc) = map.get("description").and_then(scalar) {
        out.push_str(&desc);
        out.push_str("\n\n");
    }

    for day in map.get("schedule").and_then(Value::as_array).into_iter().flatten() {
        let label = WEEKDAYS
            .iter()
            .find_map(|d| day.get(*d).and_then(scalar))
            .unwrap_or_else(|| "Day".to_string());
        out.push_str(&format!("\n{}\n", label));
        if let Some(focus) = day.get("focus").and_then(scalar) {
            out.push_str(&format!("Focus: {}\n", focus));
        }
        for ex in day.get("exercises").and_then(Value::as_array).into_iter().flatten() {
            let field = |k: &str| ex.get(k).and_then(scalar).unwrap_or_default();
            out.push_str(&format!(
                "• {}: {} sets x {} reps (Rest: {})\n",
                field("name"),
                field("sets"),
                field("reps"),
                field("rest")
            ));
            if let Some(instructions) = ex.get("instructions").and_then(scalar) {
                out.push_str(&format!("  {}\n", instructions));
            }
        }
    }
    out
}

/// Flatten a diet object: summary lines, then one block per meal.
pub fn flatten_diet(map: &Map<String, Value>) -> String {
    let mut out = String::new();
    if let Some(desc) = map.get("description").and_then(scalar) {
        out.push_str(&desc);
        out.push_str("\n\n");
    }
    if let Some(target) = map.get("daily_calorie_target").and_then(scalar) {
        out.push_str(&format!("Daily Calorie Target: {}\n", target));
    }
    if let Some(kind) = map.get("diet_type").and_then(scalar) {
        out.push_str(&format!("Diet Type: {}\n\n", kind));
    }

    for meal in map.get("meals").and_then(Value::as_array).into_iter().flatten() {
        let name = ["meal_name", "name"]
            .iter()
            .find_map(|k| meal.get(*k).and_then(scalar))
            .unwrap_or_else(|| "Meal".to_string());
        out.push_str(&format!("\n{}", name));
        if let Some(time) = meal.get("time").and_then(scalar) {
            out.push_str(&format!(" ({})", time));
        }
        if let Some(calories) = meal.get("calories").and_then(scalar) {
            out.push_str(&format!(" - {}", calories));
        }
        out.push('\n');
        for item in meal.get("items").and_then(Value::as_array).into_iter().flatten() {
            if let Some(item) = scalar(item) {
                out.push_str(&format!("• {}\n", item));
            }
        }
    }

    if let Some(hydration) = map.get("hydration").and_then(scalar) {
        out.push_str(&format!("\n\nHYDRATION: {}", hydration));
    }
    if let Some(supplements) = map.get("supplements").and_then(scalar) {
        out.push_str(&format!("\nSUPPLEMENTS: {}", supplements));
    }
    out
}

/// Flatten a tips object: each key becomes an upper-cased category header.
pub fn flatten_tips(map: &Map<String, Value>) -> String {
    flatten_generic(map)
}

/// `KEY:` header per entry, then bullet lines for arrays or the scalar value.
pub fn flatten_generic(map: &Map<String, Value>) -> String {
    let mut out = String::new();
    for (key, value) in map {
        out.push_str(&format!("\n{}:\n", key.to_uppercase()));
        match value {
            Value::Array(items) => out.push_str(&bullets(items)),
            other => {
                if let Some(text) = scalar(other) {
                    out.push_str(&format!("{}\n", text));
                }
            }
        }
    }
    out
}

fn bullets(items: &[Value]) -> String {
    items
        .iter()
        .filter_map(scalar)
        .map(|item| format!("• {}\n", item))
        .collect()
}

/// Text form of a leaf value. Empty strings and `null` count as absent.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
