use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Fitness goal selected on the form.
///
/// Unknown values are kept verbatim in [`Goal::Other`]; the service does not
/// re-validate form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Goal {
    WeightLoss,
    MuscleGain,
    #[default]
    Maintenance,
    Endurance,
    Other(String),
}

impl Goal {
    pub fn as_str(&self) -> &str {
        match self {
            Goal::WeightLoss => "weight_loss",
            Goal::MuscleGain => "muscle_gain",
            Goal::Maintenance => "maintenance",
            Goal::Endurance => "endurance",
            Goal::Other(s) => s,
        }
    }

    /// Daily calorie range used by the canned demo plan.
    pub fn calorie_target(&self) -> &'static str {
        match self {
            Goal::WeightLoss => "1800-2000",
            Goal::MuscleGain => "2500-2800",
            _ => "2200-2400",
        }
    }
}

impl From<&str> for Goal {
    fn from(s: &str) -> Self {
        match s {
            "weight_loss" => Goal::WeightLoss,
            "muscle_gain" => Goal::MuscleGain,
            "maintenance" => Goal::Maintenance,
            "endurance" => Goal::Endurance,
            other => Goal::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Goal {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Goal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Goal::from(s.as_str()))
    }
}

/// User parameters collected by the plan form.
///
/// Numeric fields arrive as strings from HTML forms and as numbers from
/// other clients; both are accepted and kept as text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanRequest {
    pub name: String,
    #[serde(deserialize_with = "loose_string")]
    pub age: String,
    pub gender: String,
    /// Height in centimetres.
    #[serde(deserialize_with = "loose_string")]
    pub height: String,
    /// Weight in kilograms.
    #[serde(deserialize_with = "loose_string")]
    pub weight: String,
    pub goal: Goal,
    pub fitness_level: String,
    pub location: String,
    pub diet: String,
    pub stress_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
}

impl PlanRequest {
    /// Medical history, if the user entered anything other than whitespace.
    pub fn medical_history(&self) -> Option<&str> {
        self.medical_history
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// The four-field plan shown to the user.
///
/// After extraction all four fields are present and non-empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanResult {
    pub workout: String,
    pub diet: String,
    pub tips: String,
    pub motivation: String,
}

/// Accept a JSON string or number and keep it as text.
fn loose_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Loose::deserialize(deserializer)? {
        Loose::Text(s) => s,
        Loose::Int(n) => n.to_string(),
        Loose::Float(n) => n.to_string(),
    })
}

/// Accept a JSON number or a numeric string.
pub(crate) fn loose_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Number(f64),
        Text(String),
    }

    match Loose::deserialize(deserializer)? {
        Loose::Number(n) => Ok(n),
        Loose::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got '{}'", s))),
    }
}
