//! Body-mass index from the form's height and weight.

use crate::error::{PlanError, Result};
use crate::types::loose_f64;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

/// Form values arrive as strings from HTML forms and as numbers from other
/// clients; both are accepted.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BmiInput {
    /// Kilograms.
    #[serde(deserialize_with = "loose_f64")]
    pub weight: f64,
    /// Centimetres.
    #[serde(deserialize_with = "loose_f64")]
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BmiReport {
    pub bmi: f64,
    pub category: BmiCategory,
}

/// `weight / (height / 100)²`, rounded to one decimal.
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> Result<f64> {
    if !height_cm.is_finite() || height_cm <= 0.0 {
        return Err(PlanError::InvalidInput(
            "height must be a positive number".to_string(),
        ));
    }
    if !weight_kg.is_finite() || weight_kg < 0.0 {
        return Err(PlanError::InvalidInput(
            "weight must be a non-negative number".to_string(),
        ));
    }
    let meters = height_cm / 100.0;
    Ok((weight_kg / (meters * meters) * 10.0).round() / 10.0)
}

pub fn bmi_category(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}

pub fn bmi_report(input: BmiInput) -> Result<BmiReport> {
    let bmi = calculate_bmi(input.weight, input.height)?;
    Ok(BmiReport {
        bmi,
        category: bmi_category(bmi),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_rounds_to_one_decimal() {
        assert_eq!(calculate_bmi(70.0, 175.0).unwrap(), 22.9);
        assert_eq!(calculate_bmi(61.5, 165.0).unwrap(), 22.6);
    }

    #[test]
    fn test_category_thresholds() {
        assert_eq!(bmi_category(18.4), BmiCategory::Underweight);
        assert_eq!(bmi_category(18.5), BmiCategory::Normal);
        assert_eq!(bmi_category(24.9), BmiCategory::Normal);
        assert_eq!(bmi_category(25.0), BmiCategory::Overweight);
        assert_eq!(bmi_category(30.0), BmiCategory::Obese);
    }

    #[test]
    fn test_non_positive_height_rejected() {
        assert!(matches!(calculate_bmi(70.0, 0.0), Err(PlanError::InvalidInput(_))));
        assert!(calculate_bmi(70.0, -170.0).is_err());
    }

    #[test]
    fn test_input_accepts_strings_and_numbers() {
        let from_form: BmiInput =
            serde_json::from_value(serde_json::json!({ "weight": "70", "height": " 175 " })).unwrap();
        let from_api: BmiInput =
            serde_json::from_value(serde_json::json!({ "weight": 70.0, "height": 175 })).unwrap();
        assert_eq!(from_form.weight, from_api.weight);
        assert_eq!(from_form.height, from_api.height);
        assert_eq!(bmi_report(from_form).unwrap().bmi, 22.9);
    }

    #[test]
    fn test_input_rejects_non_numeric_string() {
        let parsed = serde_json::from_value::<BmiInput>(serde_json::json!({
            "weight": "heavy",
            "height": "175"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_report() {
        let report = bmi_report(BmiInput {
            weight: 95.0,
            height: 170.0,
        })
        .unwrap();
        assert_eq!(report.bmi, 32.9);
        assert_eq!(report.category, BmiCategory::Obese);
    }
}
