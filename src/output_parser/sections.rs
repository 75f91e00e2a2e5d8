//! Domain views over segmented plan text: workout days, meals and tip
//! categories.

use super::normalize::normalize;
use super::segment::{segment, HeaderMatcher, Section, Segmented};
use crate::types::PlanResult;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static DAY_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bday\s*\d+|\b(?:mon|tues|wednes|thurs|fri|satur|sun)day\b")
        .expect("valid day regex")
});
static FOCUS_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)focus:|workout:").expect("valid focus regex"));

static MEAL_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:breakfast|lunch|dinner|snack|meal)s?\b").expect("valid meal regex")
});
static PARENTHESIZED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((.*?)\)").expect("valid parenthesis regex"));
static CALORIES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*(?:cal|calories)").expect("valid calorie regex"));

static TIP_HEADER_CAPS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z\s]+:").expect("valid tip regex"));
static TIP_HEADER_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Za-z\s]+:$").expect("valid tip regex"));

/// Day headers: `Day N` or a weekday name. `Focus:` lines set the day focus.
pub struct WorkoutHeaders;

impl HeaderMatcher for WorkoutHeaders {
    fn header(&self, _raw: &str, cleaned: &str) -> Option<Section> {
        DAY_HEADER
            .is_match(cleaned)
            .then(|| Section::titled(cleaned))
    }

    fn annotate(&self, section: &mut Section, cleaned: &str) -> bool {
        if !FOCUS_MARKER.is_match(cleaned) {
            return false;
        }
        let focus = FOCUS_MARKER.replace_all(cleaned, "").trim().to_string();
        if !focus.is_empty() {
            section.focus = Some(focus);
        }
        true
    }
}

/// Meal headers, with `(time)` and `N cal` read from the raw line.
pub struct MealHeaders;

impl HeaderMatcher for MealHeaders {
    fn header(&self, raw: &str, cleaned: &str) -> Option<Section> {
        if !MEAL_HEADER.is_match(cleaned) {
            return None;
        }
        let mut section = Section::titled(PARENTHESIZED.replace_all(cleaned, "").trim());
        section.time = PARENTHESIZED
            .captures(raw)
            .map(|c| c[1].trim().to_string())
            .filter(|t| !t.is_empty());
        section.calories = CALORIES
            .captures(raw)
            .and_then(|c| c[1].parse().ok());
        Some(section)
    }
}

/// Category headers: an all-caps label with a colon, or a title-case label
/// ending in a colon. Loose lines before one go to a `Tips` group.
pub struct TipHeaders;

impl HeaderMatcher for TipHeaders {
    fn header(&self, _raw: &str, cleaned: &str) -> Option<Section> {
        if !(TIP_HEADER_CAPS.is_match(cleaned) || TIP_HEADER_TITLE.is_match(cleaned)) {
            return None;
        }
        let title = cleaned.strip_suffix(':').unwrap_or(cleaned).trim();
        Some(Section::titled(title))
    }

    fn implicit_title(&self) -> Option<&str> {
        Some("Tips")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedDay {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    pub exercises: Vec<String>,
}

impl From<Section> for ParsedDay {
    fn from(s: Section) -> Self {
        Self {
            title: s.title,
            focus: s.focus,
            exercises: s.items,
        }
    }
}

/// Which part of the day a meal belongs to, for icon selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MealKind {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    Other,
}

impl MealKind {
    pub fn classify(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("breakfast") {
            MealKind::Breakfast
        } else if name.contains("lunch") {
            MealKind::Lunch
        } else if name.contains("dinner") {
            MealKind::Dinner
        } else if name.contains("snack") {
            MealKind::Snack
        } else {
            MealKind::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedMeal {
    pub name: String,
    pub kind: MealKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
    pub items: Vec<String>,
}

impl From<Section> for ParsedMeal {
    fn from(s: Section) -> Self {
        Self {
            kind: MealKind::classify(&s.title),
            name: s.title,
            time: s.time,
            calories: s.calories,
            items: s.items,
        }
    }
}

/// Broad theme of a tip category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TipTheme {
    Posture,
    Recovery,
    Mindset,
    Nutrition,
    Consistency,
    General,
}

impl TipTheme {
    pub fn classify(title: &str) -> Self {
        let title = title.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| title.contains(w));
        if has(&["posture", "form"]) {
            TipTheme::Posture
        } else if has(&["recovery", "rest"]) {
            TipTheme::Recovery
        } else if has(&["stress", "mental"]) {
            TipTheme::Mindset
        } else if has(&["nutrition", "diet"]) {
            TipTheme::Nutrition
        } else if has(&["consistency", "habit"]) {
            TipTheme::Consistency
        } else {
            TipTheme::General
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedTipCategory {
    pub title: String,
    pub theme: TipTheme,
    pub tips: Vec<String>,
}

impl From<Section> for ParsedTipCategory {
    fn from(s: Section) -> Self {
        Self {
            theme: TipTheme::classify(&s.title),
            title: s.title,
            tips: s.items,
        }
    }
}

/// Either grouped records or the flat line list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "layout", content = "entries", rename_all = "snake_case")]
pub enum Layout<T> {
    Grouped(Vec<T>),
    Ungrouped(Vec<String>),
}

impl<T: From<Section>> From<Segmented> for Layout<T> {
    fn from(segmented: Segmented) -> Self {
        match segmented {
            Segmented::Grouped(sections) => {
                Layout::Grouped(sections.into_iter().map(T::from).collect())
            }
            Segmented::Ungrouped(lines) => Layout::Ungrouped(lines),
        }
    }
}

/// The rendered view of a whole plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSections {
    pub workout: Layout<ParsedDay>,
    pub diet: Layout<ParsedMeal>,
    pub tips: Layout<ParsedTipCategory>,
    pub motivation: String,
}

pub fn build_workout(text: &str) -> Layout<ParsedDay> {
    segment(text, &WorkoutHeaders).into()
}

pub fn build_diet(text: &str) -> Layout<ParsedMeal> {
    segment(text, &MealHeaders).into()
}

pub fn build_tips(text: &str) -> Layout<ParsedTipCategory> {
    segment(text, &TipHeaders).into()
}

/// Build every view of a plan.
pub fn build_sections(plan: &PlanResult) -> PlanSections {
    PlanSections {
        workout: build_workout(&plan.workout),
        diet: build_diet(&plan.diet),
        tips: build_tips(&plan.tips),
        motivation: normalize(&plan.motivation),
    }
}
