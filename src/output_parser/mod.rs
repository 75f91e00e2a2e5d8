//! # Plan Output Parser
//!
//! Turns whatever a provider answered into a four-field plan, and turns each
//! plan field into grouped sections for display. Nothing here fails: bad
//! input degrades to placeholders or a flat line list.
//!
//! ## Entry Points
//!
//! | Function | Use Case |
//! |----------|---------|
//! | [`extract_plan`] | Raw provider text → [`PlanResult`](crate::types::PlanResult) |
//! | [`build_sections`] | Plan → grouped workout/diet/tips views |
//! | [`build_workout`], [`build_diet`], [`build_tips`] | One field → one view |
//! | [`normalize`] | Strip markdown markers and bullets |
//!
//! ## Shared Utilities
//!
//! | Function | Purpose |
//! |----------|---------|
//! | [`strip_fences`] | Remove a surrounding markdown code fence |
//! | [`clean_json`] | Drop trailing commas and raw line breaks |
//! | [`segment`] | Header-driven line grouping over any [`HeaderMatcher`] |

pub mod extract;
pub mod flatten;
pub mod normalize;
pub mod plan;
pub mod repair;
pub mod sections;
pub mod segment;

pub use extract::{brace_span, strip_fences};
pub use normalize::{normalize, normalize_line};
pub use plan::{extract_plan, keyword_split, ExtractStage, Extraction};
pub use repair::clean_json;
pub use sections::{
    build_diet, build_sections, build_tips, build_workout, Layout, MealHeaders, MealKind,
    ParsedDay, ParsedMeal, ParsedTipCategory, PlanSections, TipHeaders, TipTheme, WorkoutHeaders,
};
pub use segment::{segment, HeaderMatcher, Section, Segmented};
