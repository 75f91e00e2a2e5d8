use crate::types::PlanRequest;
use crate::PlanError;
use std::str::FromStr;

/// System message for providers that take one.
pub const COACH_PERSONA: &str = "You are a professional fitness coach and nutritionist.";

const PROFILE_TEMPLATE: &str = "You are an expert fitness coach and nutritionist. Create a personalized fitness plan for:

Name: {name}
Age: {age}, Gender: {gender}
Height: {height}cm, Weight: {weight}kg
Goal: {goal}
Fitness Level: {fitness_level}
Location: {location}
Diet Preference: {diet}
Stress Level: {stress_level}
{medical_history}

Provide:
1. A detailed 7-day workout plan with exercises, sets, reps, and rest times
2. A complete diet plan with breakfast, lunch, dinner, and snacks with calorie estimates
3. Lifestyle and posture tips
4. A motivational quote
";

const STRICT_FORMAT: &str = "
IMPORTANT: Return ONLY valid JSON with this exact structure (no markdown, no code blocks):
{{
  \"workout\": \"string with workout plan\",
  \"diet\": \"string with diet plan\",
  \"tips\": \"string with tips\",
  \"motivation\": \"string with motivational quote\"
}}

Make sure all strings are properly escaped and there are no trailing commas.";

const LOOSE_FORMAT: &str = "
Write the plan as plain text in three parts headed WORKOUT, DIET and TIPS, in that order, \
then finish with the quote. Start each day with \"Day N\" and each meal with its name.";

/// How tightly the prompt constrains the answer format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PromptStyle {
    /// Ask for a bare JSON object with the four plan fields.
    #[default]
    Strict,
    /// Ask for headed plain text; the extractor's keyword split handles it.
    Loose,
}

impl FromStr for PromptStyle {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" | "json" => Ok(PromptStyle::Strict),
            "loose" | "text" => Ok(PromptStyle::Loose),
            other => Err(PlanError::InvalidInput(format!(
                "unknown prompt style '{}'",
                other
            ))),
        }
    }
}

/// Build the plan prompt for one request.
pub fn build_prompt(request: &PlanRequest, style: PromptStyle) -> String {
    let medical = request
        .medical_history()
        .map(|h| format!("Medical History: {}", h))
        .unwrap_or_default();
    let goal = request.goal.to_string();

    let template = match style {
        PromptStyle::Strict => format!("{}{}", PROFILE_TEMPLATE, STRICT_FORMAT),
        PromptStyle::Loose => format!("{}{}", PROFILE_TEMPLATE, LOOSE_FORMAT),
    };

    render(
        &template,
        &[
            ("name", &request.name),
            ("age", &request.age),
            ("gender", &request.gender),
            ("height", &request.height),
            ("weight", &request.weight),
            ("goal", &goal),
            ("fitness_level", &request.fitness_level),
            ("location", &request.location),
            ("diet", &request.diet),
            ("stress_level", &request.stress_level),
            ("medical_history", &medical),
        ],
    )
}

/// Build a prompt string with variable substitution.
///
/// Replaces `{key}` placeholders in the template with the paired values.
/// Use `{{` to insert a literal `{` and `}}` to insert a literal `}`.
/// The template is scanned once, so substituted values are never expanded
/// again. Unknown `{key}` tokens are left as written.
///
/// # Example
///
/// ```
/// use fitplan::prompt::render;
///
/// let result = render("Hello {name}, here is JSON: {{\"key\": \"val\"}}", &[("name", "Alice")]);
/// assert_eq!(result, r#"Hello Alice, here is JSON: {"key": "val"}"#);
/// ```
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(|c| c == '{' || c == '}') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }

        if let Some(end) = tail.strip_prefix('{').and_then(|t| t.find('}')) {
            let key = &tail[1..=end];
            if let Some((_, value)) = vars.iter().find(|(k, _)| *k == key) {
                out.push_str(value);
                rest = &tail[end + 2..];
                continue;
            }
        }

        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    out.push_str(rest);
    out
}
