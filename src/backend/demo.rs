//! Offline provider returning a canned plan personalized with the request.
//!
//! Used when `DEMO_MODE=true` and no credential is configured, and as the
//! substitute answer when an upstream model is still loading.

use async_trait::async_trait;
use reqwest::Client;

use super::{LlmRequest, LlmResponse, TextProvider};
use crate::error::Result;
use crate::types::{PlanRequest, PlanResult};

/// A provider that never touches the network.
#[derive(Debug, Clone)]
pub struct DemoProvider {
    request: PlanRequest,
}

impl DemoProvider {
    pub fn new(request: PlanRequest) -> Self {
        Self { request }
    }
}

#[async_trait]
impl TextProvider for DemoProvider {
    async fn complete(
        &self,
        _client: &Client,
        _base_url: &str,
        _request: &LlmRequest,
    ) -> Result<LlmResponse> {
        let text = serde_json::to_string(&demo_plan(&self.request))?;
        Ok(LlmResponse {
            text,
            status: 200,
            metadata: None,
        })
    }

    fn name(&self) -> &'static str {
        "Demo"
    }
}

/// The full seven-day sample plan.
pub fn demo_plan(req: &PlanRequest) -> PlanResult {
    let workout = format!(
        "🏋️ 7-DAY WORKOUT PLAN FOR {name}

Goal: {goal} | Level: {level} | Location: {location}

DAY 1 - CHEST & TRICEPS
• Push-ups: 3 sets x 12 reps (Rest: 60s)
• Dumbbell Bench Press: 4 sets x 10 reps (Rest: 90s)
• Tricep Dips: 3 sets x 12 reps (Rest: 60s)
• Cable Flyes: 3 sets x 15 reps (Rest: 45s)

DAY 2 - BACK & BICEPS
• Pull-ups: 3 sets x 8 reps (Rest: 90s)
• Barbell Rows: 4 sets x 10 reps (Rest: 90s)
• Dumbbell Curls: 3 sets x 12 reps (Rest: 60s)
• Lat Pulldowns: 3 sets x 12 reps (Rest: 60s)

DAY 3 - LEGS
• Squats: 4 sets x 12 reps (Rest: 120s)
• Lunges: 3 sets x 10 reps each leg (Rest: 60s)
• Leg Press: 3 sets x 15 reps (Rest: 90s)
• Calf Raises: 4 sets x 20 reps (Rest: 45s)

DAY 4 - REST/ACTIVE RECOVERY
• Light cardio: 20-30 min walk or yoga
• Stretching routine: 15 minutes

DAY 5 - SHOULDERS & ABS
• Overhead Press: 4 sets x 10 reps (Rest: 90s)
• Lateral Raises: 3 sets x 15 reps (Rest: 60s)
• Planks: 3 sets x 60s (Rest: 45s)
• Russian Twists: 3 sets x 20 reps (Rest: 45s)

DAY 6 - FULL BODY CIRCUIT
• Burpees: 3 sets x 10 reps
• Mountain Climbers: 3 sets x 20 reps
• Kettlebell Swings: 3 sets x 15 reps
• Box Jumps: 3 sets x 12 reps

DAY 7 - REST
• Complete rest or light stretching",
        name = req.name.to_uppercase(),
        goal = req.goal,
        level = req.fitness_level,
        location = req.location,
    );

    let diet = format!(
        "🥗 PERSONALIZED DIET PLAN

Daily Calorie Target: {calories} calories
Diet Type: {diet}

BREAKFAST (7:00 AM - 500 cal)
• Oatmeal with berries and almonds
• 2 boiled eggs
• Green tea
• 1 banana

MID-MORNING SNACK (10:00 AM - 200 cal)
• Greek yogurt with honey
• Handful of mixed nuts

LUNCH (1:00 PM - 600 cal)
• Grilled chicken breast (150g)
• Brown rice (1 cup)
• Mixed vegetable salad
• Olive oil dressing

EVENING SNACK (4:00 PM - 250 cal)
• Protein shake
• Apple or orange
• 10 almonds

DINNER (7:00 PM - 550 cal)
• Grilled salmon or tofu
• Quinoa (1 cup)
• Steamed broccoli and carrots
• Side salad

BEFORE BED (Optional - 150 cal)
• Casein protein shake or
• Cottage cheese with berries

HYDRATION: Drink 3-4 liters of water daily
SUPPLEMENTS: Multivitamin, Omega-3, Vitamin D (consult doctor)",
        calories = req.goal.calorie_target(),
        diet = req.diet,
    );

    let tips = format!(
        "💡 LIFESTYLE & POSTURE TIPS

POSTURE GUIDELINES:
• Keep your spine neutral during all exercises
• Engage your core throughout the day
• Take breaks every 30 minutes if sitting
• Use proper form over heavy weights

RECOVERY:
• Get 7-9 hours of quality sleep
• Take rest days seriously
• Consider foam rolling and stretching
• Listen to your body's signals

STRESS MANAGEMENT (Your level: {stress}):
• Practice deep breathing exercises
• Try meditation for 10 minutes daily
• Maintain a consistent sleep schedule
• Stay connected with friends and family

NUTRITION TIPS:
• Meal prep on Sundays for the week
• Eat protein with every meal
• Don't skip breakfast
• Limit processed foods and sugar

CONSISTENCY:
• Track your workouts and meals
• Take progress photos monthly
• Celebrate small wins
• Find a workout buddy for accountability",
        stress = req.stress_level,
    );

    let motivation = format!(
        "\"The only bad workout is the one that didn't happen. Your body can stand almost anything - it's your mind you have to convince. Start today, {}!\"",
        req.name
    );

    PlanResult {
        workout,
        diet,
        tips,
        motivation,
    }
}

/// The shorter plan substituted while an upstream model is cold-starting.
pub fn loading_plan(req: &PlanRequest) -> PlanResult {
    PlanResult {
        workout: format!(
            "🏋️ 7-DAY WORKOUT PLAN FOR {}\n\nGoal: {} | Level: {} | Location: {}\n\n\
             DAY 1 - FULL BODY\n• Squats: 3 sets x 12 reps\n• Push-ups: 3 sets x 10 reps\n\
             • Rows: 3 sets x 12 reps\n• Plank: 3 sets x 30s\n\n\
             DAY 2 - CARDIO\n• Running: 30 minutes\n• Burpees: 3 sets x 10 reps\n\n\
             DAY 3 - REST\n\n\
             DAY 4 - UPPER BODY\n• Bench Press: 4 sets x 10 reps\n• Shoulder Press: 3 sets x 12 reps\n\n\
             DAY 5 - LOWER BODY\n• Deadlifts: 4 sets x 8 reps\n• Lunges: 3 sets x 12 reps\n\n\
             DAY 6 - HIIT\n• 20 min HIIT circuit\n\n\
             DAY 7 - REST",
            req.name.to_uppercase(),
            req.goal,
            req.fitness_level,
            req.location
        ),
        diet: format!(
            "🥗 DIET PLAN ({})\n\nBREAKFAST: Oatmeal, eggs, fruit\nLUNCH: Chicken, rice, vegetables\n\
             DINNER: Fish, quinoa, salad\nSNACKS: Nuts, yogurt, protein shake",
            req.diet
        ),
        tips: "💡 TIPS\n• Drink 3L water daily\n• Sleep 7-8 hours\n• Track your progress\n• Stay consistent"
            .to_string(),
        motivation: "\"Your body can do it, it's your mind you need to convince!\"".to_string(),
    }
}
