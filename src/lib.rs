//! # fitplan
//!
//! A small web service that turns a user's fitness profile into a four-part
//! plan (workout, diet, tips, motivation).
//!
//! ## Flow
//!
//! 1. [`resolver::resolve_provider`] picks the first text provider with a
//!    usable credential (Gemini, HuggingFace, Claude, OpenAI), or the canned
//!    demo plan when `DEMO_MODE=true`.
//! 2. [`prompt::build_prompt`] renders the profile into the coaching prompt.
//! 3. One call goes out through the [`TextProvider`](backend::TextProvider)
//!    for that provider.
//! 4. [`output_parser::extract_plan`] recovers the plan from whatever came
//!    back: fenced JSON, JSON buried in prose, nested objects, or plain
//!    headed text.
//! 5. [`output_parser::build_sections`] groups each field into days, meals
//!    and tip categories for display.
//!
//! Image generation ([`media::image`]), narration ([`media::speech`]), BMI
//! ([`bmi`]) and plan persistence ([`store`]) sit beside the main flow, all
//! exposed through [`server::build_router`].
//!
//! ```no_run
//! use fitplan::{resolver::generate_plan, Config, PlanRequest};
//!
//! #[tokio::main]
//! async fn main() -> fitplan::Result<()> {
//!     let config = Config::from_env();
//!     let request = PlanRequest {
//!         name: "Asha".into(),
//!         ..Default::default()
//!     };
//!     let generated = generate_plan(&config, &reqwest::Client::new(), &request).await?;
//!     println!("{} ({})", generated.plan.workout, generated.provider);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod bmi;
pub mod config;
pub mod error;
pub mod media;
pub mod output_parser;
pub mod prompt;
pub mod resolver;
pub mod server;
pub mod store;
pub mod types;

pub use backend::{LlmConfig, LlmRequest, LlmResponse, ProviderKind, TextProvider};
pub use config::Config;
pub use error::{PlanError, Result};
pub use output_parser::{build_sections, extract_plan, PlanSections};
pub use resolver::{generate_plan, resolve_provider, GeneratedPlan, ProviderChoice};
pub use types::{Goal, PlanRequest, PlanResult};
