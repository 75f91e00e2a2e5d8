//! Image generation and speech synthesis.

pub mod image;
pub mod speech;

pub use image::{poll_prediction, select_image_provider, ImageProvider, OpenAiImages, PollConfig, ReplicateImages};
pub use speech::{truncate_chars, ElevenLabsSpeech};
