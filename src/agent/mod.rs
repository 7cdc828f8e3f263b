//! Language-model integration
//!
//! Sends rendered match prompts to a chat-completion endpoint and returns the
//! model's free-text prediction.

pub mod prediction;

pub use prediction::{system_prompt, ChatMessage, PredictionClient, PredictionConfig, Predictor};
