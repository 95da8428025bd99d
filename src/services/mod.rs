// src/services/mod.rs
pub mod gemini;
pub mod model_client;

pub use gemini::{GeminiClient, GeminiConfig};
pub use model_client::{ModelClient, ModelError};
