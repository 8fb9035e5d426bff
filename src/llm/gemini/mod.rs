//! Gemini provider implementation
//!
//! Streams generations from Google's Gemini models, either through the
//! Generative Language API (API key) or Vertex AI (ADC).

pub mod client;
pub mod mapper;
pub mod sse;
pub mod types;

pub use client::{GeminiClient, GeminiCredentials, GeminiModel};
