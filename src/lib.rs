// Lets code generated by `#[tool]` refer to this crate by name
extern crate self as odin_tutor;

// HTTP server modules
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod sse;
pub mod state;
pub mod telemetry;

// Data access and learner analytics
pub mod context;
pub mod db;
pub mod progress;
pub mod questions;
pub mod search;

// LLM abstraction layer and the tutor built on it
pub mod llm;
pub mod tutor;
