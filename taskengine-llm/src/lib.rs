#![deny(missing_docs)]
//! # taskengine-llm — language-model provider binding
//!
//! The external language-model endpoint reduced to its essential contract
//! for this engine: [`LlmProvider::complete`] takes a prompt and a model
//! name and returns a completion string. [`HttpLlmProvider`] binds this to
//! an Ollama-compatible HTTP endpoint; [`MockLlmProvider`] is the in-memory
//! test double the Planner and Critic unit tests exercise instead of a
//! live model.

pub mod error;
pub mod http;
pub mod mock;
pub mod provider;

pub use error::LlmError;
pub use http::HttpLlmProvider;
pub use mock::MockLlmProvider;
pub use provider::LlmProvider;
