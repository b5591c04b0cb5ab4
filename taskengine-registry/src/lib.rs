#![deny(missing_docs)]
//! # taskengine-registry — tool registry and execution context (C1)
//!
//! A process-wide, flat mapping from tool name to [`ToolHandler`]. The
//! registry is deliberately trivial — no hierarchies, no versioning — so
//! that variety lives in handlers, not in the registry itself. The Planner
//! and Critic depend only on [`ToolRegistry::describe`]; adding a new tool
//! requires no change to either.

pub mod context;
pub mod handler;
pub mod registry;

pub use context::ToolContext;
pub use handler::{ToolDefinition, ToolHandler};
pub use registry::ToolRegistry;
