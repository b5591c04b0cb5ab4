#![deny(missing_docs)]
//! # taskengine-types — core data model and error taxonomy
//!
//! Defines the durable record types the orchestration engine operates on
//! (Task, Step, Event, Artifact, Sandbox), the typed identifiers that thread
//! through every component, and the per-component error taxonomy that the
//! rest of the `taskengine-*` family propagates with `#[from]` conversions.
//!
//! Every other crate in this family depends on this one and nothing
//! upstream of it; it carries no component-specific logic.

pub mod artifact;
pub mod config;
pub mod duration;
pub mod error;
pub mod event;
pub mod id;
pub mod sandbox;
pub mod step;
pub mod task;

pub use artifact::{Artifact, ArtifactKind};
pub use config::EngineConfig;
pub use duration::DurationMs;
pub use error::{CriticError, OrchestratorError, PlannerError, SandboxError, ToolError, WorkerError};
pub use event::{Event, EventKind};
pub use id::{SandboxId, StepId, TaskId};
pub use sandbox::{PortMap, Sandbox, SandboxStatus};
pub use step::{Step, StepResult, StepStatus};
pub use task::{Task, TaskStatus};
