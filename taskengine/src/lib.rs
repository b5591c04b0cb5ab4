#![deny(missing_docs)]
//! # taskengine — umbrella crate
//!
//! Single import surface for composing an autonomous task execution engine:
//! a planner turns a goal into a step plan, the executor runs each step's
//! tool against an isolated sandbox, and an optional critic inspects failed
//! steps and proposes a correction before the plan continues. Re-exports the
//! sub-crates behind feature flags, plus a `prelude` for the happy path.

#[cfg(feature = "core")]
pub use taskengine_critic;
#[cfg(feature = "core")]
pub use taskengine_executor;
#[cfg(feature = "core")]
pub use taskengine_llm;
#[cfg(feature = "core")]
pub use taskengine_orchestrator;
#[cfg(feature = "core")]
pub use taskengine_planner;
#[cfg(feature = "core")]
pub use taskengine_registry;
#[cfg(any(feature = "sandbox-docker", feature = "sandbox-ref"))]
pub use taskengine_sandbox;
#[cfg(feature = "sandbox-ref")]
pub use taskengine_sandbox_ref;
#[cfg(feature = "store-memory")]
pub use taskengine_store_memory;
#[cfg(feature = "core")]
pub use taskengine_tools;
#[cfg(feature = "core")]
pub use taskengine_types;
#[cfg(feature = "worker")]
pub use taskengine_worker;

/// Happy-path imports for composing a task engine end to end.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use taskengine_types::{
        Artifact, ArtifactKind, EngineConfig, Event, EventKind, SandboxId, Step, StepId,
        StepResult, StepStatus, Task, TaskId, TaskStatus,
    };

    #[cfg(feature = "core")]
    pub use taskengine_registry::{ToolContext, ToolDefinition, ToolHandler, ToolRegistry};

    #[cfg(feature = "core")]
    pub use taskengine_tools::register_all;

    #[cfg(feature = "core")]
    pub use taskengine_llm::{LlmProvider, MockLlmProvider};

    #[cfg(feature = "core")]
    pub use taskengine_planner::Planner;

    #[cfg(feature = "core")]
    pub use taskengine_critic::Critic;

    #[cfg(feature = "core")]
    pub use taskengine_orchestrator::Orchestrator;

    #[cfg(any(feature = "sandbox-docker", feature = "sandbox-ref"))]
    pub use taskengine_sandbox::SandboxManager;

    #[cfg(feature = "sandbox-docker")]
    pub use taskengine_sandbox::docker::DockerSandboxManager;

    #[cfg(feature = "sandbox-ref")]
    pub use taskengine_sandbox_ref::ReferenceSandboxManager;

    #[cfg(feature = "store-memory")]
    pub use taskengine_store_memory::{JobQueue, MemoryJobQueue, MemoryTaskStore, TaskStore};

    #[cfg(feature = "worker")]
    pub use taskengine_worker::Worker;
}
