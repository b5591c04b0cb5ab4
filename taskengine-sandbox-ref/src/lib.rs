#![deny(missing_docs)]
//! # taskengine-sandbox-ref — in-process reference sandbox (C2 test double)
//!
//! Implements [`taskengine_sandbox::SandboxManager`] without Docker: each
//! sandbox gets a real [`tempfile::TempDir`] standing in for its `/work`
//! tmpfs, shell commands run for real via `tokio::process::Command` after
//! passing the command blocklist, and file calls enforce the same path
//! denylist and size ceiling the production in-sandbox services do. The
//! Orchestrator, Executor, and Tool Adapters depend only on the trait, so
//! this crate is a drop-in for integration tests and the scenarios in
//! the root `tests/` suite.

pub mod policy;
pub mod reference;

pub use policy::{CommandPolicy, PathPolicy};
pub use reference::ReferenceSandboxManager;
