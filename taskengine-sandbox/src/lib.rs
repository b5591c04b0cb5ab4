#![deny(missing_docs)]
//! # taskengine-sandbox — sandbox lifecycle and façade contract (C2)
//!
//! Defines the [`SandboxManager`] trait that the Orchestrator depends on for
//! creating, tracking, and destroying the isolated execution environment
//! bound to one task, plus [`docker::DockerSandboxManager`], the production
//! binding to the Docker Engine API via `bollard`.
//!
//! A second crate, `taskengine-sandbox-ref`, implements the same trait
//! in-process for tests — the Orchestrator, Executor, and Tool Adapters
//! never need to know which backs them.

pub mod config;
pub mod docker;
pub mod facade;
pub mod health;
pub mod manager;

pub use config::SandboxCreateConfig;
pub use facade::{
    BrowserAction, BrowserCallResult, FileEntry, FileEntryKind, FileListCallResult,
    FileReadCallResult, FileWriteCallResult, ShellCallResult, ShellOptions,
};
pub use manager::SandboxManager;
