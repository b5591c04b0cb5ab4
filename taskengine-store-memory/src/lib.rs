#![deny(missing_docs)]
//! # taskengine-store-memory — reference store and queue (2.1)
//!
//! The durable task store and the job queue both sit outside this
//! engine's scope as standalone infrastructure; this crate provides
//! in-process, in-memory reference implementations of both so the rest
//! of the workspace can be built and tested without a real database or
//! broker. Swapping in a production backend means implementing
//! [`TaskStore`] and [`JobQueue`] against it; nothing upstream depends
//! on this crate's in-memory internals.

pub mod error;
pub mod memory;
pub mod queue;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryTaskStore;
pub use queue::{JobQueue, MemoryJobQueue};
pub use store::TaskStore;
