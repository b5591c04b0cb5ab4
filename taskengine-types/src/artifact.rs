//! Durable outputs produced by successful step executions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of artifact produced by a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// A file written inside the sandbox.
    File,
    /// A URL discovered or visited (e.g. by the browser tool).
    Url,
    /// Inline free text.
    Text,
    /// Arbitrary structured data.
    Data,
}

/// A durable output attached to a task. Only ever produced by successful
/// step executions, never by failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// The artifact's kind.
    pub kind: ArtifactKind,
    /// Sandbox-relative path, for `File` artifacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// URL, for `Url` artifacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Inline content, for `Text`/`Data` artifacts (or a preview for `File`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Free-form extension metadata (size, mime type, etc).
    #[serde(default)]
    pub metadata: Value,
}

impl Artifact {
    /// Build a file artifact.
    pub fn file(path: impl Into<String>, size: u64) -> Self {
        Self {
            kind: ArtifactKind::File,
            path: Some(path.into()),
            url: None,
            content: None,
            metadata: serde_json::json!({ "size": size }),
        }
    }
}
