//! Uniform result shapes for the shell/file/browser façade calls.
//!
//! Every façade call funnels network errors, JSON parse errors, and HTTP
//! non-2xx responses into `success: false` with an `error` string rather
//! than raising — only sandbox *lookup* failures (`SandboxError::NotFound`)
//! propagate as `Err`. The Executor is the sole retry authority; these
//! calls never retry.

use serde::{Deserialize, Serialize};
use taskengine_types::DurationMs;

/// Options for an `executeShell` façade call.
#[derive(Debug, Clone)]
pub struct ShellOptions {
    /// Per-call timeout. The transport timeout is set slightly larger.
    pub timeout: DurationMs,
    /// Working directory, if not the sandbox default.
    pub cwd: Option<String>,
}

/// Result of one `/execute` call to the in-sandbox shell service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellCallResult {
    /// Whether the command ran and exited zero.
    pub success: bool,
    /// Process exit code, when the command ran at all.
    #[serde(default)]
    pub exit_code: Option<i32>,
    /// Captured standard output.
    #[serde(default)]
    pub stdout: String,
    /// Captured standard error.
    #[serde(default)]
    pub stderr: String,
    /// Set on transport failure, policy rejection, or non-zero exit.
    #[serde(default)]
    pub error: Option<String>,
}

/// Result of a `/read` call to the in-sandbox file service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReadCallResult {
    /// Whether the read succeeded.
    pub success: bool,
    /// File content, when `success`.
    #[serde(default)]
    pub content: String,
    /// Size in bytes of the returned content.
    #[serde(default)]
    pub size: u64,
    /// The resolved path that was read.
    #[serde(default)]
    pub path: String,
    /// Set on policy rejection or transport/IO failure.
    #[serde(default)]
    pub error: Option<String>,
}

/// Result of a `/write` call to the in-sandbox file service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileWriteCallResult {
    /// Whether the write succeeded.
    pub success: bool,
    /// The resolved path that was written.
    #[serde(default)]
    pub path: String,
    /// Number of bytes written.
    #[serde(default)]
    pub size: u64,
    /// Set on policy rejection or transport/IO failure.
    #[serde(default)]
    pub error: Option<String>,
}

/// One entry in a `/list` directory listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    /// Entry name (not the full path).
    pub name: String,
    /// Whether this entry is a file or a directory.
    #[serde(rename = "type")]
    pub kind: FileEntryKind,
    /// Size in bytes (0 for directories).
    #[serde(default)]
    pub size: u64,
    /// Last-modified time, milliseconds since the Unix epoch.
    #[serde(default)]
    pub modified_ms: u64,
}

/// Whether a directory entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileEntryKind {
    /// A regular file.
    File,
    /// A directory.
    Directory,
}

/// Result of a `/list` call to the in-sandbox file service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileListCallResult {
    /// Whether the listing succeeded.
    pub success: bool,
    /// The resolved path that was listed.
    #[serde(default)]
    pub path: String,
    /// Directory entries.
    #[serde(default)]
    pub files: Vec<FileEntry>,
    /// Set on policy rejection or transport/IO failure.
    #[serde(default)]
    pub error: Option<String>,
}

/// A browser action to perform inside the sandbox.
#[derive(Debug, Clone)]
pub enum BrowserAction {
    /// Navigate to a URL and confirm.
    Open {
        /// Target URL.
        url: String,
        /// Per-call timeout. The transport timeout is set slightly larger.
        timeout: DurationMs,
    },
    /// Navigate and extract the page title and visible text.
    Read {
        /// Target URL.
        url: String,
        /// Per-call timeout. The transport timeout is set slightly larger.
        timeout: DurationMs,
    },
    /// Navigate and capture a screenshot.
    Screenshot {
        /// Target URL.
        url: String,
        /// Per-call timeout. The transport timeout is set slightly larger.
        timeout: DurationMs,
    },
    /// Navigate and extract a table matching `selector`.
    ExtractTable {
        /// Target URL.
        url: String,
        /// CSS selector identifying the table.
        selector: String,
        /// Per-call timeout. The transport timeout is set slightly larger.
        timeout: DurationMs,
    },
    /// Navigate and click an element.
    Click {
        /// Target URL.
        url: String,
        /// CSS selector identifying the element.
        selector: String,
        /// Per-call timeout. The transport timeout is set slightly larger.
        timeout: DurationMs,
    },
    /// Navigate and fill a form per free-form instructions.
    FillForm {
        /// Target URL.
        url: String,
        /// Free-form instructions for which fields to fill.
        instructions: String,
        /// Per-call timeout. The transport timeout is set slightly larger.
        timeout: DurationMs,
    },
}

impl BrowserAction {
    /// The action's URL, present on every variant.
    pub fn url(&self) -> &str {
        match self {
            BrowserAction::Open { url, .. }
            | BrowserAction::Read { url, .. }
            | BrowserAction::Screenshot { url, .. }
            | BrowserAction::ExtractTable { url, .. }
            | BrowserAction::Click { url, .. }
            | BrowserAction::FillForm { url, .. } => url,
        }
    }

    /// The action's wire tag, matching the in-sandbox service's `action` field.
    pub fn tag(&self) -> &'static str {
        match self {
            BrowserAction::Open { .. } => "open",
            BrowserAction::Read { .. } => "read",
            BrowserAction::Screenshot { .. } => "screenshot",
            BrowserAction::ExtractTable { .. } => "extract_table",
            BrowserAction::Click { .. } => "click",
            BrowserAction::FillForm { .. } => "fill_form",
        }
    }

    /// The action's requested timeout, present on every variant. The
    /// transport timeout a caller applies around this call should be set
    /// slightly larger, mirroring `ShellOptions::timeout`.
    pub fn timeout(&self) -> DurationMs {
        match self {
            BrowserAction::Open { timeout, .. }
            | BrowserAction::Read { timeout, .. }
            | BrowserAction::Screenshot { timeout, .. }
            | BrowserAction::ExtractTable { timeout, .. }
            | BrowserAction::Click { timeout, .. }
            | BrowserAction::FillForm { timeout, .. } => *timeout,
        }
    }
}

/// Result of an `/execute` call to the in-sandbox browser service. Shape
/// depends on the action: title+text for `read`, a base64 PNG for
/// `screenshot`, a row matrix for `extract_table`, a bare URL confirmation
/// for the rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowserCallResult {
    /// Whether the action succeeded.
    pub success: bool,
    /// Final URL after navigation.
    #[serde(default)]
    pub url: Option<String>,
    /// Page title, for `read`.
    #[serde(default)]
    pub title: Option<String>,
    /// Extracted visible text, for `read`.
    #[serde(default)]
    pub text: Option<String>,
    /// Base64-encoded PNG, for `screenshot`.
    #[serde(default)]
    pub screenshot_base64: Option<String>,
    /// Extracted table rows, for `extract_table`.
    #[serde(default)]
    pub table: Option<Vec<Vec<String>>>,
    /// Set on navigation timeout, missing selector, or transport failure.
    #[serde(default)]
    pub error: Option<String>,
}
