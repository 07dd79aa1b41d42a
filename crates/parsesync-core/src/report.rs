//! Run report schema (stable v1)
//!
//! Written by `parsesync up --report`. Breaking changes require a new version.

use crate::diagnostic::Diagnostic;
use serde::{Deserialize, Serialize};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    pub major: u32,
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Kind of schema-mutation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// One request issued (or planned, in a dry run)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub kind: RequestKind,
    pub class_name: String,
}

/// Summary statistics for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
    pub warnings: usize,
}

impl RunSummary {
    /// Total number of requests
    pub fn requests(&self) -> usize {
        self.creates + self.updates + self.deletes
    }
}

/// Report of a single reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Command that produced the report (`up`, `del`)
    pub command: String,

    /// Whether requests were only planned
    pub dry_run: bool,

    pub summary: RunSummary,

    /// Requests in issue order
    pub requests: Vec<RequestRecord>,

    pub diagnostics: Vec<Diagnostic>,

    /// Error that stopped the run; `requests` then lists only those applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    /// Create an empty report
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            command: command.into(),
            dry_run: false,
            summary: RunSummary::default(),
            requests: Vec::new(),
            diagnostics: Vec::new(),
            error: None,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Record a request
    pub fn add_request(&mut self, kind: RequestKind, class_name: impl Into<String>) {
        match kind {
            RequestKind::Create => self.summary.creates += 1,
            RequestKind::Update => self.summary.updates += 1,
            RequestKind::Delete => self.summary.deletes += 1,
        }
        self.requests.push(RequestRecord {
            kind,
            class_name: class_name.into(),
        });
    }

    /// Record a diagnostic
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.summary.warnings += 1;
        self.diagnostics.push(diagnostic);
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}
