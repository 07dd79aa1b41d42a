//! parsesync core
//!
//! Domain model for schema reconciliation: classes and fields, namespace
//! prefixing, deep equality, configuration and local schema files.

pub mod config;
pub mod diagnostic;
pub mod equality;
pub mod prefix;
pub mod report;
pub mod schema;
pub mod source;

pub use config::{CodegenSettings, Config, ConfigError, ConnectionConfig, ConnectionSettings, SyncOptions};
pub use diagnostic::{Diagnostic, DiagnosticCode};
pub use prefix::{Namespace, PREFIX_PLACEHOLDER};
pub use report::{ReportVersion, RequestKind, RequestRecord, RunReport, RunSummary};
pub use schema::{ClassSchema, ClassUpdate, FieldChange, FieldSchema, FieldType, SchemaSet};
pub use source::{load_local_schema, write_combined, write_per_class, SourceError};
