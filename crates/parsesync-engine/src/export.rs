//! Export of the remote schema to local files

use crate::error::SyncError;
use parsesync_catalog::SchemaService;
use parsesync_core::{write_combined, write_per_class, Namespace, SchemaSet};
use std::path::PathBuf;

/// Output shape of an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportLayout {
    /// One JSON array at this path
    Combined(PathBuf),
    /// One `<className>.json` per class in this directory
    PerClass(PathBuf),
}

/// Fetch the remote schema with the namespace stripped
///
/// Classes outside the namespace are dropped and in-namespace targets become
/// placeholder tokens, so the result can be loaded under another prefix.
pub async fn fetch_portable(
    service: &dyn SchemaService,
    namespace: &Namespace,
) -> Result<SchemaSet, SyncError> {
    let remote = service
        .fetch_schemas()
        .await
        .map_err(|source| SyncError::Fetch {
            service: service.name(),
            source,
        })?;
    Ok(namespace.strip(&remote))
}

/// Export the remote schema and return the written file paths
pub async fn export(
    service: &dyn SchemaService,
    namespace: &Namespace,
    layout: &ExportLayout,
) -> Result<Vec<PathBuf>, SyncError> {
    let set = fetch_portable(service, namespace).await?;

    let written = match layout {
        ExportLayout::Combined(path) => {
            write_combined(&set, path).map_err(SyncError::Export)?;
            vec![path.clone()]
        }
        ExportLayout::PerClass(dir) => write_per_class(&set, dir).map_err(SyncError::Export)?,
    };

    tracing::info!(classes = set.len(), files = written.len(), "exported remote schema");
    Ok(written)
}
