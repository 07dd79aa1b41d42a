//! Reconciliation runs against a live schema service
//!
//! A [`Reconciler`] fetches the remote schema, brings the local and remote
//! sets into the configured namespace, plans, and then issues the planned
//! requests one at a time. Each request is awaited before the next one
//! starts; the first failure aborts the run and earlier requests stand.

use crate::error::SyncError;
use crate::plan::{plan_converge, plan_prune, SchemaOperation, SchemaPlan};
use parsesync_catalog::SchemaService;
use parsesync_core::{Namespace, SchemaSet, SyncOptions};

/// Runs converge and prune against one service
pub struct Reconciler<'a> {
    service: &'a dyn SchemaService,
    options: SyncOptions,
    namespace: Namespace,
}

impl<'a> Reconciler<'a> {
    pub fn new(service: &'a dyn SchemaService, options: SyncOptions) -> Self {
        let namespace = Namespace::new(options.prefix.clone());
        Self {
            service,
            options,
            namespace,
        }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Fetch the remote set restricted to the namespace
    async fn scoped_remote(&self) -> Result<SchemaSet, SyncError> {
        let remote = self
            .service
            .fetch_schemas()
            .await
            .map_err(|source| SyncError::Fetch {
                service: self.service.name(),
                source,
            })?;
        let scoped = self.namespace.scope(&remote);
        tracing::debug!(
            fetched = remote.len(),
            in_namespace = scoped.len(),
            "fetched remote schema"
        );
        Ok(scoped)
    }

    /// Plan a converge run without issuing any mutation
    pub async fn plan_converge(&self, local: &SchemaSet) -> Result<SchemaPlan, SyncError> {
        let remote = self.scoped_remote().await?;
        let local = self.namespace.apply(local);
        let plan = plan_converge(&local, &remote, &self.options);
        tracing::debug!(
            operations = plan.operations.len(),
            warnings = plan.diagnostics.len(),
            "planned converge"
        );
        Ok(plan)
    }

    /// Make the remote schema match `local`
    ///
    /// Returns the applied plan. Running again right after issues nothing.
    pub async fn converge(&self, local: &SchemaSet) -> Result<SchemaPlan, SyncError> {
        let plan = self.plan_converge(local).await?;
        self.apply(&plan).await?;
        Ok(plan)
    }

    /// Plan a prune run without issuing any mutation
    pub async fn plan_prune(&self, local: &SchemaSet) -> Result<SchemaPlan, SyncError> {
        let remote = self.scoped_remote().await?;
        let local = self.namespace.apply(local);
        Ok(plan_prune(&local, &remote))
    }

    /// Delete every remote class named by `local`
    pub async fn prune(&self, local: &SchemaSet) -> Result<SchemaPlan, SyncError> {
        let plan = self.plan_prune(local).await?;
        self.apply(&plan).await?;
        Ok(plan)
    }

    /// Issue the planned requests in order
    pub async fn apply(&self, plan: &SchemaPlan) -> Result<(), SyncError> {
        for diagnostic in &plan.diagnostics {
            tracing::warn!(code = %diagnostic.code, "{}", diagnostic.message);
        }

        for (applied, operation) in plan.operations.iter().enumerate() {
            tracing::info!(
                kind = %operation.kind(),
                class = operation.class_name(),
                "sending schema request"
            );

            let result = match operation {
                SchemaOperation::CreateClass(class) => self.service.create_class(class).await,
                SchemaOperation::UpdateClass(update) => self.service.update_class(update).await,
                SchemaOperation::DeleteClass(name) => self.service.delete_class(name).await,
            };

            result.map_err(|source| SyncError::Request {
                kind: operation.kind(),
                class_name: operation.class_name().to_string(),
                applied,
                source,
            })?;
        }

        Ok(())
    }
}
