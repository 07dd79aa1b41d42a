//! Operation planning for converge and prune
//!
//! Planning is pure: it compares two schema sets that already live in the
//! same namespace and returns the ordered requests that would bring the
//! remote in line, plus warnings for destructive steps that were skipped.
//!
//! # Ordering
//!
//! 1. Local classes in local order: create, or delete-update then
//!    create-update for a changed class
//! 2. Remote-only classes: delete (or warn when class deletion is disabled)
//!
//! A field whose definition changed is dropped in the first update and
//! recreated in the second, never the other way around.

use crate::error::SyncError;
use parsesync_core::equality::permissions_equal;
use parsesync_core::{
    ClassSchema, ClassUpdate, Diagnostic, FieldSchema, RequestKind, RunReport, SchemaSet, SyncOptions,
};
use std::collections::{BTreeMap, HashSet};

/// One schema-mutation request
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaOperation {
    CreateClass(ClassSchema),
    UpdateClass(ClassUpdate),
    DeleteClass(String),
}

impl SchemaOperation {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::CreateClass(_) => RequestKind::Create,
            Self::UpdateClass(_) => RequestKind::Update,
            Self::DeleteClass(_) => RequestKind::Delete,
        }
    }

    pub fn class_name(&self) -> &str {
        match self {
            Self::CreateClass(class) => &class.class_name,
            Self::UpdateClass(update) => &update.class_name,
            Self::DeleteClass(name) => name,
        }
    }
}

/// Ordered requests plus the warnings produced while planning them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaPlan {
    pub operations: Vec<SchemaOperation>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SchemaPlan {
    /// Whether the plan issues no request
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Build a run report for this plan
    pub fn to_report(&self, command: &str, dry_run: bool) -> RunReport {
        self.report_applied(RunReport::new(command).with_dry_run(dry_run), self.operations.len())
    }

    /// Build a run report for a run of this plan that stopped at `error`
    ///
    /// Only the requests that were applied before the failure are listed.
    pub fn to_failed_report(&self, command: &str, error: &SyncError) -> RunReport {
        let applied = match error {
            SyncError::Request { applied, .. } => *applied,
            _ => 0,
        };
        self.report_applied(RunReport::new(command).with_error(error.to_string()), applied)
    }

    fn report_applied(&self, mut report: RunReport, applied: usize) -> RunReport {
        for operation in self.operations.iter().take(applied) {
            report.add_request(operation.kind(), operation.class_name());
        }
        for diagnostic in &self.diagnostics {
            report.add_diagnostic(diagnostic.clone());
        }
        report
    }
}

/// Plan the requests that make `remote` match `local`
pub fn plan_converge(local: &SchemaSet, remote: &SchemaSet, options: &SyncOptions) -> SchemaPlan {
    let mut plan = SchemaPlan::default();

    for local_class in local {
        match remote.find(&local_class.class_name) {
            Some(remote_class) if local_class == remote_class => {}
            Some(remote_class) => plan_class_update(local_class, remote_class, options, &mut plan),
            None => plan
                .operations
                .push(SchemaOperation::CreateClass(local_class.clone())),
        }
    }

    for remote_class in remote {
        if local.contains(&remote_class.class_name) {
            continue;
        }
        if options.delete_classes {
            plan.operations
                .push(SchemaOperation::DeleteClass(remote_class.class_name.clone()));
        } else {
            plan.diagnostics
                .push(Diagnostic::skipped_class_deletion(&remote_class.class_name));
        }
    }

    plan
}

fn plan_class_update(
    local: &ClassSchema,
    remote: &ClassSchema,
    options: &SyncOptions,
    plan: &mut SchemaPlan,
) {
    let class_name = local.class_name.as_str();
    let mut to_delete: Vec<&str> = Vec::new();
    let mut to_create: BTreeMap<&str, &FieldSchema> = BTreeMap::new();
    let mut recreated: HashSet<&str> = HashSet::new();

    for (name, field) in &local.fields {
        match remote.fields.get(name) {
            Some(remote_field) if remote_field == field => {}
            Some(_) => {
                to_delete.push(name);
                to_create.insert(name, field);
                recreated.insert(name);
            }
            None => {
                to_create.insert(name, field);
            }
        }
    }
    for name in remote.fields.keys() {
        if !local.fields.contains_key(name) {
            to_delete.push(name);
        }
    }

    // Nothing to apply when the local side declares no permissions.
    let permissions_differ =
        local.class_level_permissions.is_some() && !permissions_equal(local, remote);
    let permissions = local.class_level_permissions.clone();

    if !to_delete.is_empty() || permissions_differ {
        if options.delete_fields {
            let update = to_delete
                .iter()
                .fold(ClassUpdate::new(class_name), |update, name| update.delete_field(*name))
                .with_permissions(permissions.clone());
            plan.operations.push(SchemaOperation::UpdateClass(update));
        } else {
            for name in &to_delete {
                if recreated.contains(name) {
                    to_create.remove(name);
                    plan.diagnostics
                        .push(Diagnostic::skipped_field_recreate(class_name, name));
                } else {
                    plan.diagnostics
                        .push(Diagnostic::skipped_field_deletion(class_name, name));
                }
            }
        }
    }

    if !to_create.is_empty() || permissions_differ {
        let update = to_create
            .into_iter()
            .fold(ClassUpdate::new(class_name), |update, (name, field)| {
                update.put_field(name, field.clone())
            })
            .with_permissions(permissions);
        plan.operations.push(SchemaOperation::UpdateClass(update));
    }
}

/// Plan deletion of every local class that exists remotely
///
/// Only names are compared; field contents are never read.
pub fn plan_prune(local: &SchemaSet, remote: &SchemaSet) -> SchemaPlan {
    let operations = local
        .iter()
        .filter(|class| remote.contains(&class.class_name))
        .map(|class| SchemaOperation::DeleteClass(class.class_name.clone()))
        .collect();

    SchemaPlan {
        operations,
        diagnostics: Vec::new(),
    }
}
