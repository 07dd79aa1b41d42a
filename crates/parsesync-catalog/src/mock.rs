//! Mock schema service for testing
//!
//! Holds classes in memory and applies create/update/delete the way the
//! real service does, so a second reconciliation run observes the result of
//! the first. Every mutation request is recorded in order.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let service = MockAdapter::with_classes(vec![ClassSchema::new("Post")]);
//! service.reject_class("Draft", ServiceError::RemoteRejected { .. }).await;
//!
//! reconciler.converge(&local).await?;
//! assert_eq!(service.requests().await.len(), 2);
//! ```

use crate::adapter::{SchemaService, ServiceError};
use parsesync_core::{ClassSchema, ClassUpdate, FieldChange, SchemaSet};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A mutation request received by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedRequest {
    Create(ClassSchema),
    Update(ClassUpdate),
    Delete(String),
}

impl RecordedRequest {
    /// Class the request targets
    pub fn class_name(&self) -> &str {
        match self {
            Self::Create(class) => &class.class_name,
            Self::Update(update) => &update.class_name,
            Self::Delete(name) => name,
        }
    }
}

/// In-memory schema service
#[derive(Clone, Default)]
pub struct MockAdapter {
    /// Classes in insertion order
    classes: Arc<RwLock<Vec<ClassSchema>>>,

    /// Mutation requests in the order received
    requests: Arc<RwLock<Vec<RecordedRequest>>>,

    /// Errors to return for requests touching specific classes
    rejections: Arc<RwLock<HashMap<String, ServiceError>>>,

    /// Simulate a service that cannot be reached
    unreachable: bool,
}

impl MockAdapter {
    /// Create an empty service
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a service pre-populated with classes
    pub fn with_classes(classes: Vec<ClassSchema>) -> Self {
        Self {
            classes: Arc::new(RwLock::new(classes)),
            ..Self::default()
        }
    }

    /// Fail every call with [`ServiceError::Unreachable`]
    pub fn with_unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Fail any mutation of `class_name` with `error`
    ///
    /// The failed request is still recorded.
    pub async fn reject_class(&self, class_name: impl Into<String>, error: ServiceError) {
        self.rejections.write().await.insert(class_name.into(), error);
    }

    /// Requests received so far
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    /// Forget recorded requests, keeping the stored classes
    pub async fn clear_requests(&self) {
        self.requests.write().await.clear();
    }

    /// Current stored classes
    pub async fn snapshot(&self) -> SchemaSet {
        SchemaSet::from_classes(self.classes.read().await.clone())
    }

    fn check_reachable(&self) -> Result<(), ServiceError> {
        if self.unreachable {
            Err(ServiceError::Unreachable("Simulated connection failure".to_string()))
        } else {
            Ok(())
        }
    }

    async fn record(&self, request: RecordedRequest) -> Result<(), ServiceError> {
        self.check_reachable()?;
        let class_name = request.class_name().to_string();
        self.requests.write().await.push(request);

        match self.rejections.read().await.get(&class_name) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn rejected(code: i64, message: String) -> ServiceError {
    ServiceError::RemoteRejected {
        status: 400,
        code: Some(code),
        message,
    }
}

#[async_trait::async_trait]
impl SchemaService for MockAdapter {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn fetch_schemas(&self) -> Result<SchemaSet, ServiceError> {
        self.check_reachable()?;
        Ok(self.snapshot().await)
    }

    async fn create_class(&self, class: &ClassSchema) -> Result<(), ServiceError> {
        self.record(RecordedRequest::Create(class.clone())).await?;

        let mut classes = self.classes.write().await;
        if classes.iter().any(|c| c.class_name == class.class_name) {
            return Err(rejected(103, format!("Class {} already exists.", class.class_name)));
        }
        classes.push(class.clone());
        Ok(())
    }

    async fn update_class(&self, update: &ClassUpdate) -> Result<(), ServiceError> {
        self.record(RecordedRequest::Update(update.clone())).await?;

        let mut classes = self.classes.write().await;
        let class = classes
            .iter_mut()
            .find(|c| c.class_name == update.class_name)
            .ok_or_else(|| rejected(103, format!("Class {} does not exist.", update.class_name)))?;

        for (name, change) in &update.fields {
            match change {
                FieldChange::Delete => {
                    if class.fields.remove(name).is_none() {
                        return Err(rejected(255, format!("Field {name} does not exist, cannot delete.")));
                    }
                }
                FieldChange::Put(field) => {
                    if class.fields.contains_key(name) {
                        return Err(rejected(255, format!("Field {name} exists, cannot update.")));
                    }
                    class.fields.insert(name.clone(), field.clone());
                }
            }
        }
        if let Some(permissions) = &update.class_level_permissions {
            class.class_level_permissions = Some(permissions.clone());
        }
        Ok(())
    }

    async fn delete_class(&self, class_name: &str) -> Result<(), ServiceError> {
        self.record(RecordedRequest::Delete(class_name.to_string())).await?;

        let mut classes = self.classes.write().await;
        let before = classes.len();
        classes.retain(|c| c.class_name != class_name);
        if classes.len() == before {
            return Err(rejected(103, format!("Class {class_name} does not exist.")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsesync_core::{FieldSchema, FieldType};

    #[tokio::test]
    async fn applies_updates_like_the_service() {
        let service = MockAdapter::with_classes(vec![
            ClassSchema::new("Post").with_field("legacy", FieldSchema::new(FieldType::String)),
        ]);

        service
            .update_class(&ClassUpdate::new("Post").delete_field("legacy"))
            .await
            .unwrap();
        service
            .update_class(&ClassUpdate::new("Post").put_field("title", FieldSchema::new(FieldType::String)))
            .await
            .unwrap();

        let post = service.snapshot().await.find("Post").cloned().unwrap();
        assert!(post.field("legacy").is_none());
        assert!(post.field("title").is_some());
        assert_eq!(service.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn putting_an_existing_field_is_rejected() {
        let service = MockAdapter::with_classes(vec![
            ClassSchema::new("Post").with_field("title", FieldSchema::new(FieldType::String)),
        ]);
        let result = service
            .update_class(&ClassUpdate::new("Post").put_field("title", FieldSchema::new(FieldType::Number)))
            .await;
        assert!(matches!(result, Err(ServiceError::RemoteRejected { code: Some(255), .. })));
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let service = MockAdapter::with_classes(vec![ClassSchema::new("Post")]);
        let result = service.create_class(&ClassSchema::new("Post")).await;
        assert!(matches!(result, Err(ServiceError::RemoteRejected { code: Some(103), .. })));
    }

    #[tokio::test]
    async fn unreachable_fails_everything() {
        let service = MockAdapter::new().with_unreachable();
        assert!(matches!(service.fetch_schemas().await, Err(ServiceError::Unreachable(_))));
        assert!(service.delete_class("Post").await.is_err());
        assert!(service.requests().await.is_empty());
    }
}
