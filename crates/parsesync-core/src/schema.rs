//! Class schema model
//!
//! Mirrors the JSON shape the Parse Server `/schemas` endpoint speaks, so the
//! same types serve local schema files, remote listings and export output.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Field type of a class field
///
/// Type names outside the known set are kept verbatim in `Unknown` so that a
/// remote schema using a newer field kind still round-trips through export.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    Object,
    Array,
    GeoPoint,
    Polygon,
    File,
    Bytes,
    Pointer,
    Relation,
    /// Access control list (system field type)
    Acl,
    /// A type name this crate does not know about
    Unknown(String),
}

impl FieldType {
    /// Wire name of the type
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "String",
            Self::Number => "Number",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::Object => "Object",
            Self::Array => "Array",
            Self::GeoPoint => "GeoPoint",
            Self::Polygon => "Polygon",
            Self::File => "File",
            Self::Bytes => "Bytes",
            Self::Pointer => "Pointer",
            Self::Relation => "Relation",
            Self::Acl => "ACL",
            Self::Unknown(name) => name,
        }
    }

    /// Whether fields of this type reference another class
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Pointer | Self::Relation)
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "String" => Self::String,
            "Number" => Self::Number,
            "Boolean" => Self::Boolean,
            "Date" => Self::Date,
            "Object" => Self::Object,
            "Array" => Self::Array,
            "GeoPoint" => Self::GeoPoint,
            "Polygon" => Self::Polygon,
            "File" => Self::File,
            "Bytes" => Self::Bytes,
            "Pointer" => Self::Pointer,
            "Relation" => Self::Relation,
            "ACL" => Self::Acl,
            _ => Self::Unknown(name),
        }
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Unknown(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single field of a class
///
/// Equality is deep over every attribute, see [`crate::equality`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    /// Field type
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Referenced class for Pointer and Relation fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_class: Option<String>,

    /// Required flag; absent and `false` are distinct values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    /// Any other declared attribute (defaultValue, ...)
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl FieldSchema {
    /// Create a field of the given type with no other attributes
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            target_class: None,
            required: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Create a Pointer field
    pub fn pointer(target_class: impl Into<String>) -> Self {
        Self::new(FieldType::Pointer).with_target(target_class)
    }

    /// Create a Relation field
    pub fn relation(target_class: impl Into<String>) -> Self {
        Self::new(FieldType::Relation).with_target(target_class)
    }

    /// Set the target class
    pub fn with_target(mut self, target_class: impl Into<String>) -> Self {
        self.target_class = Some(target_class.into());
        self
    }

    /// Set the required flag
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Set an extra attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Whether the field is marked required
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }
}

/// A data class: a name, its fields and its class-level permissions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSchema {
    /// Class name, unique within a schema set
    #[serde(rename = "className")]
    pub class_name: String,

    /// Fields by name
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSchema>,

    /// Opaque access rules, compared but never interpreted
    #[serde(
        rename = "classLevelPermissions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub class_level_permissions: Option<Value>,

    /// Other class attributes reported by the service (indexes, ...)
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl ClassSchema {
    /// Create an empty class
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            fields: BTreeMap::new(),
            class_level_permissions: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Add a field
    pub fn with_field(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Set class-level permissions
    pub fn with_permissions(mut self, permissions: Value) -> Self {
        self.class_level_permissions = Some(permissions);
        self
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }
}

/// An ordered sequence of classes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaSet {
    classes: Vec<ClassSchema>,
}

impl SchemaSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set from classes, keeping their order
    pub fn from_classes(classes: Vec<ClassSchema>) -> Self {
        Self { classes }
    }

    /// Find a class by name
    pub fn find(&self, class_name: &str) -> Option<&ClassSchema> {
        self.classes.iter().find(|c| c.class_name == class_name)
    }

    /// Whether a class with this name is present
    pub fn contains(&self, class_name: &str) -> bool {
        self.find(class_name).is_some()
    }

    /// Class names in order
    pub fn class_names(&self) -> Vec<&str> {
        self.classes.iter().map(|c| c.class_name.as_str()).collect()
    }

    /// Append a class
    pub fn push(&mut self, class: ClassSchema) {
        self.classes.push(class);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClassSchema> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn into_classes(self) -> Vec<ClassSchema> {
        self.classes
    }
}

impl FromIterator<ClassSchema> for SchemaSet {
    fn from_iter<I: IntoIterator<Item = ClassSchema>>(iter: I) -> Self {
        Self::from_classes(iter.into_iter().collect())
    }
}

impl IntoIterator for SchemaSet {
    type Item = ClassSchema;
    type IntoIter = std::vec::IntoIter<ClassSchema>;

    fn into_iter(self) -> Self::IntoIter {
        self.classes.into_iter()
    }
}

impl<'a> IntoIterator for &'a SchemaSet {
    type Item = &'a ClassSchema;
    type IntoIter = std::slice::Iter<'a, ClassSchema>;

    fn into_iter(self) -> Self::IntoIter {
        self.classes.iter()
    }
}

/// Change to one field inside an update request
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    /// Drop the field (`{"__op": "Delete"}` on the wire)
    Delete,

    /// Create the field with this definition
    Put(FieldSchema),
}

impl Serialize for FieldChange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Delete => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("__op", "Delete")?;
                map.end()
            }
            Self::Put(field) => field.serialize(serializer),
        }
    }
}

/// Partial class schema sent with an update request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassUpdate {
    #[serde(rename = "className")]
    pub class_name: String,

    pub fields: BTreeMap<String, FieldChange>,

    #[serde(
        rename = "classLevelPermissions",
        skip_serializing_if = "Option::is_none"
    )]
    pub class_level_permissions: Option<Value>,
}

impl ClassUpdate {
    /// Create an update that changes nothing yet
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            fields: BTreeMap::new(),
            class_level_permissions: None,
        }
    }

    /// Mark a field for deletion
    pub fn delete_field(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), FieldChange::Delete);
        self
    }

    /// Mark a field for creation
    pub fn put_field(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        self.fields.insert(name.into(), FieldChange::Put(field));
        self
    }

    /// Attach class-level permissions
    pub fn with_permissions(mut self, permissions: Option<Value>) -> Self {
        self.class_level_permissions = permissions;
        self
    }

    /// Names of fields this update deletes
    pub fn deleted_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, change)| matches!(change, FieldChange::Delete))
            .map(|(name, _)| name.as_str())
    }

    /// Fields this update creates
    pub fn put_fields(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.fields.iter().filter_map(|(name, change)| match change {
            FieldChange::Put(field) => Some((name.as_str(), field)),
            FieldChange::Delete => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_service_class_json() {
        let class: ClassSchema = serde_json::from_value(json!({
            "className": "Post",
            "fields": {
                "title": { "type": "String", "required": true },
                "author": { "type": "Pointer", "targetClass": "_User" },
                "views": { "type": "Number", "defaultValue": 0 }
            },
            "classLevelPermissions": { "find": { "*": true } },
            "indexes": { "_id_": { "_id": 1 } }
        }))
        .unwrap();

        assert_eq!(class.class_name, "Post");
        assert_eq!(class.fields["title"].required, Some(true));
        assert_eq!(class.fields["author"].target_class.as_deref(), Some("_User"));
        assert_eq!(class.fields["views"].attributes["defaultValue"], json!(0));
        assert!(class.attributes.contains_key("indexes"));
    }

    #[test]
    fn unknown_field_type_round_trips() {
        let field: FieldSchema = serde_json::from_value(json!({ "type": "Vector" })).unwrap();
        assert_eq!(field.field_type, FieldType::Unknown("Vector".to_string()));
        assert_eq!(serde_json::to_value(&field).unwrap(), json!({ "type": "Vector" }));
    }

    #[test]
    fn acl_type_uses_wire_name() {
        let field: FieldSchema = serde_json::from_value(json!({ "type": "ACL" })).unwrap();
        assert_eq!(field.field_type, FieldType::Acl);
        assert_eq!(FieldType::Acl.to_string(), "ACL");
    }

    #[test]
    fn absent_attributes_are_not_serialized() {
        let field = FieldSchema::new(FieldType::String);
        assert_eq!(serde_json::to_value(&field).unwrap(), json!({ "type": "String" }));
    }

    #[test]
    fn update_request_body() {
        let update = ClassUpdate::new("Post")
            .delete_field("legacy")
            .put_field("title", FieldSchema::new(FieldType::String).with_required(true))
            .with_permissions(Some(json!({})));

        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({
                "className": "Post",
                "fields": {
                    "legacy": { "__op": "Delete" },
                    "title": { "type": "String", "required": true }
                },
                "classLevelPermissions": {}
            })
        );
        assert_eq!(update.deleted_fields().collect::<Vec<_>>(), vec!["legacy"]);
        assert_eq!(update.put_fields().count(), 1);
    }

    #[test]
    fn schema_set_lookup() {
        let set = SchemaSet::from_classes(vec![ClassSchema::new("Post"), ClassSchema::new("Comment")]);
        assert_eq!(set.class_names(), vec!["Post", "Comment"]);
        assert!(set.contains("Comment"));
        assert!(set.find("Draft").is_none());
    }
}
