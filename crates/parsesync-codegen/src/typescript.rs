//! TypeScript definitions for the Parse JavaScript SDK
//!
//! Each class becomes an `<Name>Attributes` interface and a subclass of
//! `Parse.Object` (or the matching SDK class for system classes such as
//! `_User`). Built-in fields that every object carries are left out.

use minijinja::{context, Environment};
use parsesync_core::{ClassSchema, FieldSchema, FieldType, SchemaSet, PREFIX_PLACEHOLDER};
use serde::Serialize;

const TEMPLATE_NAME: &str = "types.ts";

const TEMPLATE: &str = r#"// Generated by parsesync. Do not edit by hand.

{% for class in classes %}
export interface {{ class.type_name }}Attributes {
{% for field in class.fields %}
  {{ field.name }}{% if not field.required %}?{% endif %}: {{ field.ts_type }};
{% endfor %}
}

{% if class.sdk_class %}
export class {{ class.type_name }} extends {{ class.sdk_class }}<{{ class.type_name }}Attributes> {
  constructor(attributes?: Partial<{{ class.type_name }}Attributes>) {
    super(attributes as {{ class.type_name }}Attributes);
  }
}
{% else %}
export class {{ class.type_name }} extends Parse.Object<{{ class.type_name }}Attributes> {
  constructor(attributes?: Partial<{{ class.type_name }}Attributes>) {
    super("{{ class.class_name }}", attributes as {{ class.type_name }}Attributes);
  }
}
{% endif %}

Parse.Object.registerSubclass("{{ class.class_name }}", {{ class.type_name }});
{% endfor %}
"#;

/// Fields every Parse object has; the SDK types them already
const BUILT_IN_FIELDS: &[&str] = &["objectId", "createdAt", "updatedAt", "ACL"];

/// Errors while generating definitions
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("Field '{class_name}.{field_name}' has unsupported type '{type_name}'")]
    UnsupportedFieldType {
        class_name: String,
        field_name: String,
        type_name: String,
    },

    #[error("{field_type} field '{class_name}.{field_name}' has no targetClass")]
    MissingTarget {
        class_name: String,
        field_name: String,
        field_type: FieldType,
    },

    #[error("Template render error: {0}")]
    Render(#[from] minijinja::Error),
}

#[derive(Debug, Serialize)]
struct ClassView {
    class_name: String,
    type_name: String,
    sdk_class: Option<&'static str>,
    fields: Vec<FieldView>,
}

#[derive(Debug, Serialize)]
struct FieldView {
    name: String,
    required: bool,
    ts_type: String,
}

/// SDK class backing a system class
fn sdk_class(class_name: &str) -> Option<&'static str> {
    match class_name {
        "_User" => Some("Parse.User"),
        "_Role" => Some("Parse.Role"),
        "_Session" => Some("Parse.Session"),
        "_Installation" => Some("Parse.Installation"),
        _ => None,
    }
}

/// TypeScript identifier for a class name or reference target
fn type_name(class_name: &str) -> String {
    let name = class_name.strip_prefix(PREFIX_PLACEHOLDER).unwrap_or(class_name);
    name.strip_prefix('_').unwrap_or(name).to_string()
}

fn target_type(set: &SchemaSet, target: &str) -> String {
    let resolved = target.strip_prefix(PREFIX_PLACEHOLDER).unwrap_or(target);
    if set.contains(resolved) {
        type_name(resolved)
    } else if let Some(sdk) = sdk_class(resolved) {
        sdk.to_string()
    } else {
        "Parse.Object".to_string()
    }
}

fn ts_type(
    set: &SchemaSet,
    class: &ClassSchema,
    field_name: &str,
    field: &FieldSchema,
) -> Result<String, CodegenError> {
    let target = || {
        field
            .target_class
            .as_deref()
            .ok_or_else(|| CodegenError::MissingTarget {
                class_name: class.class_name.clone(),
                field_name: field_name.to_string(),
                field_type: field.field_type.clone(),
            })
    };

    let ts = match &field.field_type {
        FieldType::String | FieldType::Bytes => "string".to_string(),
        FieldType::Number => "number".to_string(),
        FieldType::Boolean => "boolean".to_string(),
        FieldType::Date => "Date".to_string(),
        FieldType::Object => "Record<string, any>".to_string(),
        FieldType::Array => "any[]".to_string(),
        FieldType::GeoPoint => "Parse.GeoPoint".to_string(),
        FieldType::Polygon => "Parse.Polygon".to_string(),
        FieldType::File => "Parse.File".to_string(),
        FieldType::Acl => "Parse.ACL".to_string(),
        FieldType::Pointer => target_type(set, target()?),
        FieldType::Relation => format!(
            "Parse.Relation<{}, {}>",
            type_name(&class.class_name),
            target_type(set, target()?)
        ),
        FieldType::Unknown(type_name) => {
            return Err(CodegenError::UnsupportedFieldType {
                class_name: class.class_name.clone(),
                field_name: field_name.to_string(),
                type_name: type_name.clone(),
            })
        }
    };
    Ok(ts)
}

fn class_view(set: &SchemaSet, class: &ClassSchema) -> Result<ClassView, CodegenError> {
    let fields = class
        .fields
        .iter()
        .filter(|(name, _)| !BUILT_IN_FIELDS.contains(&name.as_str()))
        .map(|(name, field)| {
            Ok(FieldView {
                name: name.clone(),
                required: field.is_required(),
                ts_type: ts_type(set, class, name, field)?,
            })
        })
        .collect::<Result<Vec<_>, CodegenError>>()?;

    Ok(ClassView {
        class_name: class.class_name.clone(),
        type_name: type_name(&class.class_name),
        sdk_class: sdk_class(&class.class_name),
        fields,
    })
}

/// Render TypeScript definitions for every class in `set`
pub fn generate_typescript(set: &SchemaSet) -> Result<String, CodegenError> {
    let classes = set
        .iter()
        .map(|class| class_view(set, class))
        .collect::<Result<Vec<_>, _>>()?;

    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template(TEMPLATE_NAME, TEMPLATE)?;

    let rendered = env
        .get_template(TEMPLATE_NAME)?
        .render(context! { classes => classes })?;
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> SchemaSet {
        SchemaSet::from_classes(vec![
            ClassSchema::new("_User").with_field("nickname", FieldSchema::new(FieldType::String)),
            ClassSchema::new("Team")
                .with_field("objectId", FieldSchema::new(FieldType::String))
                .with_field("name", FieldSchema::new(FieldType::String).with_required(true))
                .with_field("owner", FieldSchema::pointer("_User"))
                .with_field("players", FieldSchema::relation("{{PREFIX}}Player"))
                .with_field("logo", FieldSchema::new(FieldType::File)),
            ClassSchema::new("Player").with_field("tags", FieldSchema::new(FieldType::Array)),
        ])
    }

    #[test]
    fn renders_interfaces_and_classes() {
        let ts = generate_typescript(&schema()).unwrap();

        assert!(ts.contains("export interface TeamAttributes {"));
        assert!(ts.contains("  name: string;"));
        assert!(ts.contains("  owner?: User;"));
        assert!(ts.contains("  players?: Parse.Relation<Team, Player>;"));
        assert!(ts.contains("  logo?: Parse.File;"));
        assert!(ts.contains("  tags?: any[];"));
        assert!(ts.contains("super(\"Team\", attributes as TeamAttributes);"));
        assert!(ts.contains("export class User extends Parse.User<UserAttributes>"));
        assert!(ts.contains("Parse.Object.registerSubclass(\"_User\", User);"));
    }

    #[test]
    fn omits_built_in_fields() {
        let ts = generate_typescript(&schema()).unwrap();
        assert!(!ts.contains("objectId"));
    }

    #[test]
    fn undeclared_targets_fall_back_to_sdk_types() {
        let set = SchemaSet::from_classes(vec![ClassSchema::new("Post")
            .with_field("author", FieldSchema::pointer("_User"))
            .with_field("topic", FieldSchema::pointer("Topic"))]);
        let ts = generate_typescript(&set).unwrap();

        assert!(ts.contains("author?: Parse.User;"));
        assert!(ts.contains("topic?: Parse.Object;"));
    }

    #[test]
    fn unknown_type_is_unsupported() {
        let set = SchemaSet::from_classes(vec![ClassSchema::new("Post")
            .with_field("embedding", FieldSchema::new(FieldType::Unknown("Vector".to_string())))]);

        match generate_typescript(&set) {
            Err(CodegenError::UnsupportedFieldType { type_name, .. }) => assert_eq!(type_name, "Vector"),
            other => panic!("expected UnsupportedFieldType, got {other:?}"),
        }
    }

    #[test]
    fn pointer_without_target_is_an_error() {
        let set = SchemaSet::from_classes(vec![
            ClassSchema::new("Post").with_field("author", FieldSchema::new(FieldType::Pointer)),
        ]);
        assert!(matches!(generate_typescript(&set), Err(CodegenError::MissingTarget { .. })));
    }
}
