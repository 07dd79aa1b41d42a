//! Deep structural equality for schema values
//!
//! No coercion between JSON kinds: `"1"` never equals `1` and `false` never
//! equals `0`. Numbers compare by value, so `1` equals `1.0`. An absent value
//! equals only another absent value.

use crate::schema::{ClassSchema, FieldSchema};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Compare two JSON values, recursing through objects and arrays
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, value)| y.get(key).is_some_and(|other| values_equal(value, other)))
        }
        _ => false,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    match (integer_value(x), integer_value(y)) {
        (Some(a), Some(b)) => a == b,
        (None, None) => x.as_f64() == y.as_f64(),
        _ => false,
    }
}

/// Exact integer value, including floats with no fractional part
fn integer_value(n: &Number) -> Option<i128> {
    if let Some(i) = n.as_i64() {
        return Some(i128::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(i128::from(u));
    }
    let f = n.as_f64()?;
    // Every f64 in this range is exactly representable as i128.
    (f.fract() == 0.0 && f.abs() < 1e37).then(|| f as i128)
}

/// Compare two optional values
pub fn optional_values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => values_equal(a, b),
        _ => false,
    }
}

fn attributes_equal(a: &BTreeMap<String, Value>, b: &BTreeMap<String, Value>) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| values_equal(value, other)))
}

/// Two fields are equal iff every attribute is deeply equal
pub fn fields_equal(a: &FieldSchema, b: &FieldSchema) -> bool {
    a.field_type == b.field_type
        && a.target_class == b.target_class
        && a.required == b.required
        && attributes_equal(&a.attributes, &b.attributes)
}

/// Whether the class-level-permission blocks of two classes match
pub fn permissions_equal(a: &ClassSchema, b: &ClassSchema) -> bool {
    optional_values_equal(a.class_level_permissions.as_ref(), b.class_level_permissions.as_ref())
}

/// Whole-class equality: name, fields, permissions and extra attributes
pub fn classes_equal(a: &ClassSchema, b: &ClassSchema) -> bool {
    a.class_name == b.class_name
        && a.fields.len() == b.fields.len()
        && a.fields.iter().all(|(name, field)| {
            b.fields.get(name).is_some_and(|other| fields_equal(field, other))
        })
        && permissions_equal(a, b)
        && attributes_equal(&a.attributes, &b.attributes)
}

impl PartialEq for FieldSchema {
    fn eq(&self, other: &Self) -> bool {
        fields_equal(self, other)
    }
}

impl PartialEq for ClassSchema {
    fn eq(&self, other: &Self) -> bool {
        classes_equal(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;
    use serde_json::json;

    #[test]
    fn no_coercion_between_kinds() {
        assert!(!values_equal(&json!("1"), &json!(1)));
        assert!(!values_equal(&json!(false), &json!(0)));
        assert!(!values_equal(&json!(null), &json!({})));
        assert!(values_equal(&json!(1), &json!(1.0)));
    }

    #[test]
    fn large_integers_compare_exactly() {
        assert!(!values_equal(&json!(9007199254740993i64), &json!(9007199254740992.0)));
        assert!(values_equal(&json!(9007199254740992i64), &json!(9007199254740992.0)));
        assert!(values_equal(&json!(u64::MAX), &json!(u64::MAX)));
        assert!(!values_equal(&json!(2), &json!(2.5)));
        assert!(values_equal(&json!(2.5), &json!(2.5)));
    }

    #[test]
    fn objects_ignore_key_order_arrays_do_not() {
        assert!(values_equal(&json!({"a": 1, "b": [1, 2]}), &json!({"b": [1, 2], "a": 1})));
        assert!(!values_equal(&json!([1, 2]), &json!([2, 1])));
        assert!(!values_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }

    #[test]
    fn absent_is_not_present_empty() {
        assert!(optional_values_equal(None, None));
        assert!(!optional_values_equal(None, Some(&json!({}))));
        assert!(optional_values_equal(Some(&json!({})), Some(&json!({}))));
    }

    #[test]
    fn required_false_differs_from_absent() {
        let plain = FieldSchema::new(FieldType::String);
        let explicit = FieldSchema::new(FieldType::String).with_required(false);
        assert_ne!(plain, explicit);
        assert_eq!(explicit, FieldSchema::new(FieldType::String).with_required(false));
    }

    #[test]
    fn field_attributes_take_part_in_equality() {
        let a = FieldSchema::new(FieldType::Number).with_attribute("defaultValue", json!(0));
        let b = FieldSchema::new(FieldType::Number).with_attribute("defaultValue", json!(1));
        assert_ne!(a, b);
        assert_ne!(FieldSchema::pointer("_User"), FieldSchema::pointer("Team"));
    }

    #[test]
    fn class_equality() {
        let a = ClassSchema::new("Post")
            .with_field("title", FieldSchema::new(FieldType::String))
            .with_permissions(json!({ "find": { "*": true } }));
        let b = a.clone();
        assert_eq!(a, b);

        let without_permissions = ClassSchema::new("Post")
            .with_field("title", FieldSchema::new(FieldType::String));
        assert_ne!(a, without_permissions);
        assert!(!permissions_equal(&a, &without_permissions));

        let extra_field = b.with_field("body", FieldSchema::new(FieldType::String));
        assert_ne!(a, extra_field);
    }
}
